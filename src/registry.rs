//! The frame registry: every live frame, indexed by the windows it owns.
//!
//! Frames live in a slotmap arena. A side index maps each component window
//! (decoration, title bar, client, buttons) to its frame and role so a
//! notification can be resolved in one lookup.

use std::collections::HashMap;

use slotmap::SlotMap;
use x11rb::protocol::xproto::Window;

use crate::frame::{Frame, FrameId};

/// Part a window plays in its frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Decoration,
    TitleBar,
    Client,
    /// Index into the frame's button registry
    Button(usize),
    /// Text area inside the title bar; only ever sees Expose
    TitleText,
}

#[derive(Debug, Default)]
pub struct FrameRegistry {
    frames: SlotMap<FrameId, Frame>,
    index: HashMap<Window, (FrameId, Role)>,
}

impl FrameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a frame. A frame for an already-managed client is refused and
    /// the existing frame's id handed back.
    pub fn add(&mut self, frame: Frame) -> FrameId {
        if let Some(existing) = self.find_by_client(frame.client) {
            log::warn!(
                "Client 0x{:x} already has a frame, keeping the existing one",
                frame.client
            );
            return existing;
        }

        let components = Self::components(&frame);
        let id = self.frames.insert(frame);
        for (window, role) in components {
            let previous = self.index.insert(window, (id, role));
            debug_assert!(previous.is_none(), "window 0x{:x} indexed twice", window);
        }
        id
    }

    /// Splice a frame out, returning it so the caller can release what it owns.
    /// Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: FrameId) -> Option<Frame> {
        let frame = self.frames.remove(id)?;
        for (window, _) in Self::components(&frame) {
            self.index.remove(&window);
        }
        Some(frame)
    }

    /// Resolve a window to its frame and role
    pub fn lookup(&self, window: Window) -> Option<(FrameId, Role)> {
        self.index.get(&window).copied()
    }

    /// Resolve a decoration, title bar, client or button window to its frame
    pub fn find_by_component(&self, window: Window) -> Option<FrameId> {
        match self.lookup(window)? {
            (_, Role::TitleText) => None,
            (id, _) => Some(id),
        }
    }

    /// Frame wrapping `client`, if it is managed
    pub fn find_by_client(&self, client: Window) -> Option<FrameId> {
        match self.lookup(client) {
            Some((id, Role::Client)) => Some(id),
            _ => None,
        }
    }

    pub fn get(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id)
    }

    pub fn get_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.frames.get_mut(id)
    }

    pub fn contains(&self, id: FrameId) -> bool {
        self.frames.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FrameId, &Frame)> {
        self.frames.iter()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Every window a frame owns, with the role it plays
    fn components(frame: &Frame) -> Vec<(Window, Role)> {
        let mut components = vec![
            (frame.decoration, Role::Decoration),
            (frame.title_bar, Role::TitleBar),
            (frame.title_text, Role::TitleText),
            (frame.client, Role::Client),
        ];
        components.extend(
            frame
                .buttons
                .iter()
                .enumerate()
                .map(|(i, b)| (b.window, Role::Button(i))),
        );
        components
    }
}
