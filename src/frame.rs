//! Frames: a decorated client window and its decoration sub-windows.
//!
//! A frame owns four windows (decoration, title bar, title text area and the
//! wrapped client), the drawing context used for the title, and the buttons
//! along the right edge of the title bar.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use x11rb::protocol::xproto::{Gcontext, Window};

use crate::state::{FrameState, SelfAck};
use crate::types::Rect;

new_key_type! {
    /// Stable key of a frame in the registry arena
    pub struct FrameId;
}

/// Content size given to a client that declares no usable size
pub const FALLBACK_SIZE: u32 = 100;

/// Horizontal offset of the title string inside the text area
pub const TITLE_TEXT_X: i32 = 10;

/// What clicking a title bar button does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonAction {
    Close,
    ToggleFullscreen,
    SplitLeft,
    SplitRight,
}

impl ButtonAction {
    /// Creation order, right to left
    pub const ORDER: [ButtonAction; 4] = [
        ButtonAction::Close,
        ButtonAction::ToggleFullscreen,
        ButtonAction::SplitRight,
        ButtonAction::SplitLeft,
    ];
}

/// Which half of the screen a split fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Button {
    pub window: Window,
    pub action: ButtonAction,
}

/// Buttons of one frame, index 0 being the rightmost
#[derive(Debug, Clone, Default)]
pub struct ButtonRegistry {
    buttons: Vec<Button>,
}

impl ButtonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a button; it lands left of all existing ones
    pub fn push(&mut self, window: Window, action: ButtonAction) -> usize {
        self.buttons.push(Button { window, action });
        self.buttons.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Button> {
        self.buttons.get(index)
    }

    pub fn position(&self, window: Window) -> Option<usize> {
        self.buttons.iter().position(|b| b.window == window)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Button> {
        self.buttons.iter()
    }
}

/// Decoration metrics.
///
/// All frame geometry derives from these five numbers and the screen size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chrome {
    pub border_width: u32,
    pub title_height: u32,
    pub button_size: u32,
    pub padding: u32,
    /// Height reserved for a panel at the top of the screen
    pub bar_height: u32,
}

impl Chrome {
    /// Client height inside a decoration of the given total height
    pub fn content_height(&self, total: u32) -> u32 {
        total.saturating_sub(self.title_height).max(1)
    }

    /// Where the client sits inside the decoration
    pub fn client_offset(&self) -> (i32, i32) {
        (0, (self.title_height + self.border_width) as i32)
    }

    /// Origin of button `index` (0 = rightmost) in a title bar `width` wide
    pub fn button_origin(&self, index: usize, width: u32) -> (i32, i32) {
        let step = (self.button_size + self.padding) as i32;
        let x = width as i32 - (index as i32 + 1) * step;
        let y = self.title_height as i32 - self.button_size as i32 - self.padding as i32;
        (x, y)
    }

    /// Title bar geometry; it overlaps the decoration border
    pub fn title_bar_rect(&self, width: u32) -> Rect {
        let b = self.border_width as i32;
        Rect::new(-b, -b, width, self.title_height)
    }

    /// Text area geometry, clear of the first button
    pub fn title_text_rect(&self, width: u32) -> Rect {
        let b = self.border_width as i32;
        let text_width = width
            .saturating_sub(2 * self.padding + self.button_size)
            .max(1);
        Rect::new(b, b, text_width, self.title_height + 2 * self.padding)
    }

    /// Geometry reported to the client in a synthetic configure notify
    pub fn synthetic_geometry(&self, width: u32, height: u32) -> Rect {
        let content = height
            .saturating_sub(self.title_height + 2 * self.border_width)
            .max(1);
        Rect::new(0, 0, width, content)
    }

    /// Decoration geometry when fullscreen
    pub fn fullscreen_rect(&self, screen_width: u32, screen_height: u32) -> Rect {
        let borders = 2 * self.border_width;
        Rect::new(
            0,
            self.bar_height as i32,
            screen_width.saturating_sub(borders),
            screen_height.saturating_sub(self.bar_height + borders),
        )
    }

    /// Decoration geometry for a half-screen split
    pub fn split_rect(&self, side: Side, screen_width: u32, screen_height: u32) -> Rect {
        let half = screen_width / 2;
        let x = match side {
            Side::Left => 0,
            Side::Right => half as i32,
        };
        Rect::new(
            x,
            self.bar_height as i32,
            half.saturating_sub(self.border_width),
            screen_height.saturating_sub(self.bar_height + self.border_width),
        )
    }
}

/// A managed client and its decoration.
#[derive(Debug, Clone)]
pub struct Frame {
    pub decoration: Window,
    pub title_bar: Window,
    pub title_text: Window,
    pub client: Window,
    /// Drawing context for the title text
    pub gc: Gcontext,
    /// Workspace tag, assigned once at creation
    pub workspace: usize,
    pub state: FrameState,
    pub ack: SelfAck,
    pub buttons: ButtonRegistry,
    /// Unmap notifications caused by our own reparenting, to be ignored
    pub pending_unmaps: u32,
}

impl Frame {
    pub fn new(
        decoration: Window,
        title_bar: Window,
        title_text: Window,
        client: Window,
        gc: Gcontext,
        workspace: usize,
    ) -> Self {
        Self {
            decoration,
            title_bar,
            title_text,
            client,
            gc,
            workspace,
            state: FrameState::Normal,
            ack: SelfAck::Idle,
            buttons: ButtonRegistry::new(),
            pending_unmaps: 0,
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.state.is_fullscreen()
    }
}
