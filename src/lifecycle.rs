//! Frame lifecycle: building decorations around clients, geometry changes,
//! fullscreen and split placement, and teardown.

use anyhow::{anyhow, Result};
use x11rb::protocol::xproto::{Gcontext, Window};

use crate::display::{ConfigureChanges, DisplayServer, SurfaceRole, SurfaceSpec, WindowAttributes};
use crate::frame::{ButtonAction, Frame, FrameId, Side, FALLBACK_SIZE};
use crate::state::{StateTransition, UnmanageReason};
use crate::types::Rect;
use crate::wm::Wm;

impl<D: DisplayServer> Wm<D> {
    /// Decide what to do with a top-level window that wants to be shown.
    ///
    /// Map requests pass `adopting = false` and only consider windows that
    /// are not yet viewable; startup adoption passes `true` and only
    /// considers windows that already are.
    pub fn manage_window(&mut self, window: Window, adopting: bool) -> Result<Option<FrameId>> {
        if let Some(id) = self.frames.find_by_client(window) {
            return Ok(Some(id));
        }

        let attrs = match self.display.attributes(window) {
            Some(attrs) => attrs,
            None => {
                log::debug!("Window 0x{:x} vanished before it could be managed", window);
                return Ok(None);
            }
        };

        if attrs.override_redirect {
            return Ok(None);
        }
        match (adopting, attrs.viewable) {
            (false, true) | (true, false) => return Ok(None),
            _ => {}
        }

        let root = self.display.root();
        if self.display.parent(window).map_or(false, |parent| parent != root) {
            self.map_undecorated(window, &attrs)?;
            return Ok(None);
        }

        let window_type = self.display.window_type(window);
        if !window_type.is_decorated() {
            log::debug!("Mapping 0x{:x} ({:?}) without decoration", window, window_type);
            self.map_undecorated(window, &attrs)?;
            return Ok(None);
        }

        let id = self.create_frame(window)?;
        if self.display.wants_fullscreen(window) {
            self.set_fullscreen(id, true)?;
        }
        Ok(Some(id))
    }

    /// Frame every window that was already on screen when we started
    pub fn adopt_windows(&mut self, windows: &[Window]) {
        for &window in windows {
            match self.manage_window(window, true) {
                Ok(Some(_)) => log::info!("Adopted existing window 0x{:x}", window),
                Ok(None) => {}
                Err(e) => log::warn!("Failed to adopt window 0x{:x}: {}", window, e),
            }
        }
    }

    /// Show a window as-is, giving it a 1x1 size if it has none
    fn map_undecorated(&mut self, window: Window, attrs: &WindowAttributes) -> Result<()> {
        let hinted = self.display.size_hint(window).map_or(false, |(w, _)| w != 0);
        let sized = attrs.geometry.width != 0 && attrs.geometry.height != 0;
        if !hinted && !sized {
            self.display.resize(window, 1, 1)?;
        }
        self.display.watch_undecorated(window)?;
        self.display.map(window)?;
        Ok(())
    }

    /// Wrap `client` in a new frame on the active workspace.
    ///
    /// Creating a frame for an already-managed client returns the existing one.
    pub fn create_frame(&mut self, client: Window) -> Result<FrameId> {
        if let Some(id) = self.frames.find_by_client(client) {
            log::debug!("Client 0x{:x} is already framed", client);
            return Ok(id);
        }

        let chrome = self.config.chrome();
        let attrs = self
            .display
            .attributes(client)
            .ok_or_else(|| anyhow!("client 0x{:x} is gone", client))?;

        let (width, content_height) = match self.display.size_hint(client) {
            Some((w, h)) if w != 0 => (w, h),
            _ if attrs.geometry.width != 0 && attrs.geometry.height != 0 => {
                (attrs.geometry.width, attrs.geometry.height)
            }
            _ => {
                let forced = (FALLBACK_SIZE, FALLBACK_SIZE - chrome.title_height);
                self.display.resize(client, forced.0, forced.1)?;
                forced
            }
        };
        let height = content_height + chrome.title_height;

        let decoration = self.display.create_surface(&SurfaceSpec {
            role: SurfaceRole::Decoration,
            parent: self.display.root(),
            geometry: Rect::new(attrs.geometry.x, attrs.geometry.y, width, height),
            border_width: chrome.border_width,
            border_color: self.config.border_color,
            background: self.config.background_color,
        })?;

        let mut frame = match self.build_decoration(decoration, client, width) {
            Ok(frame) => frame,
            Err(e) => {
                self.abandon_decoration(decoration, None);
                return Err(e);
            }
        };

        let attached = self
            .display
            .watch_client(client)
            .and_then(|()| self.display.reparent(client, decoration, 0, 0));
        if let Err(e) = attached {
            self.abandon_decoration(decoration, Some(frame.gc));
            return Err(e);
        }
        self.display.map(decoration)?;
        self.display.map(client)?;
        let (x, y) = chrome.client_offset();
        self.display.move_to(client, x, y)?;

        // Reparenting a mapped window unmaps it once
        if attrs.viewable {
            frame.pending_unmaps = 1;
        }

        let title = self.display.title(client);
        self.display.draw_title(frame.title_text, frame.gc, &title)?;

        let workspace = frame.workspace;
        self.display.publish_window_desktop(client, workspace as u32)?;
        let id = self.frames.add(frame);
        self.ledger_add(client)?;

        log::info!(
            "Framed client 0x{:x} in decoration 0x{:x} ({}x{}, workspace {})",
            client,
            decoration,
            width,
            height,
            workspace + 1
        );
        self.trace(StateTransition::FrameCreated { client, decoration });
        Ok(id)
    }

    /// Title bar, text area, drawing context and buttons inside a new decoration
    fn build_decoration(
        &mut self,
        decoration: Window,
        client: Window,
        width: u32,
    ) -> Result<Frame> {
        let chrome = self.config.chrome();
        let cfg = &self.config;

        let title_bar = self.display.create_surface(&SurfaceSpec {
            role: SurfaceRole::TitleBar,
            parent: decoration,
            geometry: chrome.title_bar_rect(width),
            border_width: chrome.border_width,
            border_color: cfg.border_color,
            background: cfg.title_bar_color,
        })?;
        let title_text = self.display.create_surface(&SurfaceSpec {
            role: SurfaceRole::TitleText,
            parent: title_bar,
            geometry: chrome.title_text_rect(width),
            border_width: 0,
            border_color: cfg.border_color,
            background: cfg.title_bar_color,
        })?;

        let mut buttons = Vec::with_capacity(ButtonAction::ORDER.len());
        for (index, action) in ButtonAction::ORDER.into_iter().enumerate() {
            let color = match action {
                ButtonAction::Close => cfg.close_color,
                ButtonAction::ToggleFullscreen => cfg.expand_color,
                ButtonAction::SplitLeft | ButtonAction::SplitRight => cfg.split_color,
            };
            let (x, y) = chrome.button_origin(index, width);
            let button = self.display.create_surface(&SurfaceSpec {
                role: SurfaceRole::Button,
                parent: title_bar,
                geometry: Rect::new(x, y, chrome.button_size, chrome.button_size),
                border_width: 1,
                border_color: cfg.button_border_color,
                background: color,
            })?;
            self.display.map(button)?;
            buttons.push((button, action));
        }

        self.display.map(title_bar)?;
        self.display.map(title_text)?;

        // Last, so a failure above leaves nothing but windows behind
        let gc = self.display.create_drawing_context(
            title_text,
            cfg.foreground_color,
            cfg.title_bar_color,
        )?;

        let mut frame = Frame::new(
            decoration,
            title_bar,
            title_text,
            client,
            gc,
            self.workspaces.current_index(),
        );
        for (button, action) in buttons {
            frame.buttons.push(button, action);
        }
        Ok(frame)
    }

    /// Tear down a decoration whose client never made it inside. Its
    /// subwindows go with it.
    fn abandon_decoration(&mut self, decoration: Window, gc: Option<Gcontext>) {
        if let Some(gc) = gc {
            if let Err(e) = self.display.free_drawing_context(gc) {
                log::warn!("Failed to free drawing context 0x{:x}: {}", gc, e);
            }
        }
        if let Err(e) = self.display.destroy(decoration) {
            log::warn!("Failed to destroy decoration 0x{:x}: {}", decoration, e);
        }
    }

    /// Resize a frame's decoration, client and title bar and re-lay-out its
    /// buttons. A programmatic resize arms the self-ack guard.
    pub fn resize_frame(
        &mut self,
        id: FrameId,
        width: u32,
        height: u32,
        programmatic: bool,
    ) -> Result<()> {
        let chrome = self.config.chrome();
        let frame = match self.frames.get_mut(id) {
            Some(frame) => frame,
            None => return Ok(()),
        };
        if programmatic {
            frame.ack.arm();
        }

        self.display.resize(frame.decoration, width, height)?;
        self.display
            .resize(frame.client, width, chrome.content_height(height))?;
        self.display
            .resize(frame.title_bar, width, chrome.title_height)?;
        let text = chrome.title_text_rect(width);
        self.display
            .configure(frame.title_text, &ConfigureChanges::new().width(text.width))?;
        for (index, button) in frame.buttons.iter().enumerate() {
            let (x, y) = chrome.button_origin(index, width);
            self.display.move_to(button.window, x, y)?;
        }
        Ok(())
    }

    /// Place a frame's decoration at `rect` and tell the client where it ended up.
    pub fn move_resize_frame(&mut self, id: FrameId, rect: Rect) -> Result<()> {
        self.resize_frame(id, rect.width, rect.height, true)?;
        let (decoration, client) = match self.frames.get(id) {
            Some(frame) => (frame.decoration, frame.client),
            None => return Ok(()),
        };
        self.display.move_to(decoration, rect.x, rect.y)?;

        let geometry = self
            .config
            .chrome()
            .synthetic_geometry(rect.width, rect.height);
        self.display.send_configure_notify(client, geometry)?;
        Ok(())
    }

    /// Enter or leave fullscreen. Asking for the current state does nothing.
    pub fn set_fullscreen(&mut self, id: FrameId, want: bool) -> Result<()> {
        let (decoration, client, is_fullscreen) = match self.frames.get(id) {
            Some(frame) => (frame.decoration, frame.client, frame.is_fullscreen()),
            None => return Ok(()),
        };
        if want == is_fullscreen {
            return Ok(());
        }

        if want {
            let current = match self.display.attributes(decoration) {
                Some(attrs) => attrs.geometry,
                None => return Ok(()),
            };
            if let Some(frame) = self.frames.get_mut(id) {
                frame.state.enter_fullscreen(current);
            }
            let (screen_width, screen_height) = self.display.screen_size();
            let target = self
                .config
                .chrome()
                .fullscreen_rect(screen_width, screen_height);
            self.move_resize_frame(id, target)?;
            self.display.raise(decoration)?;
        } else {
            let saved = self
                .frames
                .get_mut(id)
                .and_then(|frame| frame.state.leave_fullscreen());
            if let Some(saved) = saved {
                self.move_resize_frame(id, saved)?;
            }
        }

        log::debug!("Client 0x{:x} fullscreen={}", client, want);
        self.trace(StateTransition::FullscreenChanged {
            client,
            fullscreen: want,
        });
        Ok(())
    }

    /// Snap a frame to the left or right half of the work area
    pub fn split_frame(&mut self, id: FrameId, side: Side) -> Result<()> {
        let client = match self.frames.get_mut(id) {
            Some(frame) => {
                frame.state.clear();
                frame.client
            }
            None => return Ok(()),
        };
        let (screen_width, screen_height) = self.display.screen_size();
        let target = self
            .config
            .chrome()
            .split_rect(side, screen_width, screen_height);
        self.move_resize_frame(id, target)?;
        self.trace(StateTransition::FrameSplit {
            client,
            side: side.name().to_string(),
        });
        Ok(())
    }

    /// Close a frame's client: politely if it speaks WM_DELETE_WINDOW,
    /// otherwise by tearing the frame down.
    pub fn close_frame(&mut self, id: FrameId) -> Result<()> {
        let client = match self.frames.get(id) {
            Some(frame) => frame.client,
            None => return Ok(()),
        };
        if self.display.supports_delete(client) {
            log::info!("Asking client 0x{:x} to close", client);
            self.display.send_delete(client)
        } else {
            log::info!("Client 0x{:x} has no delete protocol, destroying it", client);
            self.discard_frame(id, UnmanageReason::WmClosed)?;
            Ok(())
        }
    }

    /// Remove a frame and release everything it owns. Returns false if the
    /// frame was already gone.
    pub fn discard_frame(&mut self, id: FrameId, reason: UnmanageReason) -> Result<bool> {
        let frame = match self.frames.remove(id) {
            Some(frame) => frame,
            None => return Ok(false),
        };

        if self.grab.map_or(false, |grab| grab.frame == id) {
            self.grab = None;
            self.display.ungrab_pointer()?;
        }

        self.ledger_remove(frame.client)?;
        if self.display.is_alive(frame.decoration) {
            self.display.destroy(frame.decoration)?;
        }
        self.display.free_drawing_context(frame.gc)?;

        log::info!("Unmanaged client 0x{:x} ({:?})", frame.client, reason);
        self.trace(StateTransition::FrameRemoved {
            client: frame.client,
            reason,
        });
        Ok(true)
    }

    /// Redraw a frame's title from the client's current name
    pub fn redraw_title(&mut self, id: FrameId) -> Result<()> {
        let (client, title_text, gc) = match self.frames.get(id) {
            Some(frame) => (frame.client, frame.title_text, frame.gc),
            None => return Ok(()),
        };
        let title = self.display.title(client);
        self.display.draw_title(title_text, gc, &title)
    }

    /// Re-read type-derived state after the client changed its window type
    pub fn update_window_type(&mut self, id: FrameId) -> Result<()> {
        let client = match self.frames.get(id) {
            Some(frame) => frame.client,
            None => return Ok(()),
        };
        log::debug!(
            "Client 0x{:x} is now {:?}",
            client,
            self.display.window_type(client)
        );
        if self.display.wants_fullscreen(client) {
            self.set_fullscreen(id, true)?;
        }
        Ok(())
    }

    pub fn run_button_action(&mut self, id: FrameId, action: ButtonAction) -> Result<()> {
        log::debug!("Button action {:?}", action);
        match action {
            ButtonAction::Close => self.close_frame(id),
            ButtonAction::ToggleFullscreen => {
                let fullscreen = self.frames.get(id).map_or(false, Frame::is_fullscreen);
                self.set_fullscreen(id, !fullscreen)
            }
            ButtonAction::SplitLeft => self.split_frame(id, Side::Left),
            ButtonAction::SplitRight => self.split_frame(id, Side::Right),
        }
    }
}
