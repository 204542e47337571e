//! Notification routing.
//!
//! The X11 backend translates raw protocol events into [`Notification`]s;
//! `handle_notification` dispatches each one to its handler. Handlers
//! resolve the window through the frame registry and treat an unknown
//! window as a normal outcome.

use anyhow::Result;
use x11rb::protocol::xproto::Window;

use crate::display::{ConfigureChanges, DisplayServer, GrabCursor};
use crate::frame::FrameId;
use crate::registry::Role;
use crate::state::{StateTransition, UnmanageReason};
use crate::wm::{Grab, GrabKind, Wm};

/// Which property of a client changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// WM_NAME or _NET_WM_NAME
    Name,
    /// _NET_WM_WINDOW_TYPE
    WindowType,
    Other,
}

/// `_NET_WM_STATE` action field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAction {
    Remove,
    Add,
    Toggle,
}

impl StateAction {
    pub fn from_raw(action: u32) -> Option<Self> {
        match action {
            0 => Some(StateAction::Remove),
            1 => Some(StateAction::Add),
            2 => Some(StateAction::Toggle),
            _ => None,
        }
    }
}

/// What a client message asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRequest {
    /// _NET_CLOSE_WINDOW, or WM_PROTOCOLS carrying WM_DELETE_WINDOW
    Close,
    /// _NET_WM_STATE naming _NET_WM_STATE_FULLSCREEN
    Fullscreen(StateAction),
    /// _NET_CURRENT_DESKTOP
    SwitchDesktop(u32),
    Other,
}

/// Display server notifications the manager reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    MapRequest {
        window: Window,
    },
    ConfigureRequest {
        window: Window,
        changes: ConfigureChanges,
    },
    ResizeRequest {
        window: Window,
        width: u32,
        height: u32,
    },
    Unmap {
        /// Window the notification was reported on
        event: Window,
        window: Window,
    },
    Destroy {
        window: Window,
    },
    Reparent {
        window: Window,
        parent: Window,
    },
    Property {
        window: Window,
        kind: PropertyKind,
    },
    ButtonPress {
        /// Window that received the press
        event: Window,
        /// Child of `event` under the pointer, if any
        child: Option<Window>,
        button: u8,
        root_x: i32,
        root_y: i32,
    },
    Motion {
        root_x: i32,
        root_y: i32,
    },
    ButtonRelease {
        button: u8,
    },
    KeyPress {
        keysym: u32,
        /// Modifier mask with lock keys stripped
        modifiers: u16,
    },
    ClientMessage {
        window: Window,
        request: ClientRequest,
    },
    Enter {
        window: Window,
    },
    Expose {
        window: Window,
        count: u16,
    },
}

impl Notification {
    /// Short name and subject window, for tracing
    fn describe(&self) -> (&'static str, Option<Window>) {
        match *self {
            Notification::MapRequest { window } => ("map_request", Some(window)),
            Notification::ConfigureRequest { window, .. } => ("configure_request", Some(window)),
            Notification::ResizeRequest { window, .. } => ("resize_request", Some(window)),
            Notification::Unmap { window, .. } => ("unmap", Some(window)),
            Notification::Destroy { window } => ("destroy", Some(window)),
            Notification::Reparent { window, .. } => ("reparent", Some(window)),
            Notification::Property { window, .. } => ("property", Some(window)),
            Notification::ButtonPress { event, .. } => ("button_press", Some(event)),
            Notification::Motion { .. } => ("motion", None),
            Notification::ButtonRelease { .. } => ("button_release", None),
            Notification::KeyPress { .. } => ("key_press", None),
            Notification::ClientMessage { window, .. } => ("client_message", Some(window)),
            Notification::Enter { window } => ("enter", Some(window)),
            Notification::Expose { window, .. } => ("expose", Some(window)),
        }
    }
}

const MIN_FRAME_WIDTH: u32 = 32;

impl<D: DisplayServer> Wm<D> {
    /// Dispatch one notification to its handler
    pub fn handle_notification(&mut self, notification: Notification) -> Result<()> {
        // Motion is too chatty for the trace buffer
        if !matches!(notification, Notification::Motion { .. }) {
            let (kind, window) = notification.describe();
            self.tracer
                .trace_notification(kind, window, format!("{:?}", notification));
        }

        match notification {
            Notification::MapRequest { window } => self.handle_map_request(window),
            Notification::ConfigureRequest { window, changes } => {
                self.handle_configure_request(window, changes)
            }
            Notification::ResizeRequest {
                window,
                width,
                height,
            } => self.handle_resize_request(window, width, height),
            Notification::Unmap { event, window } => self.handle_unmap(event, window),
            Notification::Destroy { window } => self.handle_destroy(window),
            Notification::Reparent { window, parent } => self.handle_reparent(window, parent),
            Notification::Property { window, kind } => self.handle_property(window, kind),
            Notification::ButtonPress {
                event,
                child,
                button,
                root_x,
                root_y,
            } => self.handle_button_press(event, child, button, root_x, root_y),
            Notification::Motion { root_x, root_y } => self.handle_motion(root_x, root_y),
            Notification::ButtonRelease { .. } => self.end_grab(),
            Notification::KeyPress { keysym, modifiers } => {
                self.handle_key_press(keysym, modifiers)
            }
            Notification::ClientMessage { window, request } => {
                self.handle_client_message(window, request)
            }
            Notification::Enter { window } => self.handle_enter(window),
            Notification::Expose { window, count } => match self.frames.lookup(window) {
                Some((id, Role::TitleBar | Role::TitleText)) if count == 0 => {
                    self.redraw_title(id)
                }
                _ => Ok(()),
            },
        }
    }

    fn handle_map_request(&mut self, window: Window) -> Result<()> {
        if let Some(id) = self.frames.find_by_component(window) {
            let (decoration, client) = match self.frames.get(id) {
                Some(frame) => (frame.decoration, frame.client),
                None => return Ok(()),
            };
            log::debug!("Remapping framed client 0x{:x}", client);
            self.display.map(decoration)?;
            self.display.map(client)?;
            return Ok(());
        }
        self.manage_window(window, false)?;
        Ok(())
    }

    fn handle_configure_request(
        &mut self,
        window: Window,
        changes: ConfigureChanges,
    ) -> Result<()> {
        let id = match self.frames.find_by_component(window) {
            Some(id) => id,
            None => {
                // Not ours: let the client have what it asked for
                return self.display.configure(window, &changes);
            }
        };
        if self.consume_self_ack(id) {
            return Ok(());
        }

        let chrome = self.config.chrome();
        let decoration = match self.frames.get(id) {
            Some(frame) => frame.decoration,
            None => return Ok(()),
        };
        let current = match self.display.attributes(decoration) {
            Some(attrs) => attrs.geometry,
            None => return Ok(()),
        };

        let x = changes.x.unwrap_or(current.x);
        let y = changes.y.unwrap_or(current.y);
        let width = changes.width.unwrap_or(current.width);
        let content_height = changes
            .height
            .unwrap_or_else(|| chrome.content_height(current.height));

        self.display.move_to(decoration, x, y)?;
        self.resize_frame(id, width, content_height + chrome.title_height, false)
    }

    fn handle_resize_request(&mut self, window: Window, width: u32, height: u32) -> Result<()> {
        let id = match self.frames.find_by_component(window) {
            Some(id) => id,
            None => return self.display.resize(window, width, height),
        };
        if self.consume_self_ack(id) {
            return Ok(());
        }
        let chrome = self.config.chrome();
        let borders = 2 * chrome.border_width;
        self.resize_frame(
            id,
            width + borders,
            height + chrome.title_height + borders,
            false,
        )
    }

    /// True if the frame was waiting to swallow its own resize
    fn consume_self_ack(&mut self, id: FrameId) -> bool {
        let Some(frame) = self.frames.get_mut(id) else {
            return false;
        };
        if !frame.ack.take() {
            return false;
        }
        log::debug!(
            "Ignoring self-induced geometry request on 0x{:x}",
            frame.client
        );
        true
    }

    fn handle_unmap(&mut self, event: Window, window: Window) -> Result<()> {
        if event == self.display.root() {
            return Ok(());
        }
        let id = match self.frames.lookup(window) {
            Some((id, Role::Client)) => id,
            _ => return Ok(()),
        };
        let decoration = match self.frames.get_mut(id) {
            Some(frame) if frame.pending_unmaps > 0 => {
                frame.pending_unmaps -= 1;
                return Ok(());
            }
            Some(frame) => frame.decoration,
            None => return Ok(()),
        };
        log::debug!("Client 0x{:x} withdrew, hiding its decoration", window);
        self.display.unmap(decoration)
    }

    fn handle_destroy(&mut self, window: Window) -> Result<()> {
        match self.frames.find_by_component(window) {
            Some(id) => {
                if self.discard_frame(id, UnmanageReason::ClientDestroyed)? {
                    let root = self.display.root();
                    self.display.focus(root)?;
                }
            }
            None => {
                if self.display.is_alive(window) {
                    self.display.destroy(window)?;
                }
            }
        }
        Ok(())
    }

    fn handle_reparent(&mut self, window: Window, parent: Window) -> Result<()> {
        let root = self.display.root();
        let id = self.frames.find_by_component(window);

        if parent == root {
            if id.is_none() {
                self.manage_window(window, false)?;
            }
            return Ok(());
        }

        if self.frames.find_by_component(parent).is_some() {
            // Moved into one of our own windows: that was us
            return Ok(());
        }
        if let Some(id) = id {
            log::info!("Client 0x{:x} was reparented away to 0x{:x}", window, parent);
            self.discard_frame(id, UnmanageReason::ClientEscaped)?;
        }
        Ok(())
    }

    fn handle_property(&mut self, window: Window, kind: PropertyKind) -> Result<()> {
        let id = match self.frames.find_by_component(window) {
            Some(id) => id,
            None => return Ok(()),
        };
        match kind {
            PropertyKind::Name => self.redraw_title(id),
            PropertyKind::WindowType => self.update_window_type(id),
            PropertyKind::Other => Ok(()),
        }
    }

    fn handle_button_press(
        &mut self,
        event: Window,
        child: Option<Window>,
        button: u8,
        root_x: i32,
        root_y: i32,
    ) -> Result<()> {
        if let Some((id, Role::Button(index))) = self.frames.lookup(event) {
            let action = match self.frames.get(id).and_then(|f| f.buttons.get(index)) {
                Some(b) => b.action,
                None => return Ok(()),
            };
            self.focus_frame(id)?;
            return self.run_button_action(id, action);
        }

        // Mod+click on the root reports the decoration as the child
        let id = match child
            .and_then(|c| self.frames.find_by_component(c))
            .or_else(|| self.frames.find_by_component(event))
        {
            Some(id) => id,
            None => return Ok(()),
        };
        self.focus_frame(id)?;

        let kind = match button {
            1 => GrabKind::Move,
            3 => GrabKind::Resize,
            _ => return Ok(()),
        };
        self.begin_grab(id, kind, root_x, root_y)
    }

    fn begin_grab(&mut self, id: FrameId, kind: GrabKind, root_x: i32, root_y: i32) -> Result<()> {
        let (decoration, client) = match self.frames.get(id) {
            Some(frame) => (frame.decoration, frame.client),
            None => return Ok(()),
        };
        let origin = match self.display.attributes(decoration) {
            Some(attrs) => attrs.geometry,
            None => return Ok(()),
        };
        let cursor = match kind {
            GrabKind::Move => GrabCursor::Move,
            GrabKind::Resize => GrabCursor::Resize,
        };
        self.display.grab_pointer(decoration, cursor)?;
        self.grab = Some(Grab {
            frame: id,
            kind,
            start_x: root_x,
            start_y: root_y,
            origin,
        });
        self.trace(StateTransition::GrabStarted {
            client,
            kind: kind.name().to_string(),
        });
        Ok(())
    }

    fn handle_motion(&mut self, root_x: i32, root_y: i32) -> Result<()> {
        let grab = match self.grab {
            Some(grab) => grab,
            None => return Ok(()),
        };
        match self.frames.get_mut(grab.frame) {
            Some(frame) => frame.state.clear(),
            None => {
                self.grab = None;
                return Ok(());
            }
        }

        let dx = root_x - grab.start_x;
        let dy = root_y - grab.start_y;
        let o = grab.origin;
        let target = match grab.kind {
            GrabKind::Move => o.at(o.x + dx, o.y + dy),
            GrabKind::Resize => {
                let min_height = (self.config.title_height + 1) as i32;
                let width = (o.width as i32 + dx).max(MIN_FRAME_WIDTH as i32) as u32;
                let height = (o.height as i32 + dy).max(min_height) as u32;
                crate::types::Rect::new(o.x, o.y, width, height)
            }
        };
        self.move_resize_frame(grab.frame, target)
    }

    /// End an interactive move or resize. Only a button release or the
    /// frame's removal ends a grab.
    fn end_grab(&mut self) -> Result<()> {
        if self.grab.take().is_some() {
            self.display.ungrab_pointer()?;
        }
        Ok(())
    }

    fn handle_key_press(&mut self, keysym: u32, modifiers: u16) -> Result<()> {
        let action = self
            .keybindings
            .iter()
            .find(|(_, b)| b.keysym == keysym && b.modifiers == modifiers)
            .map(|(action, _)| action.clone());
        match action {
            Some(action) => {
                log::debug!("Key 0x{:x} (mods 0x{:x}) -> {:?}", keysym, modifiers, action);
                self.execute_action(action)
            }
            None => Ok(()),
        }
    }

    fn handle_client_message(&mut self, window: Window, request: ClientRequest) -> Result<()> {
        if let ClientRequest::SwitchDesktop(index) = request {
            return self.switch_workspace(index as usize);
        }

        let id = match self.frames.find_by_component(window) {
            Some(id) => id,
            None => return Ok(()),
        };
        match request {
            ClientRequest::Close => {
                self.discard_frame(id, UnmanageReason::ClientRequested)?;
                Ok(())
            }
            ClientRequest::Fullscreen(action) => {
                let fullscreen = self.frames.get(id).map_or(false, |f| f.is_fullscreen());
                let want = match action {
                    StateAction::Remove => false,
                    StateAction::Add => true,
                    StateAction::Toggle => !fullscreen,
                };
                self.set_fullscreen(id, want)
            }
            ClientRequest::SwitchDesktop(_) | ClientRequest::Other => Ok(()),
        }
    }

    fn handle_enter(&mut self, window: Window) -> Result<()> {
        let root = self.display.root();
        if window == root {
            return self.display.focus(root);
        }
        let client = self
            .frames
            .find_by_component(window)
            .and_then(|id| self.frames.get(id))
            .map(|frame| frame.client);
        match client {
            Some(client) => self.display.focus(client),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::WindowType;
    use crate::frame::{ButtonAction, Frame};
    use crate::mock::{map_client, test_wm, Command, MockDisplay, ROOT};
    use crate::state::SelfAck;
    use crate::types::Rect;

    const CLIENT: Window = 0x400001;

    fn framed(rect: Rect) -> (Wm<MockDisplay>, FrameId, Frame) {
        let mut wm = test_wm();
        map_client(&mut wm, CLIENT, rect);
        let id = wm.frames.find_by_client(CLIENT).unwrap();
        let frame = wm.frames.get(id).unwrap().clone();
        wm.display_mut().take_commands();
        (wm, id, frame)
    }

    fn configure(window: Window, changes: ConfigureChanges) -> Notification {
        Notification::ConfigureRequest { window, changes }
    }

    #[test]
    fn test_map_request_classification() {
        let mut wm = test_wm();
        wm.display_mut().add_client(0x400001, Rect::new(0, 0, 300, 200)).override_redirect = true;
        wm.display_mut().add_client(0x400002, Rect::new(0, 0, 300, 200)).window_type =
            WindowType::Dialog;
        wm.display_mut().add_client(0x400003, Rect::new(0, 0, 300, 200)).window_type =
            WindowType::Utility;
        wm.display_mut().add_client(0x400004, Rect::new(0, 0, 300, 200)).window_type =
            WindowType::Other;

        for window in 0x400001..=0x400004 {
            wm.handle_notification(Notification::MapRequest { window }).unwrap();
        }

        assert_eq!(wm.ledger.windows(), &[0x400002]);
        let display = wm.display();
        assert!(!display.commands.contains(&Command::Map(0x400001)));
        assert!(display.commands.contains(&Command::WatchUndecorated(0x400003)));
        assert!(display.commands.contains(&Command::Map(0x400003)));
        assert!(display.commands.contains(&Command::Map(0x400004)));
    }

    #[test]
    fn test_map_request_with_non_root_parent_is_undecorated() {
        let mut wm = test_wm();
        wm.display_mut().add_client(0x500000, Rect::new(0, 0, 50, 50)).mapped = true;
        wm.display_mut().add_client(CLIENT, Rect::new(0, 0, 0, 0)).parent = 0x500000;

        wm.handle_notification(Notification::MapRequest { window: CLIENT }).unwrap();
        assert_eq!(wm.frames.len(), 0);
        let display = wm.display();
        // Zero-sized with no hint: forced to 1x1 first
        assert_eq!(display.geometry(CLIENT).map(|g| (g.width, g.height)), Some((1, 1)));
        assert!(display.commands.contains(&Command::Map(CLIENT)));
    }

    #[test]
    fn test_map_request_for_framed_client_remaps() {
        let (mut wm, _, frame) = framed(Rect::new(0, 0, 300, 200));
        wm.handle_notification(Notification::MapRequest { window: CLIENT }).unwrap();
        assert_eq!(
            wm.display().commands,
            vec![Command::Map(frame.decoration), Command::Map(CLIENT)]
        );
    }

    #[test]
    fn test_self_ack_suppresses_exactly_once() {
        let (mut wm, id, frame) = framed(Rect::new(0, 0, 300, 200));
        wm.move_resize_frame(id, Rect::new(10, 20, 500, 400)).unwrap();

        let request = ConfigureChanges::new().position(70, 80).size(640, 480);
        wm.handle_notification(configure(CLIENT, request)).unwrap();
        assert_eq!(
            wm.display().geometry(frame.decoration),
            Some(Rect::new(10, 20, 500, 400))
        );

        wm.handle_notification(configure(CLIENT, request)).unwrap();
        assert_eq!(
            wm.display().geometry(frame.decoration),
            Some(Rect::new(70, 80, 640, 496))
        );
        // Honoring a request does not re-arm the guard
        assert_eq!(wm.frames.get(id).unwrap().ack, SelfAck::Idle);
    }

    #[test]
    fn test_partial_configure_keeps_current_geometry() {
        let (mut wm, _, frame) = framed(Rect::new(5, 6, 300, 200));
        let request = ConfigureChanges::new().width(350);
        wm.handle_notification(configure(CLIENT, request)).unwrap();
        assert_eq!(
            wm.display().geometry(frame.decoration),
            Some(Rect::new(5, 6, 350, 216))
        );
    }

    #[test]
    fn test_configure_for_unmanaged_passes_through() {
        let mut wm = test_wm();
        wm.display_mut().add_client(0x600000, Rect::new(0, 0, 10, 10));
        let request = ConfigureChanges::new().position(1, 2);
        wm.handle_notification(configure(0x600000, request)).unwrap();
        assert_eq!(
            wm.display().commands,
            vec![Command::Configure(0x600000, request)]
        );
    }

    #[test]
    fn test_resize_request() {
        let (mut wm, _, frame) = framed(Rect::new(0, 0, 300, 200));
        wm.handle_notification(Notification::ResizeRequest {
            window: CLIENT,
            width: 400,
            height: 300,
        })
        .unwrap();
        assert_eq!(
            wm.display().geometry(frame.decoration),
            Some(Rect::new(0, 0, 404, 320))
        );

        wm.handle_notification(Notification::ResizeRequest {
            window: 0x600000,
            width: 40,
            height: 30,
        })
        .unwrap();
        assert_eq!(
            wm.display().commands.last(),
            Some(&Command::Configure(
                0x600000,
                ConfigureChanges::new().size(40, 30)
            ))
        );
    }

    #[test]
    fn test_unmap_hides_decoration_only() {
        let (mut wm, id, frame) = framed(Rect::new(0, 0, 300, 200));

        wm.handle_notification(Notification::Unmap { event: ROOT, window: CLIENT }).unwrap();
        assert!(wm.display().commands.is_empty());

        wm.handle_notification(Notification::Unmap { event: CLIENT, window: CLIENT }).unwrap();
        assert_eq!(wm.display().commands, vec![Command::Unmap(frame.decoration)]);
        assert!(wm.frames.contains(id));
        assert_eq!(wm.ledger.windows(), &[CLIENT]);
    }

    #[test]
    fn test_unmap_from_adoption_is_ignored_once() {
        let mut wm = test_wm();
        wm.display_mut().add_client(CLIENT, Rect::new(0, 0, 300, 200)).mapped = true;
        wm.adopt_windows(&[CLIENT]);
        let id = wm.frames.find_by_client(CLIENT).unwrap();
        let decoration = wm.frames.get(id).unwrap().decoration;
        wm.display_mut().take_commands();

        let unmap = Notification::Unmap { event: CLIENT, window: CLIENT };
        wm.handle_notification(unmap).unwrap();
        assert!(wm.display().commands.is_empty());
        wm.handle_notification(unmap).unwrap();
        assert_eq!(wm.display().commands, vec![Command::Unmap(decoration)]);
    }

    #[test]
    fn test_destroy_managed_client() {
        let (mut wm, id, frame) = framed(Rect::new(0, 0, 300, 200));
        wm.display_mut().kill(CLIENT);

        wm.handle_notification(Notification::Destroy { window: CLIENT }).unwrap();
        assert!(!wm.frames.contains(id));
        assert!(wm.ledger.windows().is_empty());
        let commands = &wm.display().commands;
        assert!(commands.contains(&Command::Destroy(frame.decoration)));
        assert!(commands.contains(&Command::ClientList(vec![])));
        assert_eq!(commands.last(), Some(&Command::Focus(ROOT)));
    }

    #[test]
    fn test_destroy_for_gone_unmanaged_window_is_silent() {
        let mut wm = test_wm();
        wm.handle_notification(Notification::Destroy { window: 0x777777 }).unwrap();
        assert!(wm.display().commands.is_empty());
    }

    #[test]
    fn test_destroy_for_live_unmanaged_window() {
        let mut wm = test_wm();
        wm.display_mut().add_client(0x600000, Rect::new(0, 0, 10, 10));
        wm.handle_notification(Notification::Destroy { window: 0x600000 }).unwrap();
        assert_eq!(wm.display().commands, vec![Command::Destroy(0x600000)]);
    }

    #[test]
    fn test_reparent_into_own_decoration_is_ignored() {
        let (mut wm, id, frame) = framed(Rect::new(0, 0, 300, 200));
        wm.handle_notification(Notification::Reparent {
            window: CLIENT,
            parent: frame.decoration,
        })
        .unwrap();
        assert!(wm.frames.contains(id));
        assert!(wm.display().commands.is_empty());
    }

    #[test]
    fn test_reparent_away_escapes_without_destroying_client() {
        let (mut wm, id, frame) = framed(Rect::new(0, 0, 300, 200));
        wm.display_mut().add_client(0x500000, Rect::new(0, 0, 50, 50));
        // Another program takes the client
        wm.display_mut().window_mut(CLIENT).unwrap().parent = 0x500000;

        wm.handle_notification(Notification::Reparent {
            window: CLIENT,
            parent: 0x500000,
        })
        .unwrap();
        assert!(!wm.frames.contains(id));
        assert!(wm.ledger.windows().is_empty());
        assert!(wm.display().commands.contains(&Command::Destroy(frame.decoration)));
        assert!(!wm.display().commands.contains(&Command::Destroy(CLIENT)));
        assert!(wm.display().is_alive(CLIENT));
    }

    #[test]
    fn test_reparent_to_root_maps_unmanaged() {
        let mut wm = test_wm();
        wm.display_mut().add_client(CLIENT, Rect::new(0, 0, 300, 200));
        wm.handle_notification(Notification::Reparent { window: CLIENT, parent: ROOT })
            .unwrap();
        assert_eq!(wm.ledger.windows(), &[CLIENT]);
    }

    #[test]
    fn test_property_name_redraws_title() {
        let (mut wm, _, frame) = framed(Rect::new(0, 0, 300, 200));
        wm.display_mut().window_mut(CLIENT).unwrap().title = "vim".to_string();
        wm.handle_notification(Notification::Property {
            window: CLIENT,
            kind: PropertyKind::Name,
        })
        .unwrap();
        assert_eq!(
            wm.display().commands,
            vec![Command::DrawTitle(frame.title_text, "vim".to_string())]
        );
    }

    #[test]
    fn test_window_type_change_reevaluates_fullscreen() {
        let (mut wm, id, _) = framed(Rect::new(0, 0, 300, 200));
        wm.display_mut().window_mut(CLIENT).unwrap().wants_fullscreen = true;
        wm.handle_notification(Notification::Property {
            window: CLIENT,
            kind: PropertyKind::WindowType,
        })
        .unwrap();
        assert!(wm.frames.get(id).unwrap().is_fullscreen());
    }

    #[test]
    fn test_button_window_runs_action() {
        let (mut wm, id, frame) = framed(Rect::new(0, 0, 300, 200));
        let split_left = frame
            .buttons
            .iter()
            .find(|b| b.action == ButtonAction::SplitLeft)
            .unwrap()
            .window;

        wm.handle_notification(Notification::ButtonPress {
            event: split_left,
            child: None,
            button: 1,
            root_x: 0,
            root_y: 0,
        })
        .unwrap();
        assert_eq!(
            wm.display().geometry(frame.decoration),
            Some(Rect::new(0, 20, 958, 1058))
        );
        assert!(wm.display().commands.contains(&Command::Focus(CLIENT)));
        assert!(wm.grab.is_none());
        assert!(wm.frames.contains(id));
    }

    #[test]
    fn test_drag_moves_frame_and_clears_fullscreen() {
        let (mut wm, id, frame) = framed(Rect::new(100, 100, 300, 200));
        wm.set_fullscreen(id, true).unwrap();
        wm.display_mut().take_commands();

        wm.handle_notification(Notification::ButtonPress {
            event: ROOT,
            child: Some(frame.decoration),
            button: 1,
            root_x: 500,
            root_y: 500,
        })
        .unwrap();
        assert!(wm
            .display()
            .commands
            .contains(&Command::GrabPointer(frame.decoration, GrabCursor::Move)));
        assert!(wm.display().commands.contains(&Command::Raise(frame.decoration)));

        wm.handle_notification(Notification::Motion { root_x: 510, root_y: 490 })
            .unwrap();
        assert_eq!(
            wm.display().geometry(frame.decoration),
            Some(Rect::new(10, 10, 1916, 1056))
        );
        assert!(!wm.frames.get(id).unwrap().is_fullscreen());

        wm.handle_notification(Notification::ButtonRelease { button: 1 }).unwrap();
        assert!(wm.grab.is_none());
        assert_eq!(wm.display().commands.last(), Some(&Command::UngrabPointer));

        // Motion after release does nothing
        let issued = wm.display().commands.len();
        wm.handle_notification(Notification::Motion { root_x: 0, root_y: 0 }).unwrap();
        assert_eq!(wm.display().commands.len(), issued);
    }

    #[test]
    fn test_resize_drag_on_title_bar() {
        let (mut wm, _, frame) = framed(Rect::new(0, 0, 300, 200));
        wm.handle_notification(Notification::ButtonPress {
            event: frame.title_bar,
            child: None,
            button: 3,
            root_x: 10,
            root_y: 10,
        })
        .unwrap();
        wm.handle_notification(Notification::Motion { root_x: 60, root_y: 30 }).unwrap();
        assert_eq!(
            wm.display().geometry(frame.decoration),
            Some(Rect::new(0, 0, 350, 236))
        );

        // Shrinking past the minimum clamps
        wm.handle_notification(Notification::Motion { root_x: -1000, root_y: -1000 })
            .unwrap();
        assert_eq!(
            wm.display().geometry(frame.decoration),
            Some(Rect::new(0, 0, 32, 17))
        );
    }

    #[test]
    fn test_grab_without_release_stays_active() {
        let (mut wm, _, frame) = framed(Rect::new(0, 0, 300, 200));
        wm.handle_notification(Notification::ButtonPress {
            event: ROOT,
            child: Some(frame.decoration),
            button: 1,
            root_x: 0,
            root_y: 0,
        })
        .unwrap();
        // Unrelated traffic never ends a grab
        wm.handle_notification(Notification::Enter { window: ROOT }).unwrap();
        wm.handle_notification(Notification::KeyPress { keysym: 0x31, modifiers: 64 })
            .unwrap();
        assert!(wm.grab.is_some());
    }

    #[test]
    fn test_grab_dropped_with_its_frame() {
        let (mut wm, _, frame) = framed(Rect::new(0, 0, 300, 200));
        wm.handle_notification(Notification::ButtonPress {
            event: ROOT,
            child: Some(frame.decoration),
            button: 3,
            root_x: 0,
            root_y: 0,
        })
        .unwrap();
        wm.handle_notification(Notification::Destroy { window: CLIENT }).unwrap();
        assert!(wm.grab.is_none());
        assert!(wm.display().commands.contains(&Command::UngrabPointer));
    }

    #[test]
    fn test_press_on_unmanaged_window_does_nothing() {
        let mut wm = test_wm();
        wm.handle_notification(Notification::ButtonPress {
            event: ROOT,
            child: None,
            button: 1,
            root_x: 0,
            root_y: 0,
        })
        .unwrap();
        assert!(wm.display().commands.is_empty());
        assert!(wm.grab.is_none());
    }

    #[test]
    fn test_key_bindings() {
        let mut wm = test_wm();
        // Mod4+3
        wm.handle_notification(Notification::KeyPress { keysym: 0x33, modifiers: 64 })
            .unwrap();
        assert_eq!(wm.workspaces.current_index(), 2);

        // Unbound combination
        wm.handle_notification(Notification::KeyPress { keysym: 0x33, modifiers: 0 })
            .unwrap();
        assert_eq!(wm.workspaces.current_index(), 2);

        // Mod4+Shift+e
        wm.handle_notification(Notification::KeyPress { keysym: 0x65, modifiers: 65 })
            .unwrap();
        assert!(!wm.is_running());
    }

    #[test]
    fn test_client_message_close_tears_down() {
        let (mut wm, id, frame) = framed(Rect::new(0, 0, 300, 200));
        wm.display_mut().window_mut(CLIENT).unwrap().supports_delete = true;
        wm.handle_notification(Notification::ClientMessage {
            window: CLIENT,
            request: ClientRequest::Close,
        })
        .unwrap();
        assert!(!wm.frames.contains(id));
        assert!(wm.display().commands.contains(&Command::Destroy(frame.decoration)));
        assert!(!wm.display().commands.contains(&Command::SendDelete(CLIENT)));
    }

    #[test]
    fn test_client_message_fullscreen_actions() {
        let (mut wm, id, _) = framed(Rect::new(0, 0, 300, 200));
        let send = |wm: &mut Wm<MockDisplay>, action| {
            wm.handle_notification(Notification::ClientMessage {
                window: CLIENT,
                request: ClientRequest::Fullscreen(action),
            })
            .unwrap();
            wm.frames.get(id).unwrap().is_fullscreen()
        };

        assert!(send(&mut wm, StateAction::Add));
        assert!(send(&mut wm, StateAction::Add));
        assert!(!send(&mut wm, StateAction::Toggle));
        assert!(send(&mut wm, StateAction::Toggle));
        assert!(!send(&mut wm, StateAction::Remove));
    }

    #[test]
    fn test_client_message_switches_desktop_for_any_window() {
        let mut wm = test_wm();
        wm.handle_notification(Notification::ClientMessage {
            window: ROOT,
            request: ClientRequest::SwitchDesktop(5),
        })
        .unwrap();
        assert_eq!(wm.workspaces.current_index(), 5);
        assert_eq!(wm.display().commands, vec![Command::CurrentDesktop(5)]);
    }

    #[test]
    fn test_enter_focus() {
        let (mut wm, _, frame) = framed(Rect::new(0, 0, 300, 200));
        wm.handle_notification(Notification::Enter { window: ROOT }).unwrap();
        wm.handle_notification(Notification::Enter { window: frame.decoration }).unwrap();
        wm.handle_notification(Notification::Enter { window: 0x999999 }).unwrap();
        assert_eq!(
            wm.display().commands,
            vec![Command::Focus(ROOT), Command::Focus(CLIENT)]
        );
    }

    #[test]
    fn test_expose_redraws_on_last_region() {
        let (mut wm, _, frame) = framed(Rect::new(0, 0, 300, 200));
        wm.handle_notification(Notification::Expose { window: frame.title_bar, count: 2 })
            .unwrap();
        assert!(wm.display().commands.is_empty());
        wm.handle_notification(Notification::Expose { window: frame.title_bar, count: 0 })
            .unwrap();
        assert_eq!(wm.display().count(|c| matches!(c, Command::DrawTitle(..))), 1);
    }

    #[test]
    fn test_expose_on_title_text_redraws() {
        let (mut wm, _, frame) = framed(Rect::new(0, 0, 300, 200));
        wm.handle_notification(Notification::Expose {
            window: frame.title_text,
            count: 0,
        })
        .unwrap();
        assert_eq!(
            wm.display().commands,
            vec![Command::DrawTitle(frame.title_text, String::new())]
        );
    }

    #[test]
    fn test_expose_on_decoration_is_ignored() {
        let (mut wm, _, frame) = framed(Rect::new(0, 0, 300, 200));
        wm.handle_notification(Notification::Expose {
            window: frame.decoration,
            count: 0,
        })
        .unwrap();
        assert!(wm.display().commands.is_empty());
    }

    #[test]
    fn test_state_action_from_raw() {
        assert_eq!(StateAction::from_raw(0), Some(StateAction::Remove));
        assert_eq!(StateAction::from_raw(2), Some(StateAction::Toggle));
        assert_eq!(StateAction::from_raw(3), None);
    }

    #[test]
    fn test_notifications_are_traced() {
        let mut wm = test_wm();
        wm.handle_notification(Notification::Destroy { window: 0x10 }).unwrap();
        wm.handle_notification(Notification::Motion { root_x: 1, root_y: 1 }).unwrap();
        let entries = wm.tracer.recent(10);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event_type, "destroy");
        assert_eq!(entries[0].window, Some(0x10));
    }
}
