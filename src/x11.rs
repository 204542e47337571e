//! X11 implementation of [`DisplayServer`].
//!
//! Owns the connection, the interned atoms, cursors and the title font.
//! Raw protocol events are turned into [`Notification`]s here so the rest
//! of the manager never touches x11rb event types.

use std::collections::HashMap;

use anyhow::{Context, Result};
use x11rb::connection::Connection;
use x11rb::cursor::Handle as CursorHandle;
use x11rb::protocol::xproto::*;
use x11rb::protocol::Event;
use x11rb::resource_manager;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT, CURRENT_TIME, NONE};

use crate::config::{LayoutConfig, ParsedBinding, WmAction};
use crate::display::{
    ConfigureChanges, DisplayServer, GrabCursor, Restack, SurfaceRole, SurfaceSpec,
    WindowAttributes, WindowType,
};
use crate::event::{ClientRequest, Notification, PropertyKind, StateAction};
use crate::ewmh::Atoms;
use crate::frame::TITLE_TEXT_X;
use crate::render::FontRenderer;
use crate::types::Rect;
use crate::window_query;
use crate::workspaces::{Workspaces, NUM_WORKSPACES};

/// Modifier bits that never take part in a binding
const IGNORED_MODIFIERS: u16 = 0x02 | 0x10; // Lock, Mod2 (NumLock)

/// Core font used when FreeType is unavailable
const CORE_FONT: &[u8] = b"fixed";
const CORE_FONT_BASELINE: i16 = 12;

struct Cursors {
    normal: Cursor,
    moving: Cursor,
    sizing: Cursor,
}

pub struct X11Display {
    conn: RustConnection,
    screen_num: usize,
    root: Window,
    atoms: Atoms,
    /// Window advertised in `_NET_SUPPORTING_WM_CHECK`
    check_window: Window,
    cursors: Cursors,
    font: Option<FontRenderer>,
    core_font: Font,
    /// Colours each drawing context was created with
    gc_colors: HashMap<Gcontext, (u32, u32)>,
    /// Unshifted keysym per keycode
    keysyms: HashMap<Keycode, u32>,
}

impl X11Display {
    /// Connect to the display named by `$DISPLAY`
    pub fn connect(config: &LayoutConfig) -> Result<Self> {
        let (conn, screen_num) =
            RustConnection::connect(None).context("Failed to connect to X11 server")?;
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        log::info!(
            "Connected to X11, screen {}, root window 0x{:x}, {}x{}",
            screen_num,
            root,
            screen.width_in_pixels,
            screen.height_in_pixels
        );

        let atoms = Atoms::new(&conn)?;

        let check_window = conn.generate_id()?;
        conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            check_window,
            root,
            -1,
            -1,
            1,
            1,
            0,
            WindowClass::INPUT_ONLY,
            COPY_FROM_PARENT,
            &CreateWindowAux::new(),
        )?;

        let database = resource_manager::new_from_default(&conn)?;
        let handle = CursorHandle::new(&conn, screen_num, &database)?.reply()?;
        let cursors = Cursors {
            normal: handle.load_cursor(&conn, "left_ptr")?,
            moving: handle.load_cursor(&conn, "fleur")?,
            sizing: handle.load_cursor(&conn, "sizing")?,
        };

        let core_font = conn.generate_id()?;
        conn.open_font(core_font, CORE_FONT)?;

        let font = match FontRenderer::new(&config.title_font, config.title_font_size) {
            Ok(font) => Some(font),
            Err(e) => {
                log::warn!("Falling back to core font for titles: {}", e);
                None
            }
        };

        Ok(Self {
            conn,
            screen_num,
            root,
            atoms,
            check_window,
            cursors,
            font,
            core_font,
            gc_colors: HashMap::new(),
            keysyms: HashMap::new(),
        })
    }

    fn screen(&self) -> &Screen {
        &self.conn.setup().roots[self.screen_num]
    }

    /// Become the window manager by requesting SubstructureRedirect on root
    pub fn become_wm(&self) -> Result<()> {
        let event_mask = EventMask::SUBSTRUCTURE_REDIRECT
            | EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::PROPERTY_CHANGE
            | EventMask::BUTTON_PRESS
            | EventMask::BUTTON_RELEASE
            | EventMask::POINTER_MOTION
            | EventMask::ENTER_WINDOW;

        let result = self.conn.change_window_attributes(
            self.root,
            &ChangeWindowAttributesAux::new()
                .event_mask(event_mask)
                .cursor(self.cursors.normal),
        );
        self.conn.flush()?;
        if let Err(e) = result?.check() {
            anyhow::bail!("Another window manager is already running! Error: {}", e);
        }

        log::info!("Successfully became the window manager");
        Ok(())
    }

    /// Publish supported hints, the check window and the desktop layout
    pub fn setup_ewmh(&self) -> Result<()> {
        let atoms = &self.atoms;
        self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            atoms.net_supported,
            AtomEnum::ATOM,
            &atoms.supported(),
        )?;

        for window in [self.root, self.check_window] {
            self.conn.change_property32(
                PropMode::REPLACE,
                window,
                atoms.net_supporting_wm_check,
                AtomEnum::WINDOW,
                &[self.check_window],
            )?;
        }
        self.conn.change_property8(
            PropMode::REPLACE,
            self.check_window,
            atoms.net_wm_name,
            atoms.utf8_string,
            b"framewm",
        )?;

        self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            atoms.net_number_of_desktops,
            AtomEnum::CARDINAL,
            &[NUM_WORKSPACES as u32],
        )?;
        let names: Vec<u8> = Workspaces::names()
            .iter()
            .flat_map(|name| name.bytes().chain(std::iter::once(0)))
            .collect();
        self.conn.change_property8(
            PropMode::REPLACE,
            self.root,
            atoms.net_desktop_names,
            atoms.utf8_string,
            &names,
        )?;
        self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            atoms.net_desktop_viewport,
            AtomEnum::CARDINAL,
            &[0u32; NUM_WORKSPACES * 2],
        )?;
        self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            atoms.net_current_desktop,
            AtomEnum::CARDINAL,
            &[0],
        )?;
        self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            atoms.net_client_list,
            AtomEnum::WINDOW,
            &[],
        )?;

        self.conn.flush()?;
        log::info!("EWMH properties set up");
        Ok(())
    }

    /// Grab every bound key on the root window
    pub fn grab_keys(&mut self, bindings: &HashMap<WmAction, ParsedBinding>) -> Result<()> {
        let setup = self.conn.setup();
        let min_keycode = setup.min_keycode;
        let max_keycode = setup.max_keycode;
        let mapping = self
            .conn
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
            .reply()?;
        let per_keycode = mapping.keysyms_per_keycode as usize;

        let mut keycodes: HashMap<u32, Keycode> = HashMap::new();
        self.keysyms.clear();
        for (i, chunk) in mapping.keysyms.chunks(per_keycode).enumerate() {
            let keycode = min_keycode + i as u8;
            if let Some(&unshifted) = chunk.first().filter(|&&k| k != 0) {
                self.keysyms.insert(keycode, unshifted);
            }
            for &keysym in chunk.iter().filter(|&&k| k != 0) {
                keycodes.entry(keysym).or_insert(keycode);
            }
        }

        for (action, binding) in bindings {
            match keycodes.get(&binding.keysym) {
                Some(&keycode) => {
                    self.grab_key(keycode, ModMask::from(binding.modifiers))?;
                    log::debug!(
                        "Grabbed {:?} (keycode {}, mods 0x{:x})",
                        action,
                        keycode,
                        binding.modifiers
                    );
                }
                None => log::warn!(
                    "Could not find keycode for {:?} (keysym 0x{:x})",
                    action,
                    binding.keysym
                ),
            }
        }
        self.conn.flush()?;
        Ok(())
    }

    /// Grab with and without CapsLock/NumLock
    fn grab_key(&self, keycode: Keycode, modifiers: ModMask) -> Result<()> {
        for extra in lock_variants() {
            self.conn.grab_key(
                false,
                self.root,
                modifiers | extra,
                keycode,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
            )?;
        }
        Ok(())
    }

    /// Mod4 + left/right drag anywhere on a framed window
    pub fn grab_buttons(&self) -> Result<()> {
        for button in [ButtonIndex::M1, ButtonIndex::M3] {
            for extra in lock_variants() {
                self.conn.grab_button(
                    false,
                    self.root,
                    EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                    NONE,
                    NONE,
                    button,
                    ModMask::M4 | extra,
                )?;
            }
        }
        self.conn.flush()?;
        Ok(())
    }

    /// Current children of the root, bottom to top
    pub fn top_level_windows(&self) -> Result<Vec<Window>> {
        Ok(self.conn.query_tree(self.root)?.reply()?.children)
    }

    pub fn poll_event(&self) -> Result<Option<Event>> {
        Ok(self.conn.poll_for_event()?)
    }

    /// Translate a protocol event. Events the manager does not react to
    /// yield `None`.
    pub fn translate(&self, event: &Event) -> Option<Notification> {
        let notification = match event {
            Event::MapRequest(e) => Notification::MapRequest { window: e.window },
            Event::ConfigureRequest(e) => Notification::ConfigureRequest {
                window: e.window,
                changes: requested_changes(e),
            },
            Event::ResizeRequest(e) => Notification::ResizeRequest {
                window: e.window,
                width: e.width as u32,
                height: e.height as u32,
            },
            Event::UnmapNotify(e) => Notification::Unmap {
                event: e.event,
                window: e.window,
            },
            Event::DestroyNotify(e) => Notification::Destroy { window: e.window },
            Event::ReparentNotify(e) => Notification::Reparent {
                window: e.window,
                parent: e.parent,
            },
            Event::PropertyNotify(e) => Notification::Property {
                window: e.window,
                kind: self.property_kind(e.atom),
            },
            Event::ButtonPress(e) => Notification::ButtonPress {
                event: e.event,
                child: (e.child != NONE).then_some(e.child),
                button: e.detail,
                root_x: e.root_x as i32,
                root_y: e.root_y as i32,
            },
            Event::MotionNotify(e) => Notification::Motion {
                root_x: e.root_x as i32,
                root_y: e.root_y as i32,
            },
            Event::ButtonRelease(e) => Notification::ButtonRelease { button: e.detail },
            Event::KeyPress(e) => Notification::KeyPress {
                keysym: self.keysyms.get(&e.detail).copied()?,
                modifiers: clean_modifiers(u16::from(e.state)),
            },
            Event::ClientMessage(e) => Notification::ClientMessage {
                window: e.window,
                request: self.client_request(e),
            },
            Event::EnterNotify(e) => Notification::Enter { window: e.event },
            Event::Expose(e) => Notification::Expose {
                window: e.window,
                count: e.count,
            },
            Event::Error(e) => {
                log::warn!("X11 error: {:?}", e);
                return None;
            }
            _ => return None,
        };
        Some(notification)
    }

    fn property_kind(&self, atom: Atom) -> PropertyKind {
        if atom == self.atoms.net_wm_name || atom == u32::from(AtomEnum::WM_NAME) {
            PropertyKind::Name
        } else if atom == self.atoms.net_wm_window_type {
            PropertyKind::WindowType
        } else {
            PropertyKind::Other
        }
    }

    fn client_request(&self, e: &ClientMessageEvent) -> ClientRequest {
        let data = e.data.as_data32();
        let atoms = &self.atoms;
        if e.type_ == atoms.net_close_window
            || (e.type_ == atoms.wm_protocols && data[0] == atoms.wm_delete_window)
        {
            ClientRequest::Close
        } else if e.type_ == atoms.net_wm_state
            && data[1..3].contains(&atoms.net_wm_state_fullscreen)
        {
            StateAction::from_raw(data[0]).map_or(ClientRequest::Other, ClientRequest::Fullscreen)
        } else if e.type_ == atoms.net_current_desktop {
            ClientRequest::SwitchDesktop(data[0])
        } else {
            ClientRequest::Other
        }
    }

    /// Rasterised title via FreeType; false when no font is loaded
    fn put_rendered_title(&self, window: Window, gc: Gcontext, text: &str) -> Result<bool> {
        let font = match &self.font {
            Some(font) => font,
            None => return Ok(false),
        };
        let (fg, bg) = self.gc_colors.get(&gc).copied().unwrap_or((0, 0xffffff));
        let geometry = self.conn.get_geometry(window)?.reply()?;
        let room = (geometry.width as u32).saturating_sub(TITLE_TEXT_X as u32);
        let text = font.truncate_to_width(text, room);
        let image = match font.render_text(&text, fg, bg) {
            Some(image) => image,
            None => return Ok(true),
        };
        let y = (geometry.height as i32 - image.height as i32).max(0) / 2;
        self.conn.put_image(
            ImageFormat::Z_PIXMAP,
            window,
            gc,
            image.width as u16,
            image.height as u16,
            TITLE_TEXT_X as i16,
            y as i16,
            0,
            self.screen().root_depth,
            &image.pixels,
        )?;
        Ok(true)
    }

    /// Release server-side resources before exiting
    pub fn shutdown(&mut self) -> Result<()> {
        self.conn.destroy_window(self.check_window)?;
        for cursor in [self.cursors.normal, self.cursors.moving, self.cursors.sizing] {
            self.conn.free_cursor(cursor)?;
        }
        self.conn.close_font(self.core_font)?;
        self.conn.flush()?;
        Ok(())
    }
}

fn lock_variants() -> [ModMask; 4] {
    [
        ModMask::from(0u16),
        ModMask::LOCK,
        ModMask::M2,
        ModMask::LOCK | ModMask::M2,
    ]
}

/// Drop lock modifiers and pointer-button bits from a key state
fn clean_modifiers(state: u16) -> u16 {
    state & !IGNORED_MODIFIERS & 0xff
}

fn requested_changes(e: &ConfigureRequestEvent) -> ConfigureChanges {
    let mask = u16::from(e.value_mask);
    let has = |bit: ConfigWindow| mask & u16::from(bit) != 0;
    ConfigureChanges {
        x: has(ConfigWindow::X).then_some(e.x as i32),
        y: has(ConfigWindow::Y).then_some(e.y as i32),
        width: has(ConfigWindow::WIDTH).then_some(e.width as u32),
        height: has(ConfigWindow::HEIGHT).then_some(e.height as u32),
        border_width: has(ConfigWindow::BORDER_WIDTH).then_some(e.border_width as u32),
        sibling: has(ConfigWindow::SIBLING).then_some(e.sibling),
        stack_mode: has(ConfigWindow::STACK_MODE).then(|| from_stack_mode(e.stack_mode)),
    }
}

fn from_stack_mode(mode: StackMode) -> Restack {
    if mode == StackMode::BELOW {
        Restack::Below
    } else if mode == StackMode::TOP_IF {
        Restack::TopIf
    } else if mode == StackMode::BOTTOM_IF {
        Restack::BottomIf
    } else if mode == StackMode::OPPOSITE {
        Restack::Opposite
    } else {
        Restack::Above
    }
}

fn to_stack_mode(restack: Restack) -> StackMode {
    match restack {
        Restack::Above => StackMode::ABOVE,
        Restack::Below => StackMode::BELOW,
        Restack::TopIf => StackMode::TOP_IF,
        Restack::BottomIf => StackMode::BOTTOM_IF,
        Restack::Opposite => StackMode::OPPOSITE,
    }
}

fn event_mask_for(role: SurfaceRole) -> EventMask {
    match role {
        SurfaceRole::Decoration => EventMask::STRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT,
        SurfaceRole::TitleBar => {
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::BUTTON_PRESS | EventMask::EXPOSURE
        }
        SurfaceRole::TitleText => EventMask::EXPOSURE,
        SurfaceRole::Button => EventMask::BUTTON_PRESS,
    }
}

impl DisplayServer for X11Display {
    fn root(&self) -> Window {
        self.root
    }

    fn screen_size(&self) -> (u32, u32) {
        let screen = self.screen();
        (screen.width_in_pixels as u32, screen.height_in_pixels as u32)
    }

    fn attributes(&self, window: Window) -> Option<WindowAttributes> {
        let attrs = self.conn.get_window_attributes(window).ok()?.reply().ok()?;
        let geometry = self.conn.get_geometry(window).ok()?.reply().ok()?;
        Some(WindowAttributes {
            geometry: Rect::new(
                geometry.x as i32,
                geometry.y as i32,
                geometry.width as u32,
                geometry.height as u32,
            ),
            override_redirect: attrs.override_redirect,
            viewable: attrs.map_state == MapState::VIEWABLE,
        })
    }

    fn size_hint(&self, window: Window) -> Option<(u32, u32)> {
        window_query::get_size_hint(&self.conn, window)
    }

    fn parent(&self, window: Window) -> Option<Window> {
        Some(self.conn.query_tree(window).ok()?.reply().ok()?.parent)
    }

    fn window_type(&self, window: Window) -> WindowType {
        window_query::get_window_type(&self.conn, &self.atoms, window)
    }

    fn wants_fullscreen(&self, window: Window) -> bool {
        window_query::is_fullscreen_requested(&self.conn, &self.atoms, window)
    }

    fn supports_delete(&self, window: Window) -> bool {
        window_query::supports_delete_protocol(&self.conn, &self.atoms, window)
    }

    fn title(&self, window: Window) -> String {
        window_query::get_window_title(&self.conn, &self.atoms, window)
    }

    fn create_surface(&mut self, spec: &SurfaceSpec) -> Result<Window> {
        let window = self.conn.generate_id()?;
        let g = spec.geometry;
        self.conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            window,
            spec.parent,
            g.x as i16,
            g.y as i16,
            g.width.max(1) as u16,
            g.height.max(1) as u16,
            spec.border_width as u16,
            WindowClass::INPUT_OUTPUT,
            COPY_FROM_PARENT,
            &CreateWindowAux::new()
                .background_pixel(spec.background)
                .border_pixel(spec.border_color)
                .event_mask(event_mask_for(spec.role)),
        )?;
        Ok(window)
    }

    fn destroy(&mut self, window: Window) -> Result<()> {
        self.conn.destroy_window(window)?;
        Ok(())
    }

    fn map(&mut self, window: Window) -> Result<()> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn unmap(&mut self, window: Window) -> Result<()> {
        self.conn.unmap_window(window)?;
        Ok(())
    }

    fn configure(&mut self, window: Window, changes: &ConfigureChanges) -> Result<()> {
        let aux = ConfigureWindowAux::new()
            .x(changes.x)
            .y(changes.y)
            .width(changes.width)
            .height(changes.height)
            .border_width(changes.border_width)
            .sibling(changes.sibling)
            .stack_mode(changes.stack_mode.map(to_stack_mode));
        self.conn.configure_window(window, &aux)?;
        Ok(())
    }

    fn reparent(&mut self, window: Window, parent: Window, x: i32, y: i32) -> Result<()> {
        // Survives in the save-set if we die before releasing it
        self.conn.change_save_set(SetMode::INSERT, window)?;
        self.conn.reparent_window(window, parent, x as i16, y as i16)?;
        Ok(())
    }

    fn raise(&mut self, window: Window) -> Result<()> {
        self.conn.configure_window(
            window,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        )?;
        Ok(())
    }

    fn watch_client(&mut self, window: Window) -> Result<()> {
        let mask =
            EventMask::STRUCTURE_NOTIFY | EventMask::PROPERTY_CHANGE | EventMask::ENTER_WINDOW;
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().event_mask(mask),
        )?;
        Ok(())
    }

    fn watch_undecorated(&mut self, window: Window) -> Result<()> {
        let mask = EventMask::STRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT;
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().event_mask(mask),
        )?;
        Ok(())
    }

    fn focus(&mut self, window: Window) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, window, CURRENT_TIME)?;
        Ok(())
    }

    fn grab_pointer(&mut self, window: Window, cursor: GrabCursor) -> Result<()> {
        let cursor = match cursor {
            GrabCursor::Move => self.cursors.moving,
            GrabCursor::Resize => self.cursors.sizing,
        };
        let reply = self
            .conn
            .grab_pointer(
                true,
                window,
                EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                NONE,
                cursor,
                CURRENT_TIME,
            )?
            .reply()?;
        if reply.status != GrabStatus::SUCCESS {
            log::warn!("Pointer grab on 0x{:x} refused: {:?}", window, reply.status);
        }
        Ok(())
    }

    fn ungrab_pointer(&mut self) -> Result<()> {
        self.conn.ungrab_pointer(CURRENT_TIME)?;
        Ok(())
    }

    fn send_configure_notify(&mut self, window: Window, geometry: Rect) -> Result<()> {
        let event = ConfigureNotifyEvent {
            response_type: CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: window,
            window,
            above_sibling: NONE,
            x: geometry.x as i16,
            y: geometry.y as i16,
            width: geometry.width as u16,
            height: geometry.height as u16,
            border_width: 0,
            override_redirect: false,
        };
        self.conn
            .send_event(false, window, EventMask::STRUCTURE_NOTIFY, event)?;
        Ok(())
    }

    fn send_delete(&mut self, window: Window) -> Result<()> {
        window_query::send_delete_window(&self.conn, &self.atoms, window)
    }

    fn create_drawing_context(
        &mut self,
        window: Window,
        foreground: u32,
        background: u32,
    ) -> Result<Gcontext> {
        let gc = self.conn.generate_id()?;
        self.conn.create_gc(
            gc,
            window,
            &CreateGCAux::new()
                .foreground(foreground)
                .background(background)
                .font(self.core_font),
        )?;
        self.gc_colors.insert(gc, (foreground, background));
        Ok(gc)
    }

    fn free_drawing_context(&mut self, gc: Gcontext) -> Result<()> {
        self.gc_colors.remove(&gc);
        self.conn.free_gc(gc)?;
        Ok(())
    }

    fn draw_title(&mut self, window: Window, gc: Gcontext, text: &str) -> Result<()> {
        self.conn.clear_area(false, window, 0, 0, 0, 0)?;
        if text.is_empty() || self.put_rendered_title(window, gc, text)? {
            return Ok(());
        }
        // Core fonts only cover Latin-1
        let latin1: Vec<u8> = text
            .chars()
            .map(|c| if (c as u32) < 0x100 { c as u8 } else { b'?' })
            .take(255)
            .collect();
        self.conn
            .image_text8(window, gc, TITLE_TEXT_X as i16, CORE_FONT_BASELINE, &latin1)?;
        Ok(())
    }

    fn publish_client_list(&mut self, clients: &[Window]) -> Result<()> {
        self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            self.atoms.net_client_list,
            AtomEnum::WINDOW,
            clients,
        )?;
        Ok(())
    }

    fn publish_current_desktop(&mut self, index: u32) -> Result<()> {
        self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            self.atoms.net_current_desktop,
            AtomEnum::CARDINAL,
            &[index],
        )?;
        Ok(())
    }

    fn publish_window_desktop(&mut self, window: Window, index: u32) -> Result<()> {
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.net_wm_desktop,
            AtomEnum::CARDINAL,
            &[index],
        )?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_modifiers() {
        // Mod4 + NumLock + CapsLock
        assert_eq!(clean_modifiers(0x40 | 0x10 | 0x02), 0x40);
        // Button1 held during the press
        assert_eq!(clean_modifiers(0x41 | 0x100), 0x41);
    }

    #[test]
    fn test_requested_changes_follow_value_mask() {
        let event = ConfigureRequestEvent {
            response_type: CONFIGURE_REQUEST_EVENT,
            stack_mode: StackMode::BELOW,
            sequence: 0,
            parent: 1,
            window: 2,
            sibling: 0,
            x: 10,
            y: 20,
            width: 300,
            height: 200,
            border_width: 0,
            value_mask: ConfigWindow::X | ConfigWindow::HEIGHT | ConfigWindow::STACK_MODE,
        };
        let changes = requested_changes(&event);
        assert_eq!(changes.x, Some(10));
        assert_eq!(changes.y, None);
        assert_eq!(changes.width, None);
        assert_eq!(changes.height, Some(200));
        assert_eq!(changes.stack_mode, Some(Restack::Below));
    }

    #[test]
    fn test_stack_mode_round_trip() {
        for restack in [
            Restack::Above,
            Restack::Below,
            Restack::TopIf,
            Restack::BottomIf,
            Restack::Opposite,
        ] {
            assert_eq!(from_stack_mode(to_stack_mode(restack)), restack);
        }
    }

    #[test]
    fn test_title_bar_redirects_substructure() {
        let mask = u32::from(event_mask_for(SurfaceRole::TitleBar));
        assert_ne!(mask & u32::from(EventMask::SUBSTRUCTURE_REDIRECT), 0);
        assert_ne!(mask & u32::from(EventMask::EXPOSURE), 0);
        let mask = u32::from(event_mask_for(SurfaceRole::Button));
        assert_eq!(mask, u32::from(EventMask::BUTTON_PRESS));
    }
}
