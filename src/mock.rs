//! In-memory display server for unit tests.
//!
//! `MockDisplay` keeps a small window tree (geometry, parent, map state) so
//! queries answer the way a server would after the commands issued so far,
//! and records every command for assertions.

use std::collections::HashMap;

use anyhow::Result;
use x11rb::protocol::xproto::{Gcontext, Window};

use crate::config::{Config, LayoutConfig};
use crate::display::{
    ConfigureChanges, DisplayServer, GrabCursor, SurfaceRole, SurfaceSpec, WindowAttributes,
    WindowType,
};
use crate::types::Rect;
use crate::wm::Wm;

pub const ROOT: Window = 1;
pub const SCREEN: (u32, u32) = (1920, 1080);

/// A command the manager issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create { window: Window, role: SurfaceRole, parent: Window, geometry: Rect },
    Destroy(Window),
    Map(Window),
    Unmap(Window),
    Configure(Window, ConfigureChanges),
    Reparent { window: Window, parent: Window, x: i32, y: i32 },
    Raise(Window),
    WatchClient(Window),
    WatchUndecorated(Window),
    Focus(Window),
    GrabPointer(Window, GrabCursor),
    UngrabPointer,
    ConfigureNotify(Window, Rect),
    SendDelete(Window),
    CreateGc(Window),
    FreeGc(Gcontext),
    DrawTitle(Window, String),
    ClientList(Vec<Window>),
    CurrentDesktop(u32),
    WindowDesktop(Window, u32),
}

/// Server-side state of one window
#[derive(Debug, Clone)]
pub struct MockWindow {
    pub parent: Window,
    pub geometry: Rect,
    pub mapped: bool,
    pub override_redirect: bool,
    pub size_hint: Option<(u32, u32)>,
    pub window_type: WindowType,
    pub wants_fullscreen: bool,
    pub supports_delete: bool,
    pub title: String,
    /// Fail reparenting, as a server does for a window destroyed in between
    pub reject_reparent: bool,
}

impl MockWindow {
    fn new(parent: Window, geometry: Rect) -> Self {
        Self {
            parent,
            geometry,
            mapped: false,
            override_redirect: false,
            size_hint: None,
            window_type: WindowType::Normal,
            wants_fullscreen: false,
            supports_delete: false,
            title: String::new(),
            reject_reparent: false,
        }
    }
}

pub struct MockDisplay {
    pub commands: Vec<Command>,
    windows: HashMap<Window, MockWindow>,
    next_id: u32,
}

impl MockDisplay {
    pub fn new() -> Self {
        let mut root = MockWindow::new(0, Rect::new(0, 0, SCREEN.0, SCREEN.1));
        root.mapped = true;
        let mut windows = HashMap::new();
        windows.insert(ROOT, root);
        Self {
            commands: Vec::new(),
            windows,
            next_id: 0x0020_0000,
        }
    }

    /// Script an unmapped top-level client window
    pub fn add_client(&mut self, window: Window, geometry: Rect) -> &mut MockWindow {
        self.windows
            .entry(window)
            .or_insert_with(|| MockWindow::new(ROOT, geometry))
    }

    pub fn window(&self, window: Window) -> Option<&MockWindow> {
        self.windows.get(&window)
    }

    pub fn window_mut(&mut self, window: Window) -> Option<&mut MockWindow> {
        self.windows.get_mut(&window)
    }

    /// Make a window vanish as if its client died, without recording anything
    pub fn kill(&mut self, window: Window) {
        self.remove_tree(window);
    }

    pub fn geometry(&self, window: Window) -> Option<Rect> {
        self.windows.get(&window).map(|w| w.geometry)
    }

    pub fn is_mapped(&self, window: Window) -> bool {
        self.windows.get(&window).map_or(false, |w| w.mapped)
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn count(&self, pred: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    fn is_viewable(&self, window: Window) -> bool {
        let mut current = window;
        loop {
            match self.windows.get(&current) {
                Some(w) if w.mapped => {
                    if current == ROOT {
                        return true;
                    }
                    current = w.parent;
                }
                _ => return false,
            }
        }
    }

    fn remove_tree(&mut self, window: Window) {
        let children: Vec<Window> = self
            .windows
            .iter()
            .filter(|(_, w)| w.parent == window)
            .map(|(&id, _)| id)
            .collect();
        for child in children {
            self.remove_tree(child);
        }
        self.windows.remove(&window);
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl Default for MockDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayServer for MockDisplay {
    fn root(&self) -> Window {
        ROOT
    }

    fn screen_size(&self) -> (u32, u32) {
        SCREEN
    }

    fn attributes(&self, window: Window) -> Option<WindowAttributes> {
        let w = self.windows.get(&window)?;
        Some(WindowAttributes {
            geometry: w.geometry,
            override_redirect: w.override_redirect,
            viewable: self.is_viewable(window),
        })
    }

    fn size_hint(&self, window: Window) -> Option<(u32, u32)> {
        self.windows.get(&window)?.size_hint
    }

    fn parent(&self, window: Window) -> Option<Window> {
        self.windows.get(&window).map(|w| w.parent)
    }

    fn window_type(&self, window: Window) -> WindowType {
        self.windows
            .get(&window)
            .map_or(WindowType::Normal, |w| w.window_type)
    }

    fn wants_fullscreen(&self, window: Window) -> bool {
        self.windows.get(&window).map_or(false, |w| w.wants_fullscreen)
    }

    fn supports_delete(&self, window: Window) -> bool {
        self.windows.get(&window).map_or(false, |w| w.supports_delete)
    }

    fn title(&self, window: Window) -> String {
        self.windows
            .get(&window)
            .map(|w| w.title.clone())
            .unwrap_or_default()
    }

    fn create_surface(&mut self, spec: &SurfaceSpec) -> Result<Window> {
        let window = self.allocate();
        self.windows
            .insert(window, MockWindow::new(spec.parent, spec.geometry));
        self.commands.push(Command::Create {
            window,
            role: spec.role,
            parent: spec.parent,
            geometry: spec.geometry,
        });
        Ok(window)
    }

    fn destroy(&mut self, window: Window) -> Result<()> {
        self.remove_tree(window);
        self.commands.push(Command::Destroy(window));
        Ok(())
    }

    fn map(&mut self, window: Window) -> Result<()> {
        if let Some(w) = self.windows.get_mut(&window) {
            w.mapped = true;
        }
        self.commands.push(Command::Map(window));
        Ok(())
    }

    fn unmap(&mut self, window: Window) -> Result<()> {
        if let Some(w) = self.windows.get_mut(&window) {
            w.mapped = false;
        }
        self.commands.push(Command::Unmap(window));
        Ok(())
    }

    fn configure(&mut self, window: Window, changes: &ConfigureChanges) -> Result<()> {
        if let Some(w) = self.windows.get_mut(&window) {
            let g = &mut w.geometry;
            g.x = changes.x.unwrap_or(g.x);
            g.y = changes.y.unwrap_or(g.y);
            g.width = changes.width.unwrap_or(g.width);
            g.height = changes.height.unwrap_or(g.height);
        }
        self.commands.push(Command::Configure(window, *changes));
        Ok(())
    }

    fn reparent(&mut self, window: Window, parent: Window, x: i32, y: i32) -> Result<()> {
        if self.windows.get(&window).map_or(false, |w| w.reject_reparent) {
            anyhow::bail!("BadWindow: 0x{:x}", window);
        }
        if let Some(w) = self.windows.get_mut(&window) {
            w.parent = parent;
            w.geometry = w.geometry.at(x, y);
        }
        self.commands.push(Command::Reparent { window, parent, x, y });
        Ok(())
    }

    fn raise(&mut self, window: Window) -> Result<()> {
        self.commands.push(Command::Raise(window));
        Ok(())
    }

    fn watch_client(&mut self, window: Window) -> Result<()> {
        self.commands.push(Command::WatchClient(window));
        Ok(())
    }

    fn watch_undecorated(&mut self, window: Window) -> Result<()> {
        self.commands.push(Command::WatchUndecorated(window));
        Ok(())
    }

    fn focus(&mut self, window: Window) -> Result<()> {
        self.commands.push(Command::Focus(window));
        Ok(())
    }

    fn grab_pointer(&mut self, window: Window, cursor: GrabCursor) -> Result<()> {
        self.commands.push(Command::GrabPointer(window, cursor));
        Ok(())
    }

    fn ungrab_pointer(&mut self) -> Result<()> {
        self.commands.push(Command::UngrabPointer);
        Ok(())
    }

    fn send_configure_notify(&mut self, window: Window, geometry: Rect) -> Result<()> {
        self.commands.push(Command::ConfigureNotify(window, geometry));
        Ok(())
    }

    fn send_delete(&mut self, window: Window) -> Result<()> {
        self.commands.push(Command::SendDelete(window));
        Ok(())
    }

    fn create_drawing_context(
        &mut self,
        window: Window,
        _foreground: u32,
        _background: u32,
    ) -> Result<Gcontext> {
        let gc = self.allocate();
        self.commands.push(Command::CreateGc(window));
        Ok(gc)
    }

    fn free_drawing_context(&mut self, gc: Gcontext) -> Result<()> {
        self.commands.push(Command::FreeGc(gc));
        Ok(())
    }

    fn draw_title(&mut self, window: Window, _gc: Gcontext, text: &str) -> Result<()> {
        self.commands.push(Command::DrawTitle(window, text.to_string()));
        Ok(())
    }

    fn publish_client_list(&mut self, clients: &[Window]) -> Result<()> {
        self.commands.push(Command::ClientList(clients.to_vec()));
        Ok(())
    }

    fn publish_current_desktop(&mut self, index: u32) -> Result<()> {
        self.commands.push(Command::CurrentDesktop(index));
        Ok(())
    }

    fn publish_window_desktop(&mut self, window: Window, index: u32) -> Result<()> {
        self.commands.push(Command::WindowDesktop(window, index));
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A manager over a fresh mock display with the default configuration
pub fn test_wm() -> Wm<MockDisplay> {
    let keybindings = Config::default().parse_keybindings();
    Wm::new(MockDisplay::new(), LayoutConfig::default(), keybindings)
}

/// Script a client and run it through the map-request path
pub fn map_client(wm: &mut Wm<MockDisplay>, window: Window, geometry: Rect) {
    wm.display_mut().add_client(window, geometry);
    wm.handle_notification(crate::event::Notification::MapRequest { window })
        .unwrap();
}
