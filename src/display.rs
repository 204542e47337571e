//! The seam between the window manager and the display server.
//!
//! Everything the frame logic needs from the server goes through
//! [`DisplayServer`]: a handful of synchronous queries and a set of
//! commands. The X11 implementation lives in `x11.rs`; tests drive the
//! same logic through a recording mock.

use anyhow::Result;
use x11rb::protocol::xproto::{Gcontext, Window};

use crate::types::Rect;

/// What the manager needs to know about a window before deciding what to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAttributes {
    /// Position relative to the parent and inner size
    pub geometry: Rect,
    pub override_redirect: bool,
    /// Mapped with all ancestors mapped
    pub viewable: bool,
}

/// Coarse `_NET_WM_WINDOW_TYPE` classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowType {
    /// Also used when the property is absent
    Normal,
    Dialog,
    Utility,
    Other,
}

impl WindowType {
    /// Whether windows of this type get a frame
    pub fn is_decorated(self) -> bool {
        matches!(self, WindowType::Normal | WindowType::Dialog)
    }
}

/// Kind of manager-owned window, which decides its event mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceRole {
    Decoration,
    TitleBar,
    TitleText,
    Button,
}

/// Everything needed to create a decoration sub-window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSpec {
    pub role: SurfaceRole,
    pub parent: Window,
    pub geometry: Rect,
    pub border_width: u32,
    pub border_color: u32,
    pub background: u32,
}

/// Cursor shown during an interactive grab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabCursor {
    Move,
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restack {
    Above,
    Below,
    TopIf,
    BottomIf,
    Opposite,
}

/// A partial configure: only the `Some` fields are sent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigureChanges {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub border_width: Option<u32>,
    pub sibling: Option<Window>,
    pub stack_mode: Option<Restack>,
}

impl ConfigureChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, x: i32, y: i32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        // The server rejects zero-sized windows
        self.width = Some(width.max(1));
        self.height = Some(height.max(1));
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width.max(1));
        self
    }
}

/// Display server operations used by the window manager.
///
/// Queries return `None` when the window is gone; commands return an error
/// only when the connection itself fails.
pub trait DisplayServer {
    fn root(&self) -> Window;

    /// Screen width and height in pixels
    fn screen_size(&self) -> (u32, u32);

    /// True if the window still exists on the server
    fn is_alive(&self, window: Window) -> bool {
        self.attributes(window).is_some()
    }

    fn attributes(&self, window: Window) -> Option<WindowAttributes>;

    /// Program-specified size from WM_NORMAL_HINTS, if declared
    fn size_hint(&self, window: Window) -> Option<(u32, u32)>;

    fn parent(&self, window: Window) -> Option<Window>;

    fn window_type(&self, window: Window) -> WindowType;

    /// Whether `_NET_WM_STATE` currently lists fullscreen
    fn wants_fullscreen(&self, window: Window) -> bool;

    /// Whether WM_PROTOCOLS includes WM_DELETE_WINDOW
    fn supports_delete(&self, window: Window) -> bool;

    fn title(&self, window: Window) -> String;

    /// Create a decoration sub-window. It is not mapped.
    fn create_surface(&mut self, spec: &SurfaceSpec) -> Result<Window>;

    fn destroy(&mut self, window: Window) -> Result<()>;

    fn map(&mut self, window: Window) -> Result<()>;

    fn unmap(&mut self, window: Window) -> Result<()>;

    fn configure(&mut self, window: Window, changes: &ConfigureChanges) -> Result<()>;

    fn reparent(&mut self, window: Window, parent: Window, x: i32, y: i32) -> Result<()>;

    fn raise(&mut self, window: Window) -> Result<()>;

    /// Select the events a framed client must report
    fn watch_client(&mut self, window: Window) -> Result<()>;

    /// Select the events an undecorated top-level must report
    fn watch_undecorated(&mut self, window: Window) -> Result<()>;

    fn focus(&mut self, window: Window) -> Result<()>;

    fn grab_pointer(&mut self, window: Window, cursor: GrabCursor) -> Result<()>;

    fn ungrab_pointer(&mut self) -> Result<()>;

    /// Tell the client its geometry without a real configure
    fn send_configure_notify(&mut self, window: Window, geometry: Rect) -> Result<()>;

    /// Ask the client to close through WM_DELETE_WINDOW
    fn send_delete(&mut self, window: Window) -> Result<()>;

    fn create_drawing_context(
        &mut self,
        window: Window,
        foreground: u32,
        background: u32,
    ) -> Result<Gcontext>;

    fn free_drawing_context(&mut self, gc: Gcontext) -> Result<()>;

    /// Clear `window` and draw `text` into it
    fn draw_title(&mut self, window: Window, gc: Gcontext, text: &str) -> Result<()>;

    fn publish_client_list(&mut self, clients: &[Window]) -> Result<()>;

    fn publish_current_desktop(&mut self, index: u32) -> Result<()>;

    fn publish_window_desktop(&mut self, window: Window, index: u32) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    fn move_to(&mut self, window: Window, x: i32, y: i32) -> Result<()> {
        self.configure(window, &ConfigureChanges::new().position(x, y))
    }

    fn resize(&mut self, window: Window, width: u32, height: u32) -> Result<()> {
        self.configure(window, &ConfigureChanges::new().size(width, height))
    }
}
