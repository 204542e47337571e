//! Client property queries.
//!
//! Stateless functions over a connection. A window that disappears
//! mid-query yields the same answer as one without the property.

use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

use crate::display::WindowType;
use crate::ewmh::Atoms;

/// WM_NORMAL_HINTS flag: user-specified size
const US_SIZE: u32 = 1 << 1;
/// WM_NORMAL_HINTS flag: program-specified size
const P_SIZE: u32 = 1 << 3;

/// Fetch a property as 32-bit values; empty if absent or unreadable
fn property32(
    conn: &impl Connection,
    window: Window,
    property: Atom,
    type_: impl Into<Atom>,
) -> Vec<u32> {
    conn.get_property(false, window, property, type_, 0, 1024)
        .ok()
        .and_then(|cookie| cookie.reply().ok())
        .and_then(|reply| reply.value32().map(|v| v.collect()))
        .unwrap_or_default()
}

fn property_string(
    conn: &impl Connection,
    window: Window,
    property: Atom,
    type_: impl Into<Atom>,
) -> Option<String> {
    let reply = conn
        .get_property(false, window, property, type_, 0, 1024)
        .ok()?
        .reply()
        .ok()?;
    if reply.value.is_empty() {
        return None;
    }
    String::from_utf8(reply.value).ok()
}

/// Window title from _NET_WM_NAME, falling back to WM_NAME. Empty if unset.
pub fn get_window_title(conn: &impl Connection, atoms: &Atoms, window: Window) -> String {
    property_string(conn, window, atoms.net_wm_name, atoms.utf8_string)
        .or_else(|| property_string(conn, window, AtomEnum::WM_NAME.into(), AtomEnum::STRING))
        .unwrap_or_default()
}

/// First recognised entry of _NET_WM_WINDOW_TYPE; Normal when absent
pub fn get_window_type(conn: &impl Connection, atoms: &Atoms, window: Window) -> WindowType {
    let types = property32(conn, window, atoms.net_wm_window_type, AtomEnum::ATOM);
    match types.first() {
        None => WindowType::Normal,
        Some(&t) if t == atoms.net_wm_window_type_normal => WindowType::Normal,
        Some(&t) if t == atoms.net_wm_window_type_dialog => WindowType::Dialog,
        Some(&t) if t == atoms.net_wm_window_type_utility => WindowType::Utility,
        Some(_) => WindowType::Other,
    }
}

/// Whether _NET_WM_STATE lists _NET_WM_STATE_FULLSCREEN
pub fn is_fullscreen_requested(conn: &impl Connection, atoms: &Atoms, window: Window) -> bool {
    property32(conn, window, atoms.net_wm_state, AtomEnum::ATOM)
        .contains(&atoms.net_wm_state_fullscreen)
}

/// Check if a window supports the WM_DELETE_WINDOW protocol.
pub fn supports_delete_protocol(conn: &impl Connection, atoms: &Atoms, window: Window) -> bool {
    property32(conn, window, atoms.wm_protocols, AtomEnum::ATOM).contains(&atoms.wm_delete_window)
}

/// Size from WM_NORMAL_HINTS when the client declared one
pub fn get_size_hint(conn: &impl Connection, window: Window) -> Option<(u32, u32)> {
    let hints = property32(
        conn,
        window,
        AtomEnum::WM_NORMAL_HINTS.into(),
        AtomEnum::WM_SIZE_HINTS,
    );
    let flags = *hints.first()?;
    if flags & (P_SIZE | US_SIZE) == 0 || hints.len() < 5 {
        return None;
    }
    Some((hints[3], hints[4]))
}

/// Send WM_DELETE_WINDOW client message to request graceful close.
pub fn send_delete_window(conn: &impl Connection, atoms: &Atoms, window: Window) -> Result<()> {
    let data = ClientMessageData::from([
        atoms.wm_delete_window,
        x11rb::CURRENT_TIME,
        0u32,
        0u32,
        0u32,
    ]);
    let event = ClientMessageEvent {
        response_type: CLIENT_MESSAGE_EVENT,
        format: 32,
        sequence: 0,
        window,
        type_: atoms.wm_protocols,
        data,
    };
    conn.send_event(false, window, EventMask::NO_EVENT, event)?;
    Ok(())
}
