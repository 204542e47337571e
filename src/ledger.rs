//! Client window ledger, published as `_NET_CLIENT_LIST`.

use x11rb::protocol::xproto::Window;

/// Managed clients in management order, without duplicates.
#[derive(Debug, Clone, Default)]
pub struct ClientLedger {
    windows: Vec<Window>,
}

impl ClientLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a client. Returns false if it was already listed.
    pub fn add(&mut self, window: Window) -> bool {
        if self.windows.contains(&window) {
            return false;
        }
        self.windows.push(window);
        true
    }

    /// Remove a client, keeping the order of the rest. Returns false if absent.
    pub fn remove(&mut self, window: Window) -> bool {
        match self.windows.iter().position(|&w| w == window) {
            Some(pos) => {
                self.windows.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, window: Window) -> bool {
        self.windows.contains(&window)
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }
}
