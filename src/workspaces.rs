//! Workspace (virtual desktop) management.
//!
//! Every frame carries the workspace tag it was created on. Switching
//! workspaces maps the decorations tagged with the new workspace and unmaps
//! all others; frames never move between workspaces.

use anyhow::Result;

use crate::display::DisplayServer;
use crate::state::StateTransition;
use crate::wm::Wm;

/// Number of workspaces (virtual desktops)
pub const NUM_WORKSPACES: usize = 9;

/// The active workspace
#[derive(Debug, Clone, Copy, Default)]
pub struct Workspaces {
    /// Index of the current workspace (0-8)
    current: usize,
}

impl Workspaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn is_valid(index: usize) -> bool {
        index < NUM_WORKSPACES
    }

    fn set_current(&mut self, index: usize) {
        self.current = index;
    }

    /// Names published as `_NET_DESKTOP_NAMES`: "1" through "9"
    pub fn names() -> Vec<String> {
        (1..=NUM_WORKSPACES).map(|n| n.to_string()).collect()
    }
}

impl<D: DisplayServer> Wm<D> {
    /// Make `target` the active workspace.
    ///
    /// The new index is published first, then every decoration is shown or
    /// hidden, and the active index changes last. Switching to the current
    /// workspace re-applies visibility.
    pub fn switch_workspace(&mut self, target: usize) -> Result<()> {
        if !Workspaces::is_valid(target) {
            log::warn!("Ignoring switch to out-of-range workspace {}", target);
            return Ok(());
        }

        let from = self.workspaces.current_index();
        log::info!("Switching from workspace {} to {}", from + 1, target + 1);
        self.display.publish_current_desktop(target as u32)?;

        let targets: Vec<_> = self
            .frames
            .iter()
            .map(|(_, f)| (f.decoration, f.client, f.workspace == target))
            .collect();
        for (decoration, client, on_target) in targets {
            if on_target && self.display.is_alive(client) {
                self.display.map(decoration)?;
            } else {
                self.display.unmap(decoration)?;
            }
        }

        self.workspaces.set_current(target);
        self.trace(StateTransition::WorkspaceSwitched { from, to: target });
        Ok(())
    }
}
