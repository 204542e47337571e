//! The window manager context.
//!
//! `Wm` owns every piece of mutable state: the frame registry, the client
//! ledger, the workspace state and the transient pointer grab. Its behaviour
//! is spread over several files (`lifecycle.rs`, `event.rs`,
//! `workspaces.rs`, `ipc_handler.rs`), each adding an `impl` block.

use std::collections::HashMap;

use anyhow::Result;
use x11rb::protocol::xproto::Window;

use crate::config::{LayoutConfig, ParsedBinding, WmAction};
use crate::display::DisplayServer;
use crate::frame::FrameId;
use crate::ipc::IpcServer;
use crate::ledger::ClientLedger;
use crate::registry::FrameRegistry;
use crate::state::StateTransition;
use crate::tracing::EventTracer;
use crate::types::Rect;
use crate::workspaces::Workspaces;

/// Interactive operation started by a pointer press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabKind {
    Move,
    Resize,
}

impl GrabKind {
    pub fn name(self) -> &'static str {
        match self {
            GrabKind::Move => "move",
            GrabKind::Resize => "resize",
        }
    }
}

/// An in-progress move or resize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grab {
    pub frame: FrameId,
    pub kind: GrabKind,
    /// Pointer position at the press, root coordinates
    pub start_x: i32,
    pub start_y: i32,
    /// Decoration geometry at the press
    pub origin: Rect,
}

pub struct Wm<D: DisplayServer> {
    pub(crate) display: D,
    pub(crate) config: LayoutConfig,
    pub(crate) frames: FrameRegistry,
    pub(crate) ledger: ClientLedger,
    pub(crate) workspaces: Workspaces,
    pub(crate) grab: Option<Grab>,
    /// Parsed keybindings (action -> binding)
    pub(crate) keybindings: HashMap<WmAction, ParsedBinding>,
    pub(crate) running: bool,
    pub(crate) ipc: Option<IpcServer>,
    pub(crate) tracer: EventTracer,
}

impl<D: DisplayServer> Wm<D> {
    pub fn new(
        display: D,
        config: LayoutConfig,
        keybindings: HashMap<WmAction, ParsedBinding>,
    ) -> Self {
        Self {
            display,
            config,
            frames: FrameRegistry::new(),
            ledger: ClientLedger::new(),
            workspaces: Workspaces::new(),
            grab: None,
            keybindings,
            running: true,
            ipc: None,
            tracer: EventTracer::new(),
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_ipc(&mut self, ipc: IpcServer) {
        self.ipc = Some(ipc);
    }

    /// Add a client to the ledger and republish it
    pub(crate) fn ledger_add(&mut self, client: Window) -> Result<()> {
        if self.ledger.add(client) {
            self.display.publish_client_list(self.ledger.windows())?;
        }
        Ok(())
    }

    /// Drop a client from the ledger and republish it
    pub(crate) fn ledger_remove(&mut self, client: Window) -> Result<()> {
        if self.ledger.remove(client) {
            self.display.publish_client_list(self.ledger.windows())?;
        }
        Ok(())
    }

    /// Raise a frame and give its client the input focus
    pub(crate) fn focus_frame(&mut self, id: FrameId) -> Result<()> {
        let (decoration, client) = match self.frames.get(id) {
            Some(frame) => (frame.decoration, frame.client),
            None => return Ok(()),
        };
        self.display.raise(decoration)?;
        self.display.focus(client)?;
        Ok(())
    }

    pub(crate) fn trace(&mut self, transition: StateTransition) {
        self.tracer.trace_transition(&transition);
    }

    /// Run a bound action
    pub(crate) fn execute_action(&mut self, action: WmAction) -> Result<()> {
        match action {
            WmAction::Spawn(command) => crate::spawn::launch_program(&command),
            WmAction::SwitchWorkspace(index) => self.switch_workspace(index)?,
            WmAction::Quit => {
                log::info!("Quitting window manager");
                self.running = false;
            }
        }
        Ok(())
    }
}
