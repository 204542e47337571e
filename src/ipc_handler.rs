//! IPC command handling for the window manager.
//!
//! Contains the handler for all IPC commands from framewmctl and the
//! integration tests.

use std::collections::HashSet;

use anyhow::Result;

use crate::display::DisplayServer;
use crate::ipc::{FrameInfo, IpcCommand, IpcResponse, WmStateSnapshot};
use crate::state::{StateViolation, ViolationKind};
use crate::workspaces::Workspaces;
use crate::wm::Wm;

impl<D: DisplayServer> Wm<D> {
    /// Serve at most one pending IPC request
    pub fn poll_ipc(&mut self) {
        let request = match &self.ipc {
            Some(server) => server.poll(),
            None => return,
        };
        if let Some((cmd, mut client)) = request {
            let response = self.handle_ipc(cmd);
            if let Err(e) = client.respond(response) {
                log::warn!("Failed to send IPC response: {}", e);
            }
        }
    }

    /// Handle an IPC command and return a response
    pub fn handle_ipc(&mut self, cmd: IpcCommand) -> IpcResponse {
        log::debug!("Handling IPC command: {:?}", cmd);
        let cmd_name = format!("{:?}", cmd);

        let response = match cmd {
            IpcCommand::GetState => IpcResponse::State {
                data: self.snapshot_state(),
            },
            IpcCommand::GetFrames => IpcResponse::Frames {
                data: self.frame_info_list(),
            },
            IpcCommand::GetClientList => IpcResponse::ClientList {
                windows: self.ledger.windows().to_vec(),
            },
            IpcCommand::ValidateState => {
                let violations: Vec<String> = self
                    .validate_state()
                    .into_iter()
                    .map(|v| v.description)
                    .collect();
                IpcResponse::Validation {
                    valid: violations.is_empty(),
                    violations,
                }
            }
            IpcCommand::GetEventLog { count } => IpcResponse::EventLog {
                entries: self.tracer.recent(count.unwrap_or(usize::MAX)),
            },
            IpcCommand::SwitchWorkspace { index } => {
                if !Workspaces::is_valid(index) {
                    return self.traced(
                        &cmd_name,
                        error("invalid_workspace", format!("No workspace {}", index)),
                    );
                }
                into_response("switch_failed", self.switch_workspace(index))
            }
            IpcCommand::Close { window } => match self.frames.find_by_client(window) {
                Some(id) => into_response("close_failed", self.close_frame(id)),
                None => not_managed(window),
            },
            IpcCommand::ToggleFullscreen { window } => match self.frames.find_by_client(window) {
                Some(id) => {
                    let fullscreen = self.frames.get(id).map_or(false, |f| f.is_fullscreen());
                    into_response("fullscreen_failed", self.set_fullscreen(id, !fullscreen))
                }
                None => not_managed(window),
            },
            IpcCommand::Quit => {
                log::info!("Quit requested via IPC");
                self.running = false;
                IpcResponse::Ok
            }
        };

        self.traced(&cmd_name, response)
    }

    fn traced(&mut self, cmd_name: &str, response: IpcResponse) -> IpcResponse {
        let status = match &response {
            IpcResponse::Ok => "ok",
            IpcResponse::Error { .. } => "error",
            _ => "success",
        };
        self.tracer.trace_ipc(cmd_name, status);
        response
    }

    /// Create a snapshot of the current WM state for IPC
    fn snapshot_state(&self) -> WmStateSnapshot {
        WmStateSnapshot {
            current_workspace: self.workspaces.current_index(),
            frame_count: self.frames.len(),
            client_list: self.ledger.windows().to_vec(),
            grab_active: self.grab.is_some(),
            frames: self.frame_info_list(),
        }
    }

    /// One entry per frame, in client-list order
    fn frame_info_list(&self) -> Vec<FrameInfo> {
        self.ledger
            .windows()
            .iter()
            .filter_map(|&client| self.frames.find_by_client(client))
            .filter_map(|id| self.frames.get(id))
            .map(|frame| {
                let attrs = self.display.attributes(frame.decoration);
                FrameInfo {
                    client: frame.client,
                    decoration: frame.decoration,
                    title: self.display.title(frame.client),
                    workspace: frame.workspace,
                    fullscreen: frame.is_fullscreen(),
                    visible: attrs.map_or(false, |a| a.viewable),
                    geometry: attrs.map(|a| a.geometry),
                }
            })
            .collect()
    }

    /// Check that the registry, the ledger and the workspace tags agree
    pub fn validate_state(&self) -> Vec<StateViolation> {
        let mut violations = Vec::new();
        let mut report = |kind, description: String| {
            violations.push(StateViolation { kind, description });
        };

        for (_, frame) in self.frames.iter() {
            if !self.ledger.contains(frame.client) {
                report(
                    ViolationKind::ClientNotListed,
                    format!("Framed client 0x{:x} is not in the client list", frame.client),
                );
            }
            if !Workspaces::is_valid(frame.workspace) {
                report(
                    ViolationKind::WorkspaceOutOfRange,
                    format!(
                        "Client 0x{:x} is tagged with workspace {}",
                        frame.client, frame.workspace
                    ),
                );
            }
            if !self.display.is_alive(frame.decoration) {
                report(
                    ViolationKind::GhostFrame,
                    format!(
                        "Decoration 0x{:x} of client 0x{:x} no longer exists",
                        frame.decoration, frame.client
                    ),
                );
            }
        }

        if !Workspaces::is_valid(self.workspaces.current_index()) {
            report(
                ViolationKind::WorkspaceOutOfRange,
                format!("Active workspace {} is out of range", self.workspaces.current_index()),
            );
        }

        let mut seen = HashSet::new();
        for &client in self.ledger.windows() {
            if !seen.insert(client) {
                report(
                    ViolationKind::DuplicateListing,
                    format!("Client 0x{:x} is listed twice", client),
                );
            }
            if self.frames.find_by_client(client).is_none() {
                report(
                    ViolationKind::ListedWithoutFrame,
                    format!("Listed client 0x{:x} has no frame", client),
                );
            }
        }

        if let Some(grab) = self.grab {
            if !self.frames.contains(grab.frame) {
                report(
                    ViolationKind::StaleGrab,
                    format!("Pointer grab targets removed frame {:?}", grab.frame),
                );
            }
        }

        violations
    }
}

fn error(code: &str, message: String) -> IpcResponse {
    IpcResponse::Error {
        code: code.to_string(),
        message,
    }
}

fn not_managed(window: u32) -> IpcResponse {
    error("not_managed", format!("Window 0x{:x} is not managed", window))
}

fn into_response(code: &str, result: Result<()>) -> IpcResponse {
    match result {
        Ok(()) => IpcResponse::Ok,
        Err(e) => error(code, e.to_string()),
    }
}
