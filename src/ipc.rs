//! IPC interface for inspecting and driving framewm.
//!
//! A Unix socket server that accepts one JSON command per connection and
//! answers with one JSON response. `framewmctl` is the command-line client;
//! the integration tests use the same protocol.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Rect;

/// Socket path for the current display
pub fn socket_path() -> PathBuf {
    let display = std::env::var("DISPLAY").unwrap_or_else(|_| ":0".to_string());
    socket_path_for(&display)
}

fn socket_path_for(display: &str) -> PathBuf {
    let sanitized = display.replace([':', '.'], "_");
    PathBuf::from(format!("/tmp/framewm{}.sock", sanitized))
}

/// Commands that can be sent to the WM via IPC
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum IpcCommand {
    // Queries
    /// Full state snapshot
    GetState,
    /// Every frame with its geometry
    GetFrames,
    /// The published client list, in order
    GetClientList,
    /// Check registry, ledger and workspace consistency
    ValidateState,
    /// Recent event log
    GetEventLog {
        #[serde(default)]
        count: Option<usize>,
    },

    // Actions
    /// Switch to a workspace (0-based)
    SwitchWorkspace { index: usize },
    /// Close a managed client the way its close button would
    Close { window: u32 },
    /// Toggle fullscreen on a managed client
    ToggleFullscreen { window: u32 },

    // Control
    Quit,
}

/// Responses from the WM
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IpcResponse {
    /// Operation succeeded with no data
    Ok,
    State { data: WmStateSnapshot },
    Frames { data: Vec<FrameInfo> },
    ClientList { windows: Vec<u32> },
    Validation {
        valid: bool,
        violations: Vec<String>,
    },
    EventLog { entries: Vec<EventLogEntry> },
    Error { code: String, message: String },
}

/// Snapshot of the full WM state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WmStateSnapshot {
    pub current_workspace: usize,
    pub frame_count: usize,
    pub client_list: Vec<u32>,
    pub grab_active: bool,
    pub frames: Vec<FrameInfo>,
}

/// Information about one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameInfo {
    pub client: u32,
    pub decoration: u32,
    pub title: String,
    pub workspace: usize,
    pub fullscreen: bool,
    pub visible: bool,
    /// Decoration geometry, absent if the server no longer knows the window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Rect>,
}

/// Entry in the event log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub sequence: u64,
    pub timestamp_ms: u64,
    pub event_type: String,
    pub window: Option<u32>,
    pub details: String,
}

/// Non-blocking listener on the per-display socket
pub struct IpcServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

/// How long a connected client may stall before it is dropped
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

impl IpcServer {
    /// Bind the socket for this display, replacing a stale one
    pub fn bind() -> std::io::Result<Self> {
        let socket_path = socket_path();
        match std::fs::remove_file(&socket_path) {
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(e),
            _ => {}
        }

        let listener = UnixListener::bind(&socket_path)?;
        listener.set_nonblocking(true)?;
        log::info!("IPC listening on {:?}", socket_path);

        Ok(Self {
            listener,
            socket_path,
        })
    }

    /// Accept at most one pending connection and read its command. Never
    /// blocks the event loop for longer than the client timeout.
    pub fn poll(&self) -> Option<(IpcCommand, IpcClient)> {
        let stream = match self.listener.accept() {
            Ok((stream, _)) => stream,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return None,
            Err(e) => {
                log::warn!("IPC accept failed: {}", e);
                return None;
            }
        };

        match read_request(stream) {
            Ok(request) => request,
            Err(e) if e.kind() == ErrorKind::WouldBlock => None,
            Err(e) => {
                log::warn!("IPC client dropped: {}", e);
                None
            }
        }
    }
}

/// Read one line from a fresh connection. A malformed command is answered
/// with a `parse_error` here and yields `None`.
fn read_request(stream: UnixStream) -> std::io::Result<Option<(IpcCommand, IpcClient)>> {
    stream.set_read_timeout(Some(CLIENT_TIMEOUT))?;
    stream.set_write_timeout(Some(CLIENT_TIMEOUT))?;

    let mut line = String::new();
    if BufReader::new(&stream).read_line(&mut line)? == 0 {
        return Ok(None);
    }

    let mut client = IpcClient { stream };
    match serde_json::from_str::<IpcCommand>(&line) {
        Ok(cmd) => Ok(Some((cmd, client))),
        Err(e) => {
            log::warn!("Rejecting IPC request {:?}: {}", line.trim_end(), e);
            client.respond(IpcResponse::Error {
                code: "parse_error".to_string(),
                message: e.to_string(),
            })?;
            Ok(None)
        }
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            log::debug!("Socket {:?} already gone: {}", self.socket_path, e);
        }
    }
}

/// The connection a command arrived on; consumed by one response
pub struct IpcClient {
    stream: UnixStream,
}

impl IpcClient {
    pub fn respond(&mut self, response: IpcResponse) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(&response)?;
        line.push(b'\n');
        self.stream.write_all(&line)?;
        self.stream.flush()
    }
}
