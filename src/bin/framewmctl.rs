//! framewmctl - command-line interface to a running framewm
//!
//! Sends one JSON command over the window manager's Unix socket and prints
//! the JSON response.
//!
//! ```bash
//! framewmctl state
//! framewmctl frames
//! framewmctl workspace 3
//! framewmctl fullscreen 0x1a00007
//! framewmctl validate
//! ```

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

/// Socket path for this display; must match the window manager's
fn socket_path() -> PathBuf {
    let display = std::env::var("DISPLAY").unwrap_or_else(|_| ":0".to_string());
    let sanitized = display.replace([':', '.'], "_");
    PathBuf::from(format!("/tmp/framewm{}.sock", sanitized))
}

/// framewmctl - Control the framewm window manager
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Socket path (default: /tmp/framewm_$DISPLAY.sock)
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    /// Output raw JSON without pretty-printing
    #[arg(long, global = true)]
    raw: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Full WM state as JSON
    State,

    /// Every frame with its geometry
    Frames,

    /// The published client list
    Clients,

    /// Check registry, client list and workspace consistency
    Validate,

    /// Recent event log
    Events {
        /// Number of events to retrieve
        #[arg(short, long)]
        count: Option<usize>,
    },

    /// Switch to a workspace (1-9)
    Workspace {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=9))]
        number: u8,
    },

    /// Close a managed window
    Close {
        /// Client window ID (decimal or hex with 0x prefix)
        #[arg(value_parser = parse_window_id)]
        window: u32,
    },

    /// Toggle fullscreen on a managed window
    Fullscreen {
        /// Client window ID (decimal or hex with 0x prefix)
        #[arg(value_parser = parse_window_id)]
        window: u32,
    },

    /// Quit the window manager
    Quit,
}

impl Commands {
    fn to_json(&self) -> Value {
        match self {
            Commands::State => json!({"command": "get_state"}),
            Commands::Frames => json!({"command": "get_frames"}),
            Commands::Clients => json!({"command": "get_client_list"}),
            Commands::Validate => json!({"command": "validate_state"}),
            Commands::Events { count } => json!({"command": "get_event_log", "count": count}),
            Commands::Workspace { number } => {
                json!({"command": "switch_workspace", "index": number - 1})
            }
            Commands::Close { window } => json!({"command": "close", "window": window}),
            Commands::Fullscreen { window } => {
                json!({"command": "toggle_fullscreen", "window": window})
            }
            Commands::Quit => json!({"command": "quit"}),
        }
    }
}

fn parse_window_id(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|_| format!("invalid window ID: {}", s))
}

fn main() {
    let cli = Cli::parse();
    let socket_path = cli.socket.unwrap_or_else(socket_path);

    if let Err(e) = send_command(&socket_path, &cli.command.to_json(), cli.raw) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn send_command(socket_path: &Path, command: &Value, raw: bool) -> std::io::Result<()> {
    let mut stream = UnixStream::connect(socket_path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!(
                "Failed to connect to framewm at {:?}: {}. Is framewm running?",
                socket_path, e
            ),
        )
    })?;
    stream.set_read_timeout(Some(Duration::from_secs(10)))?;
    stream.set_write_timeout(Some(Duration::from_secs(5)))?;

    writeln!(stream, "{}", serde_json::to_string(command)?)?;
    stream.flush()?;

    let mut response = String::new();
    BufReader::new(&stream).read_line(&mut response)?;
    let value: Value = serde_json::from_str(&response).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Invalid JSON response: {}", e),
        )
    })?;

    if value.get("status").and_then(Value::as_str) == Some("error") {
        let code = value.get("code").and_then(Value::as_str).unwrap_or("unknown");
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error");
        eprintln!("Error [{}]: {}", code, message);
        std::process::exit(1);
    }

    if raw {
        println!("{}", response.trim());
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
