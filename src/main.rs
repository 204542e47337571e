//! framewm - a floating, reparenting X11 window manager
//!
//! Every top-level client is wrapped in a decorated frame with a title bar
//! and close, maximize and split buttons. Frames are moved with Mod4+Button1
//! and resized with Mod4+Button3; Mod4+1..9 switches between nine
//! workspaces.

mod config;
mod display;
mod event;
mod ewmh;
mod frame;
mod ipc;
mod ipc_handler;
mod ledger;
mod lifecycle;
#[cfg(test)]
mod mock;
mod registry;
mod render;
mod spawn;
mod state;
mod tracing;
mod types;
mod window_query;
mod wm;
mod workspaces;
mod x11;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use config::{Config, LayoutConfig};
use display::DisplayServer;
use ipc::IpcServer;
use wm::Wm;
use x11::X11Display;

/// Idle sleep between polls when neither X11 nor IPC has work
const IDLE_SLEEP: Duration = Duration::from_millis(10);

/// framewm - floating window manager with decorated frames
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (default: ~/.config/framewm/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Do not listen on the IPC socket
    #[arg(long)]
    no_ipc: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    log::info!("Starting framewm");

    let config = match args.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };
    let layout = LayoutConfig::from_config(&config);
    let keybindings = config.parse_keybindings();

    spawn::reap_children_automatically();

    let mut display = X11Display::connect(&layout)?;
    display.become_wm()?;
    display.setup_ewmh()?;
    display.grab_keys(&keybindings)?;
    display.grab_buttons()?;
    let existing = display.top_level_windows()?;

    let mut wm = Wm::new(display, layout, keybindings);

    if !args.no_ipc {
        match IpcServer::bind() {
            Ok(server) => wm.set_ipc(server),
            Err(e) => log::warn!("IPC disabled: {}", e),
        }
    }

    wm.adopt_windows(&existing);
    if let Err(e) = wm.display_mut().flush() {
        log::error!("Failed to flush after adopting windows: {}", e);
    }

    run(&mut wm);

    wm.display_mut().shutdown()?;
    log::info!("Exiting window manager");
    Ok(())
}

/// Main event loop: serve IPC, drain X11 events, sleep when idle
fn run(wm: &mut Wm<X11Display>) {
    log::info!("Entering event loop");

    while wm.is_running() {
        wm.poll_ipc();

        let mut handled = false;
        loop {
            match wm.display().poll_event() {
                Ok(Some(event)) => {
                    handled = true;
                    let Some(notification) = wm.display().translate(&event) else {
                        continue;
                    };
                    if let Err(e) = wm.handle_notification(notification) {
                        log::error!("Error handling {:?}: {}", notification, e);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    log::error!("Lost connection to X11 server: {}", e);
                    return;
                }
            }
        }

        if let Err(e) = wm.display_mut().flush() {
            log::error!("Failed to flush X11 requests: {}", e);
        }

        if !handled {
            std::thread::sleep(IDLE_SLEEP);
        }
    }
}
