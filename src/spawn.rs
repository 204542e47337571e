//! Launching helper programs (terminal, launcher) from key bindings.

use std::os::unix::process::CommandExt;
use std::process::Command;

/// Build the command for a binding string: `~` expanded, split on whitespace.
fn build_command(command: &str) -> Option<Command> {
    let expanded = shellexpand::tilde(command);
    let parts: Vec<&str> = expanded.split_whitespace().collect();
    let (program, args) = parts.split_first()?;

    let mut cmd = Command::new(program);
    cmd.args(args);
    Some(cmd)
}

/// Build `command` so it runs in its own session with default SIGCHLD
/// handling. The manager ignores SIGCHLD and that disposition survives exec.
fn detached_command(command: &str) -> Option<Command> {
    let mut cmd = build_command(command)?;
    unsafe {
        cmd.pre_exec(|| {
            libc::setsid();
            libc::signal(libc::SIGCHLD, libc::SIG_DFL);
            Ok(())
        });
    }
    Some(cmd)
}

/// Start `command` detached from the window manager. Failure is logged only.
pub fn launch_program(command: &str) {
    let mut cmd = match detached_command(command) {
        Some(cmd) => cmd,
        None => {
            log::warn!("Ignoring empty command binding");
            return;
        }
    };

    match cmd.spawn() {
        Ok(child) => log::info!("Launched '{}' (pid {})", command, child.id()),
        Err(e) => log::error!("Failed to launch '{}': {}", command, e),
    }
}

/// Let the kernel reap launched programs so they never linger as zombies.
pub fn reap_children_automatically() {
    unsafe {
        libc::signal(libc::SIGCHLD, libc::SIG_IGN);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::process::Stdio;

    use super::*;

    #[test]
    fn test_build_command_splits_arguments() {
        let cmd = build_command("xterm -e top").unwrap();
        assert_eq!(cmd.get_program(), "xterm");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["-e", "top"]);
    }

    #[test]
    fn test_build_command_expands_tilde() {
        let cmd = build_command("~/bin/launcher").unwrap();
        let program = cmd.get_program().to_string_lossy().into_owned();
        if dirs::home_dir().is_some() {
            assert!(!program.starts_with('~'));
        }
        assert!(program.ends_with("/bin/launcher"));
    }

    #[test]
    fn test_empty_command() {
        assert!(build_command("   ").is_none());
        assert!(detached_command("").is_none());
    }

    /// SigIgn mask of a launched program, read from its /proc status
    fn child_ignored_signals() -> u64 {
        let mut child = detached_command("grep SigIgn /proc/self/status")
            .unwrap()
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let mut status = String::new();
        child.stdout.take().unwrap().read_to_string(&mut status).unwrap();
        let mask = status.trim().trim_start_matches("SigIgn:").trim();
        u64::from_str_radix(mask, 16).unwrap()
    }

    #[test]
    fn test_launched_program_does_not_inherit_ignored_sigchld() {
        let sigchld_bit = 1u64 << (libc::SIGCHLD - 1);

        reap_children_automatically();
        // The child is reaped by the kernel, so its output is read without waiting
        let ignored = child_ignored_signals();
        unsafe {
            libc::signal(libc::SIGCHLD, libc::SIG_DFL);
        }

        assert_eq!(ignored & sigchld_bit, 0, "SigIgn mask {:x}", ignored);
    }
}
