//! External process execution and process inspection.
//!
//! This module runs short-lived helper commands (ddcutil) with a hard time
//! bound, and answers questions about other processes by PID for the
//! single-instance lock.

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::{
    process::{Command, Output, Stdio},
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::Duration,
};

use crate::logger::Log;

/// Run a command to completion, killing it if it exceeds `timeout`.
///
/// Stdout and stderr are captured. A non-zero exit status is an error.
///
/// # Arguments
/// * `program` - Executable name or path
/// * `args` - Arguments passed to the program
/// * `timeout` - Upper bound on the total run time
///
/// # Returns
/// - `Ok(Output)` if the process exited successfully in time
/// - `Err` if it could not be started, timed out, or exited unsuccessfully
pub fn run_with_timeout(program: &str, args: &[&str], timeout: Duration) -> Result<Output> {
    let command_line = format!("{} {}", program, args.join(" "));
    Log::log_debug(&format!("Running: {}", command_line));

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to start {}", program))?;
    let pid = child.id();

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(child.wait_with_output());
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            let output = result.with_context(|| format!("Failed to wait for {}", command_line))?;
            if !output.status.success() {
                anyhow::bail!(
                    "{} failed with {}: {}",
                    command_line,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            Ok(output)
        }
        Err(RecvTimeoutError::Timeout) => {
            // The waiter thread reaps the child once it is gone
            if let Ok(raw) = i32::try_from(pid) {
                let _ = kill(Pid::from_raw(raw), Signal::SIGKILL);
            }
            anyhow::bail!(
                "{} timed out after {} seconds",
                command_line,
                timeout.as_secs_f32()
            )
        }
        Err(RecvTimeoutError::Disconnected) => {
            anyhow::bail!("Lost track of {}", command_line)
        }
    }
}

/// Inspection of other processes by PID.
pub trait ProcessProbe {
    /// Whether a process with this PID currently exists.
    fn is_alive(&self, pid: i32) -> bool;

    /// The process's command line with arguments separated by spaces.
    fn command_line(&self, pid: i32) -> Option<String>;
}

/// [`ProcessProbe`] using signal 0 and `/proc`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcProbe;

impl ProcessProbe for ProcProbe {
    fn is_alive(&self, pid: i32) -> bool {
        if pid <= 0 {
            return false;
        }
        match kill(Pid::from_raw(pid), None) {
            Ok(()) => true,
            // Exists but belongs to another user
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }

    fn command_line(&self, pid: i32) -> Option<String> {
        let raw = std::fs::read(format!("/proc/{}/cmdline", pid)).ok()?;
        let text = String::from_utf8_lossy(&raw).replace('\0', " ");
        Some(text.trim_end().to_string())
    }
}
