//! Single-instance guarantee via a PID lock file.
//!
//! The lock file holds the decimal PID of the running instance. On startup
//! an existing file is inspected: if its PID belongs to a live process whose
//! command line names this application, startup is refused. Otherwise the
//! file is considered stale (crashed instance, reused PID, garbage content)
//! and is replaced.
//!
//! Known limitation: checking and writing the file are separate steps, so
//! two instances started at the same instant can both pass the check.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::constants::*;
use crate::logger::Log;
use crate::process::ProcessProbe;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("Another instance of external-monitor-brightness is already running with pid {pid}")]
    AlreadyRunning { pid: i32 },
    #[error("Lock file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not determine home directory for the lock file")]
    NoHome,
}

impl LockError {
    /// Process exit status to use when this error stops startup.
    pub fn exit_code(&self) -> i32 {
        EXIT_FAILURE
    }
}

/// PID file based lock.
pub struct PidFileLock<P: ProcessProbe> {
    path: PathBuf,
    probe: P,
    own_pid: i32,
}

impl<P: ProcessProbe> PidFileLock<P> {
    pub fn new(path: impl Into<PathBuf>, probe: P) -> Self {
        Self {
            path: path.into(),
            probe,
            own_pid: std::process::id() as i32,
        }
    }

    /// Pretend to be a different process. Used to simulate a second instance.
    pub fn with_own_pid(mut self, pid: i32) -> Self {
        self.own_pid = pid;
        self
    }

    /// `~/.cache/external-monitor-brightness/application.lock`
    pub fn default_path() -> Result<PathBuf, LockError> {
        let home = dirs::home_dir().ok_or(LockError::NoHome)?;
        Ok(home.join(".cache").join(APP_NAME).join(LOCK_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the lock.
    ///
    /// # Returns
    /// - `Ok(LockGuard)` holding the lock until released or dropped
    /// - `Err(LockError::AlreadyRunning)` if a live instance holds the lock
    /// - `Err(LockError::Io)` if the lock file cannot be read or written
    pub fn acquire(&self) -> Result<LockGuard, LockError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        match fs::read_to_string(&self.path) {
            Ok(content) => self.clear_stale(content.trim())?,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(self.io_error(e)),
        }

        fs::write(&self.path, self.own_pid.to_string()).map_err(|e| self.io_error(e))?;
        Log::log_debug(&format!(
            "Lock file {} created with pid {}",
            self.path.display(),
            self.own_pid
        ));

        Ok(LockGuard {
            path: self.path.clone(),
            held: true,
        })
    }

    fn clear_stale(&self, content: &str) -> Result<(), LockError> {
        match content.parse::<i32>() {
            Err(_) => {
                Log::log_warning(&format!(
                    "Lock file contains an invalid pid '{}', removing it",
                    content
                ));
            }
            Ok(pid) if pid == self.own_pid => {
                Log::log_debug("Lock file already carries our own pid, replacing it");
            }
            Ok(pid) if self.is_running_instance(pid) => {
                return Err(LockError::AlreadyRunning { pid });
            }
            Ok(pid) => {
                Log::log_warning(&format!(
                    "Removing stale lock file left by pid {}",
                    pid
                ));
            }
        }

        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn is_running_instance(&self, pid: i32) -> bool {
        self.probe.is_alive(pid)
            && self
                .probe
                .command_line(pid)
                .is_some_and(|cmdline| cmdline.contains(APP_NAME))
    }

    fn io_error(&self, source: std::io::Error) -> LockError {
        LockError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Held lock. Dropping it deletes the lock file.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    held: bool,
}

impl LockGuard {
    /// Delete the lock file. Calling it again is a no-op.
    pub fn release(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;
        match fs::remove_file(&self.path) {
            Ok(()) => Log::log_debug("Lock file deleted"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => Log::log_warning(&format!(
                "Failed to remove lock file {}: {}",
                self.path.display(),
                e
            )),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.release();
    }
}
