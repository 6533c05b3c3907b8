//! Structured logging system with visual formatting.
//!
//! Console output uses level prefixes (`[INFO]`, `[WARN]`, ...) and Unicode box
//! drawing characters for the structured startup/shutdown blocks. When file
//! logging is active every message is additionally written to the log file as
//! `timestamp - LEVEL - message` by a dedicated writer thread.
//!
//! The logger supports runtime enable/disable functionality for quiet operation
//! during testing, and a separate debug gate driven by `--verbose`.

use chrono::Local;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};
use std::thread::JoinHandle;

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

// Present only while a LoggerGuard is alive
static LOG_CHANNEL: Mutex<Option<Sender<LogMessage>>> = Mutex::new(None);

enum LogMessage {
    Line(String),
    Shutdown,
}

/// Log level enumeration for categorizing message importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Log,  // Debug/operational detail, only shown with --verbose
    Warn, // Warning messages (non-fatal issues)
    Err,  // Error messages (recoverable failures)
    Crit, // Critical errors (process is about to exit)
    Info, // Informational messages (status updates)
}

impl LogLevel {
    fn console_prefix(self) -> &'static str {
        match self {
            LogLevel::Log => "[LOG] ",
            LogLevel::Warn => "[WARN] ",
            LogLevel::Err => "[ERR] ",
            LogLevel::Crit => "[CRIT] ",
            LogLevel::Info => "[INFO] ",
        }
    }

    fn file_name(self) -> &'static str {
        match self {
            LogLevel::Log => "DEBUG",
            LogLevel::Warn => "WARNING",
            LogLevel::Err => "ERROR",
            LogLevel::Crit => "CRITICAL",
            LogLevel::Info => "INFO",
        }
    }
}

/// Main logging interface providing structured output formatting.
pub struct Log;

impl Log {
    /// Enable or disable logging temporarily.
    ///
    /// Used by tests where log output would interfere with results.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Enable or disable debug messages (`log_debug`).
    pub fn set_debug(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_debug() -> bool {
        DEBUG_ENABLED.load(Ordering::SeqCst)
    }

    /// Start writing log lines to `path`.
    ///
    /// The file is truncated, and its parent directory created if missing.
    /// Lines are handed to a writer thread over a channel; dropping the
    /// returned guard flushes and closes the file.
    ///
    /// # Arguments
    /// * `path` - Log file location, normally `<log_dir>/application.log`
    ///
    /// # Returns
    /// A guard that must be kept alive for as long as file logging is wanted
    pub fn start_file_logging(path: &Path) -> anyhow::Result<LoggerGuard> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        let (tx, rx) = channel();

        let handle = std::thread::spawn(move || {
            loop {
                match rx.recv() {
                    Ok(LogMessage::Line(text)) => {
                        file.write_all(text.as_bytes())?;
                    }
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }
            Ok::<(), anyhow::Error>(())
        });

        if let Ok(mut channel) = LOG_CHANNEL.lock() {
            *channel = Some(tx.clone());
        }

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Main log function with level-based prefixes.
    ///
    /// # Arguments
    /// * `level` - LogLevel indicating message importance
    /// * `message` - Text content to log
    pub fn log(level: LogLevel, message: &str) {
        if !Self::is_enabled() {
            return;
        }
        if level == LogLevel::Log && !Self::is_debug() {
            return;
        }

        println!("{}{}", level.console_prefix(), message);
        write_file_line(level, message);
    }

    // ═══ Convenience Methods for Common Log Levels ═══

    /// Log an error message.
    pub fn log_error(message: &str) {
        Self::log(LogLevel::Err, message);
    }

    /// Log a warning message.
    pub fn log_warning(message: &str) {
        Self::log(LogLevel::Warn, message);
    }

    /// Log an informational message.
    pub fn log_info(message: &str) {
        Self::log(LogLevel::Info, message);
    }

    /// Log a debug message. Suppressed unless debug output is enabled.
    pub fn log_debug(message: &str) {
        Self::log(LogLevel::Log, message);
    }

    /// Log a critical error message.
    pub fn log_critical(message: &str) {
        Self::log(LogLevel::Crit, message);
    }

    // ═══ Visual Formatting Functions ═══

    /// Log a decorated message with visual branching indicator.
    pub fn log_decorated(message: &str) {
        if !Self::is_enabled() {
            return;
        }
        println!("┣ {}", message);
        write_file_line(LogLevel::Info, message);
    }

    /// Log an indented message for sub-items or details.
    pub fn log_indented(message: &str) {
        if !Self::is_enabled() {
            return;
        }
        println!("┃   {}", message);
        write_file_line(LogLevel::Info, message);
    }

    /// Log a visual pipe separator.
    pub fn log_pipe() {
        if !Self::is_enabled() {
            return;
        }
        println!("┃");
    }

    /// Log a block start message with visual separation.
    ///
    /// Used for major state changes or new operational phases.
    pub fn log_block_start(message: &str) {
        if !Self::is_enabled() {
            return;
        }
        println!("┃");
        println!("┣ {}", message);
        write_file_line(LogLevel::Info, message);
    }

    /// Log the application version header.
    pub fn log_version() {
        if !Self::is_enabled() {
            return;
        }
        println!("┏ external-monitor-brightness v{} ━━╸", env!("CARGO_PKG_VERSION"));
        println!("┃");
        write_file_line(
            LogLevel::Info,
            &format!("external-monitor-brightness v{} started", env!("CARGO_PKG_VERSION")),
        );
    }

    /// Log the final termination marker.
    pub fn log_end() {
        if !Self::is_enabled() {
            return;
        }
        println!("╹");
    }
}

/// Guard for file logging that ensures the writer thread drains and flushes.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        if let Ok(mut channel) = LOG_CHANNEL.lock() {
            *channel = None;
        }
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn write_file_line(level: LogLevel, message: &str) {
    let Ok(channel) = LOG_CHANNEL.lock() else {
        return;
    };
    if let Some(tx) = channel.as_ref() {
        let _ = tx.send(LogMessage::Line(format_file_line(level, message)));
    }
}

fn format_file_line(level: LogLevel, message: &str) -> String {
    format!(
        "{} - {} - {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
        level.file_name(),
        strip_ansi_codes(message)
    )
}

// Removes `ESC [ ... m` colour sequences so the file stays plain text
fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}
