//! DDC/CI access through the `ddcutil` command line tool.

use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use super::{ConnectedDisplay, DisplayControl};
use crate::constants::*;
use crate::logger::Log;
use crate::process::run_with_timeout;

/// [`DisplayControl`] implementation that shells out to `ddcutil`.
#[derive(Debug, Clone)]
pub struct DdcutilController {
    binary: String,
    timeout: Duration,
}

impl Default for DdcutilController {
    fn default() -> Self {
        Self {
            binary: DDCUTIL_BINARY.to_string(),
            timeout: Duration::from_secs(DDCUTIL_TIMEOUT_SECS),
        }
    }
}

impl DdcutilController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different executable, e.g. a wrapper script.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let output = run_with_timeout(&self.binary, args, self.timeout)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl DisplayControl for DdcutilController {
    fn list_displays(&self) -> Vec<ConnectedDisplay> {
        match self.run(&["detect", "--terse"]) {
            Ok(stdout) => parse_detect_output(&stdout),
            Err(e) => {
                Log::log_error(&format!("Error while getting ddc displays: {:#}", e));
                Vec::new()
            }
        }
    }

    fn read_brightness(&self, id: &str) -> i32 {
        let stdout = match self.run(&["-d", id, "-t", "getvcp", BRIGHTNESS_VCP_CODE]) {
            Ok(stdout) => stdout,
            Err(e) => {
                Log::log_error(&format!(
                    "Error while getting brightness for display {}: {:#}",
                    id, e
                ));
                return 0;
            }
        };
        parse_brightness(&stdout).unwrap_or_else(|| {
            Log::log_error(&format!(
                "Error while getting brightness for display {}: unexpected output '{}'",
                id,
                stdout.trim()
            ));
            0
        })
    }

    fn write_brightness(&self, id: &str, value: i32) -> Result<()> {
        let value = value.to_string();
        self.run(&["-d", id, "setvcp", BRIGHTNESS_VCP_CODE, &value])?;
        Ok(())
    }
}

// `display N` line opening a detection block
static DISPLAY_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^display\s+(\S+)").expect("display header pattern is valid"));

/// Parse `ddcutil detect --terse` output.
///
/// The text is lower-cased and split into blank-line separated blocks. In a
/// block, `key: value` lines become metadata (spaces removed from the
/// value) and a `display N` line provides the id. Any other line, such as
/// `invalid display`, discards the whole block, as does a missing id.
pub fn parse_detect_output(text: &str) -> Vec<ConnectedDisplay> {
    let lowered = text.to_lowercase();
    let mut displays = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    // Trailing empty line flushes a final block without a blank separator
    for line in lowered.lines().chain(std::iter::once("")) {
        let line = line.trim();
        if !line.is_empty() {
            block.push(line);
            continue;
        }
        if !block.is_empty() {
            if let Some(display) = parse_block(&block) {
                displays.push(display);
            }
            block.clear();
        }
    }

    displays
}

fn parse_block(lines: &[&str]) -> Option<ConnectedDisplay> {
    let mut id = None;
    let mut metadata = std::collections::BTreeMap::new();

    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            metadata.insert(key.trim().to_string(), value.trim().replace(' ', ""));
        } else if let Some(captures) = DISPLAY_HEADER.captures(line) {
            id = Some(captures[1].to_string());
        } else {
            return None;
        }
    }

    Some(ConnectedDisplay { id: id?, metadata })
}

/// Parse `ddcutil -t getvcp 10` output (`VCP 10 C <current> <max>`).
pub fn parse_brightness(text: &str) -> Option<i32> {
    text.lines()
        .next()?
        .split_whitespace()
        .nth(3)?
        .parse()
        .ok()
}
