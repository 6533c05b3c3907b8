//! In-memory collaborators for exercising the control cycle without hardware.
//!
//! Only compiled for tests and with the `testing-support` feature.

use anyhow::Result;
use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::display::{ConnectedDisplay, DisplayControl};
use crate::geo::{SolarEventProvider, SolarWindow};
use crate::notify::Notifier;

/// Displays whose brightness lives in memory.
#[derive(Debug, Default)]
pub struct FakeDisplays {
    displays: Vec<ConnectedDisplay>,
    brightness: RefCell<BTreeMap<String, i32>>,
    failing_writes: Vec<String>,
    writes: RefCell<Vec<(String, i32)>>,
}

impl FakeDisplays {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a display with a `monitor` field and a starting brightness.
    pub fn with_display(mut self, id: &str, monitor: &str, brightness: i32) -> Self {
        self.displays
            .push(ConnectedDisplay::new(id).with_field("monitor", monitor));
        self.brightness.borrow_mut().insert(id.to_string(), brightness);
        self
    }

    /// Make every write to this display fail.
    pub fn with_failing_writes(mut self, id: &str) -> Self {
        self.failing_writes.push(id.to_string());
        self
    }

    pub fn brightness(&self, id: &str) -> Option<i32> {
        self.brightness.borrow().get(id).copied()
    }

    /// Every successful write, in order.
    pub fn writes(&self) -> Vec<(String, i32)> {
        self.writes.borrow().clone()
    }
}

impl DisplayControl for FakeDisplays {
    fn list_displays(&self) -> Vec<ConnectedDisplay> {
        self.displays.clone()
    }

    fn read_brightness(&self, id: &str) -> i32 {
        self.brightness(id).unwrap_or(0)
    }

    fn write_brightness(&self, id: &str, value: i32) -> Result<()> {
        if self.failing_writes.iter().any(|f| f == id) {
            anyhow::bail!("display {} did not acknowledge setvcp", id);
        }
        self.brightness.borrow_mut().insert(id.to_string(), value);
        self.writes.borrow_mut().push((id.to_string(), value));
        Ok(())
    }
}

/// Solar provider that returns the same window for every date.
#[derive(Debug, Clone)]
pub struct FixedSolar(pub SolarWindow);

impl SolarEventProvider for FixedSolar {
    fn solar_window(&self, _date: NaiveDate) -> Result<SolarWindow> {
        Ok(self.0)
    }
}

/// Solar provider that always fails, like a polar day.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSolar;

impl SolarEventProvider for FailingSolar {
    fn solar_window(&self, date: NaiveDate) -> Result<SolarWindow> {
        anyhow::bail!("no sunrise on {}", date)
    }
}

/// Notifier that records messages.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: RefCell<Vec<String>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every call fails (nothing is recorded).
    pub fn failing() -> Self {
        Self {
            messages: RefCell::new(Vec::new()),
            fail: true,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) -> Result<()> {
        if self.fail {
            anyhow::bail!("notification service is not running");
        }
        self.messages.borrow_mut().push(message.to_string());
        Ok(())
    }
}
