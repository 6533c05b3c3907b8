//! External display discovery and brightness control.
//!
//! Displays are driven over DDC/CI. The [`DisplayControl`] trait is the seam
//! between the control cycle and the hardware; production code uses
//! [`DdcutilController`], tests substitute their own implementation.

pub mod ddcutil;
pub mod mapping;

use anyhow::Result;
use std::collections::BTreeMap;

pub use ddcutil::DdcutilController;
pub use mapping::{DisplayTarget, map_display_parameters};

/// A display reported by DDC/CI detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedDisplay {
    /// Display number used to address it in later commands.
    pub id: String,
    /// Detection fields, lower-cased, with whitespace removed from values.
    pub metadata: BTreeMap<String, String>,
}

impl ConnectedDisplay {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Add a metadata field, builder style.
    pub fn with_field(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// The `monitor` field (`mfg:model:serial`), or an empty string.
    pub fn monitor(&self) -> &str {
        self.metadata.get("monitor").map(String::as_str).unwrap_or("")
    }
}

/// Access to the connected displays.
#[cfg_attr(test, mockall::automock)]
pub trait DisplayControl {
    /// Enumerate connected displays. Failures yield an empty list.
    fn list_displays(&self) -> Vec<ConnectedDisplay>;

    /// Read the current brightness. Failures yield 0.
    fn read_brightness(&self, id: &str) -> i32;

    /// Set the brightness.
    fn write_brightness(&self, id: &str, value: i32) -> Result<()>;
}
