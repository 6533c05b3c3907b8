//! # external-monitor-brightness
//!
//! Keeps the brightness of DDC/CI-controlled external monitors in step with
//! the solar day: bright in daylight, dim at night, with a stepped ramp
//! through dawn/sunrise and sunset/dusk.
//!
//! ## Architecture
//!
//! - **config**: JSON configuration loading, defaults and validation
//! - **constants**: Application-wide constants and defaults
//! - **season**: Summer/winter classification
//! - **geo**: Solar events and timezone resolution
//! - **curve**: Step-function brightness curve construction
//! - **resolver**: Brightness lookup for a point in time
//! - **display**: Display discovery, brightness IO and per-display mapping
//! - **cycle**: One control cycle tying the above together
//! - **scheduler**: Interval-aligned, single-flight triggering
//! - **lock**: Single-instance PID lock
//! - **daemon**: Startup, main loop and shutdown
//! - **logger**: Structured console and file logging

pub mod args;
pub mod config;
pub mod constants;
pub mod curve;
pub mod cycle;
pub mod daemon;
pub mod display;
pub mod geo;
pub mod lock;
pub mod logger;
pub mod notify;
pub mod process;
pub mod resolver;
pub mod scheduler;
pub mod season;
pub mod signals;

#[cfg(any(test, feature = "testing-support"))]
pub mod testing;

// Re-export important types for easier access
pub use config::{BrightnessPair, Config, ConfigError};
pub use curve::TransitionCurve;
pub use cycle::{ControlCycle, CycleReport};
pub use logger::{Log, LogLevel};
pub use resolver::{ResolveError, resolve_brightness};
pub use season::Season;
