//! Geographic location-based solar calculations.
//!
//! This module provides:
//! - The daily solar window (civil dawn, sunrise, sunset, civil dusk)
//! - Timezone resolution for the configured location

pub mod solar;

pub use solar::{
    SolarEventProvider, SolarWindow, SunriseProvider, determine_timezone_from_coordinates,
    resolve_timezone,
};
