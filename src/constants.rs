//! Application constants and default values for external-monitor-brightness.
//!
//! This module contains the configuration defaults, validation limits,
//! file locations and operational constants used throughout the application.

// ═══ Application Identity ═══

pub const APP_NAME: &str = "external-monitor-brightness";
pub const NOTIFICATION_APP_NAME: &str = "DDC Brightness Controller";
pub const NOTIFICATION_SUMMARY: &str = "Display Brightness";

// ═══ Application Configuration Defaults ═══
// These values are used when config options are not specified by the user

pub const DEFAULT_CITY: &str = "Bremen";
pub const DEFAULT_COUNTRY: &str = "Germany";
pub const DEFAULT_TIMEZONE: &str = "Europe/Berlin";
pub const DEFAULT_LATITUDE: f64 = 53.075144;
pub const DEFAULT_LONGITUDE: f64 = 8.802161;
pub const DEFAULT_ADJUST_STEPS: u32 = 5;
pub const DEFAULT_CRON_INTERVAL: u32 = 12; // minutes
pub const DEFAULT_SUNRISE_SUNSET_OFFSET: u32 = 60; // minutes
pub const DEFAULT_SUMMER_DAY_BRIGHTNESS: u8 = 100;
pub const DEFAULT_SUMMER_NIGHT_BRIGHTNESS: u8 = 60;
pub const DEFAULT_WINTER_DAY_BRIGHTNESS: u8 = 90;
pub const DEFAULT_WINTER_NIGHT_BRIGHTNESS: u8 = 60;

// ═══ Validation Limits ═══

pub const MINIMUM_ADJUST_STEPS: u32 = 1;
pub const MAXIMUM_ADJUST_STEPS: u32 = 10;
pub const ALLOWED_CRON_INTERVALS: &[u32] = &[10, 12, 15, 20, 30]; // minutes, all divide 60
pub const MINIMUM_SUNRISE_SUNSET_OFFSET: u32 = 0;
pub const MAXIMUM_SUNRISE_SUNSET_OFFSET: u32 = 120;
pub const MINIMUM_BRIGHTNESS: i32 = 0;
pub const MAXIMUM_BRIGHTNESS: i32 = 100;

// ═══ Season Boundaries ═══
// Summer runs from the vernal equinox (inclusive) to the autumnal one (exclusive)

pub const SUMMER_START: (u32, u32) = (3, 20); // (month, day)
pub const SUMMER_END: (u32, u32) = (9, 22);

// ═══ Files and Environment ═══

pub const CONFIG_PATH_ENV: &str = "EXTERNAL_MONITOR_BRIGHTNESS_CONFIG_PATH";
pub const LOG_DIR_ENV: &str = "EXTERNAL_MONITOR_BRIGHTNESS_LOG_DIR";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_LOG_DIR: &str = "/tmp/external-monitor-brightness";
pub const LOG_FILE_NAME: &str = "application.log";
pub const LOCK_FILE_NAME: &str = "application.lock";

// ═══ DDC/CI ═══

pub const DDCUTIL_BINARY: &str = "ddcutil";
pub const BRIGHTNESS_VCP_CODE: &str = "10";
pub const DDCUTIL_TIMEOUT_SECS: u64 = 10;

// ═══ Operational Timing Constants ═══

pub const CHECK_INTERVAL_SECS: u64 = 1; // how often the main loop checks the running flag

// ═══ Exit Codes ═══

pub const EXIT_FAILURE: i32 = 1;
