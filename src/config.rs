//! Configuration loading, resolution and validation.
//!
//! The configuration lives in a JSON file, by default
//! `~/.config/external-monitor-brightness/config.json`, overridable with the
//! `EXTERNAL_MONITOR_BRIGHTNESS_CONFIG_PATH` environment variable:
//!
//! ```json
//! {
//!   "city": "Bremen",
//!   "country": "Germany",
//!   "timezone": "Europe/Berlin",
//!   "latitude": 53.075144,
//!   "longitude": 8.802161,
//!   "adjust_steps": 5,
//!   "cron_interval": 12,
//!   "sunrise_sunset_offset": 60,
//!   "default": {
//!     "summer": { "day_brightness": 100, "night_brightness": 60 },
//!     "winter": { "day_brightness": 90, "night_brightness": 60 }
//!   },
//!   "monitors": {
//!     "DELL U2720Q": {
//!       "serial": "ABC123",
//!       "summer": { "day_brightness": 80, "night_brightness": 40 },
//!       "winter": { "day_brightness": 70, "night_brightness": 40 }
//!     }
//!   }
//! }
//! ```
//!
//! Every key is optional; a missing key takes its built-in default. A missing
//! or unparseable file is not fatal: the built-in defaults are used and the
//! problem is logged. Values outside their allowed domain are fatal and are
//! reported through [`ConfigError`].
//!
//! Resolution is a pure function of the config file location and the command
//! line overrides; nothing is kept in process-wide state.

use anyhow::{Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::constants::*;
use crate::logger::Log;

/// Day and night brightness for one season, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct BrightnessPair {
    pub day_brightness: i32,
    pub night_brightness: i32,
}

impl BrightnessPair {
    pub const fn new(day_brightness: i32, night_brightness: i32) -> Self {
        Self {
            day_brightness,
            night_brightness,
        }
    }
}

/// Default brightness pairs for both seasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SeasonTable {
    #[serde(default = "default_summer")]
    pub summer: BrightnessPair,
    #[serde(default = "default_winter")]
    pub winter: BrightnessPair,
}

impl Default for SeasonTable {
    fn default() -> Self {
        Self {
            summer: default_summer(),
            winter: default_winter(),
        }
    }
}

/// Per-model brightness override, matched against displays by serial number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorOverride {
    pub model: String,
    pub serial: Option<String>,
    pub summer: Option<BrightnessPair>,
    pub winter: Option<BrightnessPair>,
}

#[derive(Deserialize)]
struct MonitorOverrideBody {
    serial: Option<String>,
    summer: Option<BrightnessPair>,
    winter: Option<BrightnessPair>,
}

/// Monitor overrides in the order they appear in the config file.
///
/// The order matters: when several overrides match the same display, the
/// last one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorTable(pub Vec<MonitorOverride>);

impl MonitorTable {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonitorOverride> {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for MonitorTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = MonitorTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of monitor model names to overrides")
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<MonitorTable, E> {
                Ok(MonitorTable::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<MonitorTable, A::Error> {
                let mut entries = Vec::new();
                while let Some((model, body)) = map.next_entry::<String, MonitorOverrideBody>()? {
                    entries.push(MonitorOverride {
                        model,
                        serial: body.serial,
                        summer: body.summer,
                        winter: body.winter,
                    });
                }
                Ok(MonitorTable(entries))
            }
        }

        deserializer.deserialize_any(TableVisitor)
    }
}

/// Fully resolved and validated configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub city: String,
    pub country: String,
    pub timezone: String,
    pub latitude: f64,
    pub longitude: f64,
    pub adjust_steps: u32,
    pub cron_interval: u32,
    pub sunrise_sunset_offset: u32,
    pub default: SeasonTable,
    pub monitors: MonitorTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            city: DEFAULT_CITY.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            adjust_steps: DEFAULT_ADJUST_STEPS,
            cron_interval: DEFAULT_CRON_INTERVAL,
            sunrise_sunset_offset: DEFAULT_SUNRISE_SUNSET_OFFSET,
            default: SeasonTable::default(),
            monitors: MonitorTable::default(),
        }
    }
}

/// Configuration as written in the file, before domain checks.
///
/// Numeric knobs are kept wide so that out-of-range values (including
/// negative ones) reach validation instead of failing to parse.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default = "default_city")]
    city: String,
    #[serde(default = "default_country")]
    country: String,
    #[serde(default = "default_timezone")]
    timezone: String,
    #[serde(default = "default_latitude")]
    latitude: f64,
    #[serde(default = "default_longitude")]
    longitude: f64,
    #[serde(default = "default_adjust_steps")]
    adjust_steps: i64,
    #[serde(default = "default_cron_interval")]
    cron_interval: i64,
    #[serde(default = "default_offset")]
    sunrise_sunset_offset: i64,
    #[serde(default)]
    default: SeasonTable,
    #[serde(default)]
    monitors: MonitorTable,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            city: default_city(),
            country: default_country(),
            timezone: default_timezone(),
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            adjust_steps: i64::from(DEFAULT_ADJUST_STEPS),
            cron_interval: i64::from(DEFAULT_CRON_INTERVAL),
            sunrise_sunset_offset: i64::from(DEFAULT_SUNRISE_SUNSET_OFFSET),
            default: SeasonTable::default(),
            monitors: MonitorTable::default(),
        }
    }
}

fn default_city() -> String {
    DEFAULT_CITY.to_string()
}
fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}
fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}
fn default_latitude() -> f64 {
    DEFAULT_LATITUDE
}
fn default_longitude() -> f64 {
    DEFAULT_LONGITUDE
}
fn default_adjust_steps() -> i64 {
    i64::from(DEFAULT_ADJUST_STEPS)
}
fn default_cron_interval() -> i64 {
    i64::from(DEFAULT_CRON_INTERVAL)
}
fn default_offset() -> i64 {
    i64::from(DEFAULT_SUNRISE_SUNSET_OFFSET)
}
fn default_summer() -> BrightnessPair {
    BrightnessPair::new(
        i32::from(DEFAULT_SUMMER_DAY_BRIGHTNESS),
        i32::from(DEFAULT_SUMMER_NIGHT_BRIGHTNESS),
    )
}
fn default_winter() -> BrightnessPair {
    BrightnessPair::new(
        i32::from(DEFAULT_WINTER_DAY_BRIGHTNESS),
        i32::from(DEFAULT_WINTER_NIGHT_BRIGHTNESS),
    )
}

/// Values given on the command line, applied on top of the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    pub adjust_steps: Option<i64>,
    pub cron_interval: Option<i64>,
    pub sunrise_sunset_offset: Option<i64>,
}

/// A configuration value outside its allowed domain.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Number of steps must be in the range of 1 - 10 (got {0})")]
    InvalidSteps(i64),
    #[error("Cron interval can be 10, 12, 15, 20 or 30 min (got {0})")]
    InvalidInterval(i64),
    #[error("Sunrise and sunset offset must be in the range of 0 - 120 (got {0})")]
    InvalidOffset(i64),
    #[error("Brightness for {location} must be in the range of 0 - 100 (got {value})")]
    InvalidBrightness { location: String, value: i32 },
    #[error("Coordinates {latitude}, {longitude} are out of range")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

impl Config {
    /// Determine where the configuration file lives.
    ///
    /// `EXTERNAL_MONITOR_BRIGHTNESS_CONFIG_PATH` wins; otherwise the file is
    /// looked up under `~/.config/external-monitor-brightness/`.
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join(APP_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load, merge and validate the configuration.
    ///
    /// Missing keys take their defaults. A missing or corrupt file falls back
    /// to the built-in defaults entirely (logged as an error). Command line
    /// overrides are applied in both cases before validation.
    ///
    /// # Arguments
    /// * `path` - Location of the JSON config file
    /// * `overrides` - Values supplied on the command line
    ///
    /// # Returns
    /// The validated configuration, or the first domain violation found
    pub fn resolve(path: &Path, overrides: &Overrides) -> Result<Self, ConfigError> {
        Log::log_info(&format!("Getting config from {}", path.display()));
        let raw = match Self::read_raw(path) {
            Ok(raw) => raw,
            Err(e) => {
                Log::log_error(&format!("{:#}, using default config", e));
                RawConfig::default()
            }
        };
        Self::from_raw(raw, overrides)
    }

    /// Parse a configuration from JSON text and validate it.
    pub fn from_json(text: &str, overrides: &Overrides) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(text).context("Config syntax is incorrect")?;
        Ok(Self::from_raw(raw, overrides)?)
    }

    fn read_raw(path: &Path) -> Result<RawConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Config file not found at {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Config syntax is incorrect in {}", path.display()))
    }

    fn from_raw(raw: RawConfig, overrides: &Overrides) -> Result<Self, ConfigError> {
        let adjust_steps = overrides.adjust_steps.unwrap_or(raw.adjust_steps);
        let cron_interval = overrides.cron_interval.unwrap_or(raw.cron_interval);
        let offset = overrides
            .sunrise_sunset_offset
            .unwrap_or(raw.sunrise_sunset_offset);

        let config = Config {
            city: raw.city,
            country: raw.country,
            timezone: raw.timezone,
            latitude: raw.latitude,
            longitude: raw.longitude,
            adjust_steps: validate_steps(adjust_steps)?,
            cron_interval: validate_interval(cron_interval)?,
            sunrise_sunset_offset: validate_offset(offset)?,
            default: raw.default,
            monitors: raw.monitors,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every value against its allowed domain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_steps(i64::from(self.adjust_steps))?;
        validate_interval(i64::from(self.cron_interval))?;
        validate_offset(i64::from(self.sunrise_sunset_offset))?;

        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude)
        {
            return Err(ConfigError::InvalidCoordinates {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }

        validate_pair("default summer", &self.default.summer)?;
        validate_pair("default winter", &self.default.winter)?;
        for monitor in self.monitors.iter() {
            if let Some(pair) = &monitor.summer {
                validate_pair(&format!("{} summer", monitor.model), pair)?;
            }
            if let Some(pair) = &monitor.winter {
                validate_pair(&format!("{} winter", monitor.model), pair)?;
            }
        }
        Ok(())
    }

    /// Print the effective configuration as a structured block.
    pub fn log_config(&self, path: &Path) {
        Log::log_block_start(&format!("Loaded configuration from {}", path.display()));
        Log::log_indented(&format!(
            "Location: {}, {} ({:.4}, {:.4})",
            self.city, self.country, self.latitude, self.longitude
        ));
        Log::log_indented(&format!("Timezone: {}", self.timezone));
        Log::log_indented(&format!("Adjust steps: {}", self.adjust_steps));
        Log::log_indented(&format!("Cron interval: {} minutes", self.cron_interval));
        Log::log_indented(&format!(
            "Sunrise/sunset offset: {} minutes",
            self.sunrise_sunset_offset
        ));
        Log::log_indented(&format!(
            "Summer brightness: {}% day, {}% night",
            self.default.summer.day_brightness, self.default.summer.night_brightness
        ));
        Log::log_indented(&format!(
            "Winter brightness: {}% day, {}% night",
            self.default.winter.day_brightness, self.default.winter.night_brightness
        ));
        for monitor in self.monitors.iter() {
            Log::log_indented(&format!(
                "Monitor override: {} (serial {})",
                monitor.model,
                monitor.serial.as_deref().unwrap_or("none")
            ));
        }
    }
}

fn validate_steps(value: i64) -> Result<u32, ConfigError> {
    u32::try_from(value)
        .ok()
        .filter(|v| (MINIMUM_ADJUST_STEPS..=MAXIMUM_ADJUST_STEPS).contains(v))
        .ok_or(ConfigError::InvalidSteps(value))
}

fn validate_interval(value: i64) -> Result<u32, ConfigError> {
    u32::try_from(value)
        .ok()
        .filter(|v| ALLOWED_CRON_INTERVALS.contains(v))
        .ok_or(ConfigError::InvalidInterval(value))
}

fn validate_offset(value: i64) -> Result<u32, ConfigError> {
    u32::try_from(value)
        .ok()
        .filter(|v| (MINIMUM_SUNRISE_SUNSET_OFFSET..=MAXIMUM_SUNRISE_SUNSET_OFFSET).contains(v))
        .ok_or(ConfigError::InvalidOffset(value))
}

fn validate_pair(location: &str, pair: &BrightnessPair) -> Result<(), ConfigError> {
    for value in [pair.day_brightness, pair.night_brightness] {
        if !(MINIMUM_BRIGHTNESS..=MAXIMUM_BRIGHTNESS).contains(&value) {
            return Err(ConfigError::InvalidBrightness {
                location: location.to_string(),
                value,
            });
        }
    }
    Ok(())
}
