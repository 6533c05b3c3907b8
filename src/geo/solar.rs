//! Solar event calculations for the daily brightness window.
//!
//! Civil dawn and dusk (sun at -6°) bound the night, sunrise and sunset (sun at
//! 0°) bound the day. Events are computed with the `sunrise` crate in UTC and
//! converted to the configured timezone.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use sunrise::{Coordinates, DawnType, SolarDay, SolarEvent};

use crate::logger::Log;

/// The four solar events of one day, in the configured timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolarWindow {
    pub dawn: DateTime<Tz>,
    pub sunrise: DateTime<Tz>,
    pub sunset: DateTime<Tz>,
    pub dusk: DateTime<Tz>,
}

impl SolarWindow {
    /// Whether `dawn < sunrise < sunset < dusk` holds.
    ///
    /// Fails at polar latitudes around the solstices, where one or more
    /// events do not occur.
    pub fn is_ordered(&self) -> bool {
        self.dawn < self.sunrise && self.sunrise < self.sunset && self.sunset < self.dusk
    }
}

/// Source of a day's solar events.
pub trait SolarEventProvider {
    /// Compute the solar window for a local calendar date.
    fn solar_window(&self, date: NaiveDate) -> Result<SolarWindow>;
}

/// [`SolarEventProvider`] backed by the `sunrise` crate.
#[derive(Debug, Clone)]
pub struct SunriseProvider {
    latitude: f64,
    longitude: f64,
    timezone: Tz,
}

impl SunriseProvider {
    /// Create a provider for a location.
    ///
    /// # Arguments
    /// * `latitude` - Geographic latitude in degrees (-90 to +90)
    /// * `longitude` - Geographic longitude in degrees (-180 to +180)
    /// * `timezone` - Timezone the returned events are expressed in
    pub fn new(latitude: f64, longitude: f64, timezone: Tz) -> Result<Self> {
        Self::coordinates(latitude, longitude)?;
        Ok(Self {
            latitude,
            longitude,
            timezone,
        })
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    fn coordinates(latitude: f64, longitude: f64) -> Result<Coordinates> {
        Coordinates::new(latitude, longitude).with_context(|| {
            format!("Invalid coordinates: {:.4}, {:.4}", latitude, longitude)
        })
    }
}

impl SolarEventProvider for SunriseProvider {
    fn solar_window(&self, date: NaiveDate) -> Result<SolarWindow> {
        let coordinates = Self::coordinates(self.latitude, self.longitude)?;
        let solar_day = SolarDay::new(coordinates, date);
        let local = |event: SolarEvent| solar_day.event_time(event).with_timezone(&self.timezone);

        let window = SolarWindow {
            dawn: local(SolarEvent::Dawn(DawnType::Civil)),
            sunrise: local(SolarEvent::Sunrise),
            sunset: local(SolarEvent::Sunset),
            dusk: local(SolarEvent::Dusk(DawnType::Civil)),
        };

        if !window.is_ordered() {
            anyhow::bail!(
                "Solar events for {} at {:.4}, {:.4} are not in order \
                 (dawn {}, sunrise {}, sunset {}, dusk {})",
                date,
                self.latitude,
                self.longitude,
                window.dawn.format("%H:%M"),
                window.sunrise.format("%H:%M"),
                window.sunset.format("%H:%M"),
                window.dusk.format("%H:%M")
            );
        }
        Ok(window)
    }
}

/// Determine the timezone for given coordinates using precise timezone boundary data.
///
/// Uses the tzf-rs crate for timezone detection based on geographic boundaries.
pub fn determine_timezone_from_coordinates(latitude: f64, longitude: f64) -> Tz {
    use std::sync::OnceLock;
    use tzf_rs::DefaultFinder;

    static FINDER: OnceLock<DefaultFinder> = OnceLock::new();
    let finder = FINDER.get_or_init(DefaultFinder::new);

    // tzf-rs uses (longitude, latitude) order
    let tz_name = finder.get_tz_name(longitude, latitude);
    tz_name.parse::<Tz>().unwrap_or(Tz::UTC)
}

/// Parse the configured IANA timezone name.
///
/// An unknown name falls back to the timezone found at the coordinates.
pub fn resolve_timezone(name: &str, latitude: f64, longitude: f64) -> Tz {
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            let detected = determine_timezone_from_coordinates(latitude, longitude);
            Log::log_warning(&format!(
                "Unknown timezone '{}', using {} from coordinates",
                name, detected
            ));
            detected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test_constants::*;
    use chrono::{TimeZone, Timelike};

    fn bremen() -> SunriseProvider {
        SunriseProvider::new(TEST_LATITUDE, TEST_LONGITUDE, chrono_tz::Europe::Berlin).unwrap()
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        assert!(SunriseProvider::new(91.0, 0.0, Tz::UTC).is_err());
        assert!(SunriseProvider::new(0.0, 181.0, Tz::UTC).is_err());
    }

    #[test]
    fn test_midsummer_window_in_bremen() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        let window = bremen().solar_window(date).unwrap();

        assert!(window.is_ordered());
        assert_eq!(window.sunrise.date_naive(), date);
        // Local sunrise in Bremen around the solstice is just before 05:00 CEST
        assert!((4..=5).contains(&window.sunrise.hour()));
        assert!((21..=22).contains(&window.sunset.hour()));
    }

    #[test]
    fn test_midwinter_window_in_bremen() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap();
        let window = bremen().solar_window(date).unwrap();

        assert!(window.is_ordered());
        assert!((8..=9).contains(&window.sunrise.hour()));
        assert!((15..=16).contains(&window.sunset.hour()));
    }

    #[test]
    fn test_window_order_check() {
        let tz = Tz::UTC;
        let at = |h| tz.with_ymd_and_hms(2024, 6, 21, h, 0, 0).unwrap();
        let ordered = SolarWindow {
            dawn: at(5),
            sunrise: at(6),
            sunset: at(20),
            dusk: at(21),
        };
        assert!(ordered.is_ordered());

        let collapsed = SolarWindow {
            sunrise: at(5),
            ..ordered
        };
        assert!(!collapsed.is_ordered());
    }

    #[test]
    fn test_resolve_timezone() {
        assert_eq!(
            resolve_timezone(TEST_TIMEZONE, TEST_LATITUDE, TEST_LONGITUDE),
            chrono_tz::Europe::Berlin
        );
        // Unknown names fall back to the location's zone
        assert_eq!(
            resolve_timezone("Mars/Olympus_Mons", TEST_LATITUDE, TEST_LONGITUDE),
            chrono_tz::Europe::Berlin
        );
    }
}
