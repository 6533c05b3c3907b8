//! Step-function brightness curve over the solar day.
//!
//! A curve is a pair of parallel vectors: transition timestamps and the
//! brightness that applies from each timestamp until the next one. With `n`
//! steps the curve has `n` morning points, evenly spaced from civil dawn to
//! `sunrise + offset`, ramping up towards the day brightness, followed by `n`
//! evening points from `sunset - offset` to civil dusk ramping down towards
//! the night brightness. With a single step the curve degenerates to a hard
//! switch at dawn and dusk.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;

use crate::config::BrightnessPair;
use crate::geo::SolarWindow;

/// Parallel timestamps and target brightness values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionCurve {
    pub time_intervals: Vec<DateTime<Tz>>,
    pub brightness_values: Vec<i32>,
}

impl TransitionCurve {
    /// Build the full curve for one brightness pair.
    ///
    /// # Arguments
    /// * `window` - Today's solar events
    /// * `offset_minutes` - Minutes after sunrise / before sunset the ramps end / start
    /// * `steps` - Number of steps per ramp (at least 1)
    /// * `pair` - Target day and night brightness
    pub fn new(window: &SolarWindow, offset_minutes: u32, steps: u32, pair: BrightnessPair) -> Self {
        Self {
            time_intervals: build_time_intervals(window, offset_minutes, steps),
            brightness_values: build_brightness_values(pair, steps),
        }
    }

    /// Whether the timestamps never decrease.
    ///
    /// An offset larger than half the daylight span pushes the morning ramp
    /// past the evening one; the curve is still built but is no longer a
    /// well-formed step function.
    pub fn is_ordered(&self) -> bool {
        is_non_decreasing(&self.time_intervals)
    }

    pub fn len(&self) -> usize {
        self.time_intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_intervals.is_empty()
    }
}

/// Compute the transition timestamps.
///
/// The result only depends on the window, the offset and the step count, so
/// one vector can be shared by every display in a cycle.
pub fn build_time_intervals(window: &SolarWindow, offset_minutes: u32, steps: u32) -> Vec<DateTime<Tz>> {
    let offset = Duration::minutes(i64::from(offset_minutes));
    let t0 = window.dawn;
    let t1 = window.sunrise + offset;
    let t2 = window.sunset - offset;
    let t3 = window.dusk;

    if steps <= 1 {
        return vec![t0, t3];
    }

    let divisions = steps as i32 - 1;
    let morning_step = (t1 - t0) / divisions;
    let evening_step = (t3 - t2) / divisions;

    let morning = (0..steps as i32).map(|i| t0 + morning_step * i);
    let evening = (0..steps as i32).map(|i| t2 + evening_step * i);
    morning.chain(evening).collect()
}

/// Whether a timestamp sequence never goes backwards.
pub fn is_non_decreasing(times: &[DateTime<Tz>]) -> bool {
    times.windows(2).all(|w| w[0] <= w[1])
}

/// Compute the brightness values for one pair.
///
/// Morning values climb from just above night brightness to day
/// brightness; evening values mirror them back down. Fractional values are
/// truncated towards zero.
pub fn build_brightness_values(pair: BrightnessPair, steps: u32) -> Vec<i32> {
    let day = pair.day_brightness;
    let night = pair.night_brightness;

    if steps <= 1 {
        return vec![day, night];
    }

    // Exact integer form of night + i * (day - night) / steps
    let n = i64::from(steps);
    let span = i64::from(day) - i64::from(night);
    let at = |from: i32, i: i64, sign: i64| {
        ((i64::from(from) * n + sign * i * span) / n) as i32
    };
    let morning = (1..=n).map(|i| at(night, i, 1));
    let evening = (1..=n).map(|i| at(day, i, -1));
    morning.chain(evening).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn window() -> SolarWindow {
        let tz = chrono_tz::Europe::Berlin;
        let at = |h, m| tz.with_ymd_and_hms(2024, 6, 21, h, m, 0).unwrap();
        SolarWindow {
            dawn: at(6, 0),
            sunrise: at(7, 0),
            sunset: at(19, 0),
            dusk: at(20, 0),
        }
    }

    fn hm(t: &DateTime<Tz>) -> (u32, u32) {
        (t.hour(), t.minute())
    }

    #[test]
    fn test_five_steps_no_offset() {
        let curve = TransitionCurve::new(&window(), 0, 5, BrightnessPair::new(100, 60));

        let times: Vec<_> = curve.time_intervals.iter().map(hm).collect();
        assert_eq!(
            times,
            vec![
                (6, 0), (6, 15), (6, 30), (6, 45), (7, 0),
                (19, 0), (19, 15), (19, 30), (19, 45), (20, 0),
            ]
        );
        assert_eq!(
            curve.brightness_values,
            vec![68, 76, 84, 92, 100, 92, 84, 76, 68, 60]
        );
        assert!(curve.is_ordered());
    }

    #[test]
    fn test_single_step_is_hard_switch() {
        let curve = TransitionCurve::new(&window(), 30, 1, BrightnessPair::new(90, 40));
        let times: Vec<_> = curve.time_intervals.iter().map(hm).collect();
        assert_eq!(times, vec![(6, 0), (20, 0)]);
        assert_eq!(curve.brightness_values, vec![90, 40]);
    }

    #[test]
    fn test_offset_moves_inner_boundaries() {
        let times = build_time_intervals(&window(), 60, 3);
        let times: Vec<_> = times.iter().map(hm).collect();
        // Morning ramp ends at sunrise + 1h, evening ramp starts at sunset - 1h
        assert_eq!(times, vec![(6, 0), (7, 0), (8, 0), (18, 0), (19, 0), (20, 0)]);
    }

    #[test]
    fn test_fractional_steps_truncate() {
        // (100 - 60) / 3 = 13.33..
        assert_eq!(
            build_brightness_values(BrightnessPair::new(100, 60), 3),
            vec![73, 86, 100, 86, 73, 60]
        );
    }

    #[test]
    fn test_inverted_pair_ramps_downwards_in_the_morning() {
        assert_eq!(
            build_brightness_values(BrightnessPair::new(20, 80), 2),
            vec![50, 20, 50, 80]
        );
    }

    #[test]
    fn test_excessive_offset_is_detected() {
        let tz = chrono_tz::Europe::Berlin;
        let at = |h, m| tz.with_ymd_and_hms(2024, 12, 21, h, m, 0).unwrap();
        let short_day = SolarWindow {
            dawn: at(8, 0),
            sunrise: at(8, 40),
            sunset: at(10, 0),
            dusk: at(10, 40),
        };
        let curve = TransitionCurve::new(&short_day, 120, 2, BrightnessPair::new(90, 60));
        assert_eq!(curve.len(), 4);
        assert!(!curve.is_ordered());
    }
}
