//! Pick the brightness that applies at a given instant.

use chrono::DateTime;
use chrono_tz::Tz;
use thiserror::Error;

use crate::curve::TransitionCurve;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Time intervals and brightness values do not match ({intervals} vs {values})")]
    CurveMismatch { intervals: usize, values: usize },
    #[error("Brightness curve is empty")]
    EmptyCurve,
}

/// Resolve the target brightness for `now`.
///
/// Before the first timestamp the curve wraps around and the last value
/// (the previous night's brightness) applies. Otherwise the value of the
/// latest timestamp at or before `now` applies; if several entries share
/// that timestamp the one with the lowest index wins.
pub fn resolve_brightness(curve: &TransitionCurve, now: &DateTime<Tz>) -> Result<i32, ResolveError> {
    let intervals = &curve.time_intervals;
    let values = &curve.brightness_values;

    if intervals.len() != values.len() {
        return Err(ResolveError::CurveMismatch {
            intervals: intervals.len(),
            values: values.len(),
        });
    }
    let (Some(first), Some(last)) = (intervals.first(), values.last()) else {
        return Err(ResolveError::EmptyCurve);
    };

    if now < first {
        return Ok(*last);
    }

    let mut best: Option<(usize, &DateTime<Tz>)> = None;
    for (index, timestamp) in intervals.iter().enumerate() {
        if timestamp > now {
            continue;
        }
        // Strictly greater keeps the lowest index among equal timestamps
        if best.is_none_or(|(_, current)| timestamp > current) {
            best = Some((index, timestamp));
        }
    }

    // `now >= first` guarantees at least one candidate
    Ok(best.map_or(*last, |(index, _)| values[index]))
}
