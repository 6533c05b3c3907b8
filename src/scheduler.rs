//! Wall-clock aligned periodic trigger with single-flight execution.
//!
//! Fire times behave like a `*/N` cron minute field over all hours: the
//! scheduler fires at every local minute that is a multiple of the interval,
//! at second zero. Triggers are never queued; one that arrives while a job is
//! still running is dropped.

use chrono::{DateTime, Duration, Timelike};
use chrono_tz::Tz;
use std::sync::atomic::{AtomicBool, Ordering};

/// Result of a trigger attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Ran,
    /// Another run was still in flight.
    Skipped,
}

#[derive(Debug)]
pub struct Scheduler {
    interval_minutes: u32,
    in_flight: AtomicBool,
}

impl Scheduler {
    /// # Arguments
    /// * `interval_minutes` - Period in minutes; should divide 60
    pub fn new(interval_minutes: u32) -> Self {
        Self {
            interval_minutes: interval_minutes.max(1),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    /// The first fire time strictly after `now`.
    pub fn next_fire_after(&self, now: DateTime<Tz>) -> DateTime<Tz> {
        let minute_start = now
            - Duration::seconds(i64::from(now.second()))
            - Duration::nanoseconds(i64::from(now.nanosecond()));
        let minute = now.minute();
        let next_minute = (minute / self.interval_minutes + 1) * self.interval_minutes;
        // Past :59 this lands on the next hour's :00
        let next_minute = next_minute.min(60);
        minute_start + Duration::minutes(i64::from(next_minute - minute))
    }

    /// Run `job` unless a previous run is still in flight.
    pub fn trigger<F: FnOnce()>(&self, job: F) -> TriggerOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return TriggerOutcome::Skipped;
        }

        struct Release<'a>(&'a AtomicBool);
        impl Drop for Release<'_> {
            fn drop(&mut self) {
                self.0.store(false, Ordering::SeqCst);
            }
        }
        let _release = Release(&self.in_flight);

        job();
        TriggerOutcome::Ran
    }
}
