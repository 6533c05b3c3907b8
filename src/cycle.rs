//! One brightness control cycle.
//!
//! A cycle enumerates displays, maps each to its brightness pair for the
//! current season, builds today's curve and applies the brightness that the
//! curve prescribes for "now" wherever the display differs from it. Problems
//! with one display are logged and never stop the others.

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use std::collections::HashMap;

use crate::config::{BrightnessPair, Config};
use crate::constants::{MAXIMUM_BRIGHTNESS, MINIMUM_BRIGHTNESS};
use crate::curve::{TransitionCurve, build_brightness_values, build_time_intervals, is_non_decreasing};
use crate::display::{DisplayControl, DisplayTarget, map_display_parameters};
use crate::geo::SolarEventProvider;
use crate::logger::Log;
use crate::notify::{Notifier, brightness_message};
use crate::resolver::resolve_brightness;
use crate::season::Season;

/// What happened to each display during a cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Displays whose brightness was changed, with the new value.
    pub applied: Vec<(String, i32)>,
    /// Displays already at their target, with that target.
    pub unchanged: Vec<(String, i32)>,
    /// Displays that would be changed in dry-run mode, with the target.
    pub planned: Vec<(String, i32)>,
    /// Displays that could not be handled.
    pub skipped: Vec<String>,
}

impl CycleReport {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
            && self.unchanged.is_empty()
            && self.planned.is_empty()
            && self.skipped.is_empty()
    }
}

/// Collaborators and settings for running cycles.
pub struct ControlCycle<'a> {
    config: &'a Config,
    displays: &'a dyn DisplayControl,
    solar: &'a dyn SolarEventProvider,
    notifier: &'a dyn Notifier,
    dry_run: bool,
}

impl<'a> ControlCycle<'a> {
    pub fn new(
        config: &'a Config,
        displays: &'a dyn DisplayControl,
        solar: &'a dyn SolarEventProvider,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            config,
            displays,
            solar,
            notifier,
            dry_run: false,
        }
    }

    /// Compute and log targets without writing to displays or notifying.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Run one cycle as of `now`.
    ///
    /// # Arguments
    /// * `now` - Current instant in the configured timezone
    ///
    /// # Returns
    /// A per-display summary; empty when no display is connected
    pub fn run(&self, now: DateTime<Tz>) -> CycleReport {
        let mut report = CycleReport::default();

        let connected = self.displays.list_displays();
        Log::log_debug(&format!("Connected displays: {:?}", connected));
        if connected.is_empty() {
            Log::log_debug("No external displays found");
            return report;
        }

        let today: NaiveDate = now.date_naive();
        let season = Season::for_date(today);
        Log::log_debug(&format!("Season: {}", season));

        let targets = map_display_parameters(&connected, self.config, season);
        Log::log_debug(&format!("Parameters map: {:?}", targets));

        let window = match self.solar.solar_window(today) {
            Ok(window) => window,
            Err(e) => {
                Log::log_error(&format!("Cannot compute solar events: {:#}", e));
                report.skipped = targets.into_iter().map(|t| t.id).collect();
                return report;
            }
        };
        Log::log_debug(&format!("Solar window: {:?}", window));

        let time_intervals = build_time_intervals(
            &window,
            self.config.sunrise_sunset_offset,
            self.config.adjust_steps,
        );
        if !is_non_decreasing(&time_intervals) {
            Log::log_warning(&format!(
                "Sunrise/sunset offset of {} minutes overlaps the morning and evening ramps",
                self.config.sunrise_sunset_offset
            ));
        }

        let mut values_by_pair: HashMap<BrightnessPair, Vec<i32>> = HashMap::new();
        for target in targets {
            let brightness_values = values_by_pair
                .entry(target.pair)
                .or_insert_with(|| build_brightness_values(target.pair, self.config.adjust_steps))
                .clone();
            let curve = TransitionCurve {
                time_intervals: time_intervals.clone(),
                brightness_values,
            };
            self.apply(&target, &curve, &now, &mut report);
        }

        report
    }

    fn apply(
        &self,
        target: &DisplayTarget,
        curve: &TransitionCurve,
        now: &DateTime<Tz>,
        report: &mut CycleReport,
    ) {
        let id = &target.id;

        let brightness = match resolve_brightness(curve, now) {
            Ok(brightness) => brightness,
            Err(e) => {
                Log::log_error(&format!("Display {}: {}", id, e));
                report.skipped.push(id.clone());
                return;
            }
        };
        if !(MINIMUM_BRIGHTNESS..=MAXIMUM_BRIGHTNESS).contains(&brightness) {
            Log::log_error(&format!("Invalid brightness value: {}", brightness));
            report.skipped.push(id.clone());
            return;
        }

        let current = self.displays.read_brightness(id);
        if current == brightness {
            Log::log_debug(&format!("Display {} already at {}%", id, brightness));
            report.unchanged.push((id.clone(), brightness));
            return;
        }

        if self.dry_run {
            Log::log_info(&format!(
                "Display {} brightness would be set to: {} (currently {})",
                id, brightness, current
            ));
            report.planned.push((id.clone(), brightness));
            return;
        }

        if let Err(e) = self.displays.write_brightness(id, brightness) {
            Log::log_error(&format!(
                "Error while setting brightness for display {}: {:#}",
                id, e
            ));
            report.skipped.push(id.clone());
            return;
        }

        if let Err(e) = self.notifier.notify(&brightness_message(id, brightness)) {
            Log::log_warning(&format!("{:#}", e));
        }
        Log::log_info(&format!("Display {} brightness is set to: {}", id, brightness));
        report.applied.push((id.clone(), brightness));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MonitorOverride, MonitorTable};
    use crate::display::{ConnectedDisplay, MockDisplayControl};
    use crate::geo::SolarWindow;
    use crate::testing::{FailingSolar, FakeDisplays, FixedSolar, RecordingNotifier};
    use chrono::TimeZone;
    use mockall::predicate::eq;

    fn at(h: u32, m: u32) -> DateTime<Tz> {
        chrono_tz::Europe::Berlin
            .with_ymd_and_hms(2024, 6, 21, h, m, 0)
            .unwrap()
    }

    fn solar() -> FixedSolar {
        FixedSolar(SolarWindow {
            dawn: at(6, 0),
            sunrise: at(7, 0),
            sunset: at(19, 0),
            dusk: at(20, 0),
        })
    }

    fn config() -> Config {
        Config {
            sunrise_sunset_offset: 0,
            adjust_steps: 5,
            ..Config::default()
        }
    }

    #[test]
    fn test_no_displays_is_a_no_op() {
        let displays = FakeDisplays::new();
        let notifier = RecordingNotifier::new();
        let config = config();
        let report = ControlCycle::new(&config, &displays, &solar(), &notifier).run(at(12, 0));
        assert!(report.is_empty());
        assert!(notifier.messages().is_empty());
    }

    #[test]
    fn test_applies_and_notifies_only_on_change() {
        let displays = FakeDisplays::new()
            .with_display("1", "del:dell:abc", 60)
            .with_display("2", "gsm:lg:xyz", 84);
        let notifier = RecordingNotifier::new();
        let config = config();

        // Summer default pair (100, 60): 06:30 falls on the third morning step
        let report = ControlCycle::new(&config, &displays, &solar(), &notifier).run(at(6, 30));

        assert_eq!(report.applied, vec![("1".to_string(), 84)]);
        assert_eq!(report.unchanged, vec![("2".to_string(), 84)]);
        assert_eq!(displays.writes(), vec![("1".to_string(), 84)]);
        assert_eq!(notifier.messages(), vec!["Display 1: 84%".to_string()]);
    }

    #[test]
    fn test_override_pair_is_used_for_matching_display() {
        let displays = FakeDisplays::new()
            .with_display("1", "del:dell:abc123", 0)
            .with_display("2", "gsm:lg:xyz", 0);
        let notifier = RecordingNotifier::new();
        let config = Config {
            monitors: MonitorTable(vec![MonitorOverride {
                model: "Dell".to_string(),
                serial: Some("ABC123".to_string()),
                summer: Some(BrightnessPair::new(50, 10)),
                winter: None,
            }]),
            ..config()
        };

        let report = ControlCycle::new(&config, &displays, &solar(), &notifier).run(at(12, 0));

        assert_eq!(
            report.applied,
            vec![("1".to_string(), 50), ("2".to_string(), 100)]
        );
    }

    #[test]
    fn test_write_failure_does_not_stop_other_displays() {
        let displays = FakeDisplays::new()
            .with_display("1", "a:b:c", 0)
            .with_display("2", "d:e:f", 0)
            .with_failing_writes("1");
        let notifier = RecordingNotifier::new();
        let config = config();

        let report = ControlCycle::new(&config, &displays, &solar(), &notifier).run(at(23, 0));

        assert_eq!(report.skipped, vec!["1".to_string()]);
        assert_eq!(report.applied, vec![("2".to_string(), 60)]);
        assert_eq!(notifier.messages(), vec!["Display 2: 60%".to_string()]);
    }

    #[test]
    fn test_out_of_range_target_is_skipped() {
        let displays = FakeDisplays::new().with_display("1", "a:b:c", 50);
        let notifier = RecordingNotifier::new();
        // Bypasses validation on purpose
        let config = Config {
            default: crate::config::SeasonTable {
                summer: BrightnessPair::new(150, 60),
                winter: BrightnessPair::new(90, 60),
            },
            ..config()
        };

        let report = ControlCycle::new(&config, &displays, &solar(), &notifier).run(at(12, 0));

        assert_eq!(report.skipped, vec!["1".to_string()]);
        assert!(displays.writes().is_empty());
    }

    #[test]
    fn test_notification_failure_is_not_fatal() {
        let displays = FakeDisplays::new().with_display("1", "a:b:c", 0);
        let notifier = RecordingNotifier::failing();
        let config = config();

        let report = ControlCycle::new(&config, &displays, &solar(), &notifier).run(at(12, 0));

        assert_eq!(report.applied, vec![("1".to_string(), 100)]);
        assert_eq!(displays.brightness("1"), Some(100));
    }

    #[test]
    fn test_solar_failure_skips_cycle() {
        let displays = FakeDisplays::new().with_display("1", "a:b:c", 0);
        let notifier = RecordingNotifier::new();
        let config = config();

        let report = ControlCycle::new(&config, &displays, &FailingSolar, &notifier).run(at(12, 0));

        assert_eq!(report.skipped, vec!["1".to_string()]);
        assert!(displays.writes().is_empty());
    }

    #[test]
    fn test_dry_run_leaves_displays_alone() {
        let displays = FakeDisplays::new().with_display("1", "a:b:c", 0);
        let notifier = RecordingNotifier::new();
        let config = config();

        let report = ControlCycle::new(&config, &displays, &solar(), &notifier)
            .dry_run(true)
            .run(at(12, 0));

        assert_eq!(report.planned, vec![("1".to_string(), 100)]);
        assert!(displays.writes().is_empty());
        assert!(notifier.messages().is_empty());
    }

    #[test]
    fn test_unchanged_display_is_never_written() {
        let mut mock = MockDisplayControl::new();
        mock.expect_list_displays()
            .returning(|| vec![ConnectedDisplay::new("3")]);
        mock.expect_read_brightness()
            .with(eq("3"))
            .times(1)
            .returning(|_| 100);
        mock.expect_write_brightness().never();

        let notifier = RecordingNotifier::new();
        let config = config();
        let report = ControlCycle::new(&config, &mock, &solar(), &notifier).run(at(12, 0));

        assert_eq!(report.unchanged, vec![("3".to_string(), 100)]);
    }

    #[test]
    fn test_before_dawn_uses_night_brightness() {
        let mut mock = MockDisplayControl::new();
        mock.expect_list_displays()
            .returning(|| vec![ConnectedDisplay::new("1")]);
        mock.expect_read_brightness().returning(|_| 0);
        mock.expect_write_brightness()
            .with(eq("1"), eq(60))
            .times(1)
            .returning(|_, _| Ok(()));

        let notifier = RecordingNotifier::new();
        let config = config();
        ControlCycle::new(&config, &mock, &solar(), &notifier).run(at(3, 0));
    }
}
