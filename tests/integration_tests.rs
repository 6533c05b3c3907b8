//! Integration tests for a full brightness cycle.
//!
//! These tests wire real configuration loading, detection parsing and curve
//! resolution together with in-memory displays, so a complete day can be
//! replayed without DDC/CI hardware.

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

use external_monitor_brightness::config::{BrightnessPair, Config, ConfigError, Overrides};
use external_monitor_brightness::cycle::ControlCycle;
use external_monitor_brightness::display::ddcutil::parse_detect_output;
use external_monitor_brightness::display::map_display_parameters;
use external_monitor_brightness::geo::SolarWindow;
use external_monitor_brightness::season::Season;
use external_monitor_brightness::testing::{FakeDisplays, FixedSolar, RecordingNotifier};

fn create_test_config_file(dir: &std::path::Path, content: &str) -> PathBuf {
    let path = dir.join("config.json");
    fs::write(&path, content).unwrap();
    path
}

fn berlin(month: u32, day: u32, h: u32, m: u32) -> DateTime<Tz> {
    chrono_tz::Europe::Berlin
        .with_ymd_and_hms(2024, month, day, h, m, 0)
        .unwrap()
}

fn midsummer_solar() -> FixedSolar {
    FixedSolar(SolarWindow {
        dawn: berlin(6, 21, 6, 0),
        sunrise: berlin(6, 21, 7, 0),
        sunset: berlin(6, 21, 19, 0),
        dusk: berlin(6, 21, 20, 0),
    })
}

const CONFIG_WITH_OVERRIDES: &str = r#"{
    "city": "Bremen",
    "country": "Germany",
    "timezone": "Europe/Berlin",
    "latitude": 53.075144,
    "longitude": 8.802161,
    "adjust_steps": 5,
    "cron_interval": 12,
    "sunrise_sunset_offset": 0,
    "default": {
        "summer": {"day_brightness": 100, "night_brightness": 60},
        "winter": {"day_brightness": 90, "night_brightness": 60}
    },
    "monitors": {
        "Dell U2720Q": {
            "serial": "ABC 123",
            "summer": {"day_brightness": 80, "night_brightness": 20}
        },
        "Dell U2720Q (desk)": {
            "serial": "abc123",
            "summer": {"day_brightness": 70, "night_brightness": 30}
        }
    }
}"#;

#[test]
#[serial]
fn test_full_day_replay_with_default_pair() {
    let temp_dir = tempdir().unwrap();
    let path = create_test_config_file(temp_dir.path(), r#"{"sunrise_sunset_offset": 0}"#);
    let config = Config::resolve(&path, &Overrides::default()).unwrap();

    let displays = FakeDisplays::new().with_display("1", "gsm:lg:xyz", 0);
    let notifier = RecordingNotifier::new();
    let solar = midsummer_solar();
    let cycle = ControlCycle::new(&config, &displays, &solar, &notifier);

    // Every 12 minutes from 05:48 to 20:12
    let checkpoints = [
        ((5, 48), 60),
        ((6, 0), 68),
        ((6, 12), 68),
        ((6, 24), 76),
        ((6, 36), 84),
        ((6, 48), 92),
        ((7, 0), 100),
        ((18, 0), 100),
        ((19, 0), 92),
        ((19, 12), 92),
        ((19, 48), 68),
        ((20, 0), 60),
        ((20, 12), 60),
    ];
    for ((h, m), expected) in checkpoints {
        cycle.run(berlin(6, 21, h, m));
        assert_eq!(
            displays.brightness("1"),
            Some(expected),
            "brightness at {:02}:{:02}",
            h,
            m
        );
    }

    // Only changes are written and announced
    let written: Vec<i32> = displays.writes().into_iter().map(|(_, v)| v).collect();
    assert_eq!(written, vec![60, 68, 76, 84, 92, 100, 92, 68, 60]);
    assert_eq!(notifier.messages().len(), written.len());
    assert_eq!(notifier.messages()[0], "Display 1: 60%");
}

#[test]
#[serial]
fn test_last_matching_override_wins() {
    let temp_dir = tempdir().unwrap();
    let path = create_test_config_file(temp_dir.path(), CONFIG_WITH_OVERRIDES);
    let config = Config::resolve(&path, &Overrides::default()).unwrap();

    let detected = parse_detect_output(
        "Display 1\n   Monitor:  DEL:DELL U2720Q:ABC 123\n\nDisplay 2\n   Monitor:  GSM:LG:XYZ\n",
    );
    let targets = map_display_parameters(&detected, &config, Season::Summer);

    assert_eq!(targets.len(), 2);
    assert_eq!(targets[0].pair, BrightnessPair::new(70, 30));
    assert_eq!(targets[1].pair, BrightnessPair::new(100, 60));

    // Winter has no override pair, so the default applies to both
    let winter = map_display_parameters(&detected, &config, Season::Winter);
    assert!(winter.iter().all(|t| t.pair == BrightnessPair::new(90, 60)));
}

#[test]
#[serial]
fn test_override_display_follows_its_own_curve() {
    let temp_dir = tempdir().unwrap();
    let path = create_test_config_file(temp_dir.path(), CONFIG_WITH_OVERRIDES);
    let config = Config::resolve(&path, &Overrides::default()).unwrap();

    let displays = FakeDisplays::new()
        .with_display("1", "del:dellu2720q:abc123", 0)
        .with_display("2", "gsm:lg:xyz", 0);
    let notifier = RecordingNotifier::new();
    let solar = midsummer_solar();

    let report = ControlCycle::new(&config, &displays, &solar, &notifier).run(berlin(6, 21, 23, 0));

    assert_eq!(
        report.applied,
        vec![("1".to_string(), 30), ("2".to_string(), 60)]
    );
}

#[test]
#[serial]
fn test_missing_config_uses_defaults_with_overrides() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("does-not-exist.json");
    let overrides = Overrides {
        adjust_steps: Some(3),
        cron_interval: Some(30),
        sunrise_sunset_offset: Some(0),
    };

    let config = Config::resolve(&path, &overrides).unwrap();

    assert_eq!(config.adjust_steps, 3);
    assert_eq!(config.cron_interval, 30);
    assert_eq!(config.sunrise_sunset_offset, 0);
    assert_eq!(config.city, Config::default().city);
}

#[test]
#[serial]
fn test_corrupt_config_falls_back_to_defaults() {
    let temp_dir = tempdir().unwrap();
    let path = create_test_config_file(temp_dir.path(), "{ not json");

    let config = Config::resolve(&path, &Overrides::default()).unwrap();

    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn test_invalid_override_is_fatal() {
    let temp_dir = tempdir().unwrap();
    let path = create_test_config_file(temp_dir.path(), "{}");
    let overrides = Overrides {
        cron_interval: Some(7),
        ..Overrides::default()
    };

    assert_eq!(
        Config::resolve(&path, &overrides),
        Err(ConfigError::InvalidInterval(7))
    );
}
