//! Assign a day/night brightness pair to every connected display.

use crate::config::{BrightnessPair, Config};
use crate::logger::Log;
use crate::season::Season;

use super::ConnectedDisplay;

/// Brightness pair chosen for one display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTarget {
    pub id: String,
    pub pair: BrightnessPair,
}

/// Map each connected display to its brightness pair for `season`.
///
/// Every display starts from the season's default pair. Each monitor
/// override whose serial occurs in the display's `monitor` field then
/// replaces it, so the last matching override in file order wins. An
/// override without a serial never matches, and a matching override that
/// has no pair for the season leaves the display's pair as it was.
///
/// Serials are compared after lower-casing and removing spaces, the same
/// normalization applied to detection output.
///
/// # Returns
/// One entry per display, in detection order
pub fn map_display_parameters(
    displays: &[ConnectedDisplay],
    config: &Config,
    season: Season,
) -> Vec<DisplayTarget> {
    let default_pair = season.default_pair(&config.default);

    displays
        .iter()
        .map(|display| {
            let mut pair = default_pair;
            for monitor in config.monitors.iter() {
                let Some(serial) = monitor.serial.as_deref() else {
                    continue;
                };
                if !display.monitor().contains(&normalize_serial(serial)) {
                    continue;
                }
                Log::log_debug(&format!(
                    "Display {} matched monitor {}",
                    display.id, monitor.model
                ));
                if let Some(season_pair) = season.override_pair(monitor) {
                    pair = season_pair;
                }
            }
            DisplayTarget {
                id: display.id.clone(),
                pair,
            }
        })
        .collect()
}

fn normalize_serial(serial: &str) -> String {
    serial.to_lowercase().replace(' ', "")
}
