//! Summer/winter classification used to pick brightness pairs.

use chrono::{Datelike, NaiveDate};
use std::fmt;

use crate::config::{BrightnessPair, MonitorOverride, SeasonTable};
use crate::constants::{SUMMER_END, SUMMER_START};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Season {
    Summer,
    Winter,
}

impl Season {
    /// Classify a calendar date.
    ///
    /// Summer spans March 20 (inclusive) to September 22 (exclusive) of the
    /// date's own year; every other date is winter.
    pub fn for_date(date: NaiveDate) -> Self {
        let key = (date.month(), date.day());
        if SUMMER_START <= key && key < SUMMER_END {
            Season::Summer
        } else {
            Season::Winter
        }
    }

    /// Pick this season's pair from the default table.
    pub fn default_pair(self, table: &SeasonTable) -> BrightnessPair {
        match self {
            Season::Summer => table.summer,
            Season::Winter => table.winter,
        }
    }

    /// Pick this season's pair from a monitor override, if it has one.
    pub fn override_pair(self, monitor: &MonitorOverride) -> Option<BrightnessPair> {
        match self {
            Season::Summer => monitor.summer,
            Season::Winter => monitor.winter,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Summer => f.write_str("summer"),
            Season::Winter => f.write_str("winter"),
        }
    }
}
