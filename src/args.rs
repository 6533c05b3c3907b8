//! Command-line argument parsing.
//!
//! Numeric options are parsed as plain integers; their allowed ranges are
//! checked together with the config file values so that both sources report
//! the same errors.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Overrides;
use crate::constants::{DEFAULT_LOG_DIR, LOG_DIR_ENV};

/// Keeps external monitor brightness in step with sunrise and sunset.
#[derive(Debug, Parser, PartialEq)]
#[command(name = "external-monitor-brightness", version, about)]
pub struct Cli {
    /// Enable debug output
    #[arg(short, long)]
    pub verbose: bool,

    /// Directory for application.log
    #[arg(short = 'l', long, value_name = "DIR")]
    pub log_directory: Option<PathBuf>,

    /// Number of brightness steps per transition (1-10)
    #[arg(short = 's', long, value_name = "N", allow_negative_numbers = true)]
    pub adjust_steps: Option<i64>,

    /// Minutes between brightness checks (10, 12, 15, 20 or 30)
    #[arg(short = 'i', long, value_name = "MIN", allow_negative_numbers = true)]
    pub cron_interval: Option<i64>,

    /// Minutes after sunrise / before sunset at which transitions end / start (0-120)
    #[arg(short = 'o', long, value_name = "MIN", allow_negative_numbers = true)]
    pub sunrise_sunset_offset: Option<i64>,

    /// Run a single brightness check and exit
    #[arg(long)]
    pub once: bool,

    /// Compute and log brightness targets without changing any display
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Config values given on the command line.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            adjust_steps: self.adjust_steps,
            cron_interval: self.cron_interval,
            sunrise_sunset_offset: self.sunrise_sunset_offset,
        }
    }

    /// Log directory: `--log-directory`, then the environment, then the default.
    pub fn log_dir(&self) -> PathBuf {
        let from_env = std::env::var(LOG_DIR_ENV).ok().filter(|v| !v.is_empty());
        resolve_log_dir(self.log_directory.clone(), from_env)
    }
}

fn resolve_log_dir(flag: Option<PathBuf>, env: Option<String>) -> PathBuf {
    flag.or_else(|| env.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
}
