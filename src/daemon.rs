//! Application startup, the scheduling loop and shutdown.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::args::Cli;
use crate::config::Config;
use crate::constants::*;
use crate::cycle::{ControlCycle, CycleReport};
use crate::display::DdcutilController;
use crate::geo::{SunriseProvider, resolve_timezone};
use crate::lock::{LockError, PidFileLock};
use crate::logger::Log;
use crate::notify::{LogNotifier, Notifier, default_notifier};
use crate::process::ProcProbe;
use crate::scheduler::{Scheduler, TriggerOutcome};
use crate::signals::setup_signal_handler;

const CHECK_INTERVAL: Duration = Duration::from_secs(CHECK_INTERVAL_SECS);

/// Run the application with parsed arguments.
///
/// Startup order: logging, signal handling, single-instance lock,
/// configuration, then either a single cycle (`--once`) or the scheduling
/// loop until SIGINT/SIGTERM. Signal handling is in place before the lock is
/// taken, so an interrupt at any later point still unwinds through the lock
/// guard. Fatal errors are logged while the log file is still open.
///
/// # Returns
/// The process exit status
pub fn run(cli: Cli) -> i32 {
    Log::set_debug(cli.verbose);

    let log_path = cli.log_dir().join(LOG_FILE_NAME);
    let log_guard = match Log::start_file_logging(&log_path) {
        Ok(guard) => Some(guard),
        Err(e) => {
            Log::log_warning(&format!(
                "Cannot write log file {}: {:#}",
                log_path.display(),
                e
            ));
            None
        }
    };

    Log::log_version();
    if cli.verbose {
        Log::log_debug("Debug mode enabled");
    }

    let logged_to = log_guard.as_ref().map(|_| log_path.as_path());
    let code = match start(&cli, logged_to) {
        Ok(code) => code,
        Err(e) => {
            Log::log_pipe();
            Log::log_critical(&format!("{:#}", e));
            EXIT_FAILURE
        }
    };

    Log::log_end();
    drop(log_guard);
    code
}

fn start(cli: &Cli, log_path: Option<&Path>) -> Result<i32> {
    let running = setup_signal_handler()?;

    let lock = PidFileLock::new(PidFileLock::<ProcProbe>::default_path()?, ProcProbe);
    let _lock_guard = match lock.acquire() {
        Ok(guard) => guard,
        Err(e @ LockError::AlreadyRunning { .. }) => {
            Log::log_critical(&e.to_string());
            return Ok(e.exit_code());
        }
        Err(e) => return Err(e).context("Failed to create lock file"),
    };
    Log::log_decorated(&format!("Lock acquired at {}", describe_path(lock.path())));
    if let Some(path) = log_path {
        Log::log_decorated(&format!("Logging to {}", describe_path(path)));
    }

    let config_path = Config::config_path()?;
    let config = match Config::resolve(&config_path, &cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            Log::log_critical(&e.to_string());
            return Ok(EXIT_FAILURE);
        }
    };
    config.log_config(&config_path);

    let timezone = resolve_timezone(&config.timezone, config.latitude, config.longitude);
    let solar = SunriseProvider::new(config.latitude, config.longitude, timezone)?;
    let displays = DdcutilController::new();
    let notifier: Box<dyn Notifier> = if cli.dry_run {
        Box::new(LogNotifier)
    } else {
        default_notifier()
    };
    let cycle = ControlCycle::new(&config, &displays, &solar, notifier.as_ref()).dry_run(cli.dry_run);

    if cli.once {
        // A signal received meanwhile only ends the loop; the single cycle completes
        log_report(&cycle.run(now_in(timezone)));
        return Ok(0);
    }

    let scheduler = Scheduler::new(config.cron_interval);
    Log::log_block_start(&format!(
        "Checking brightness every {} minutes",
        scheduler.interval_minutes()
    ));

    run_loop(&scheduler, &running, timezone, |now| log_report(&cycle.run(now)));

    Log::log_block_start("Shutting down");
    Ok(0)
}

/// Trigger `job` now and then at every scheduled fire time until `running` clears.
///
/// Nothing runs if `running` is already cleared, e.g. by a signal during startup.
pub fn run_loop<F>(scheduler: &Scheduler, running: &AtomicBool, timezone: Tz, job: F)
where
    F: Fn(DateTime<Tz>),
{
    let fire = |now: DateTime<Tz>| {
        if scheduler.trigger(|| job(now)) == TriggerOutcome::Skipped {
            Log::log_warning("Previous brightness check still running, skipping this one");
        }
    };

    while running.load(Ordering::SeqCst) {
        fire(now_in(timezone));
        let next = scheduler.next_fire_after(now_in(timezone));
        Log::log_debug(&format!("Next check at {}", next.format("%H:%M:%S")));
        if !sleep_until(next.with_timezone(&Utc), running) {
            break;
        }
    }
}

/// Sleep until `deadline`, waking regularly to check `running`.
///
/// # Returns
/// `true` if the deadline was reached, `false` if `running` was cleared first
pub fn sleep_until(deadline: DateTime<Utc>, running: &AtomicBool) -> bool {
    loop {
        if !running.load(Ordering::SeqCst) {
            return false;
        }
        let Ok(remaining) = (deadline - Utc::now()).to_std() else {
            return true;
        };
        if remaining.is_zero() {
            return true;
        }
        thread::sleep(remaining.min(CHECK_INTERVAL));
    }
}

fn now_in(timezone: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&timezone)
}

fn log_report(report: &CycleReport) {
    if !report.is_empty() {
        Log::log_debug(&format!("Cycle report: {:?}", report));
    }
}

/// Shorten paths under the home directory to `~/...` for display.
pub fn describe_path(path: &Path) -> String {
    match dirs::home_dir() {
        Some(home) => match path.strip_prefix(&home) {
            Ok(rest) => format!("~/{}", rest.display()),
            Err(_) => path.display().to_string(),
        },
        None => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Instant;

    #[test]
    fn test_sleep_until_past_deadline_returns_immediately() {
        let running = AtomicBool::new(true);
        let start = Instant::now();
        assert!(sleep_until(Utc::now() - chrono::Duration::seconds(5), &running));
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_sleep_until_short_deadline() {
        let running = AtomicBool::new(true);
        assert!(sleep_until(Utc::now() + chrono::Duration::milliseconds(50), &running));
    }

    #[test]
    fn test_sleep_until_stops_when_not_running() {
        let running = AtomicBool::new(false);
        assert!(!sleep_until(Utc::now() + chrono::Duration::hours(1), &running));
    }

    #[test]
    fn test_run_loop_fires_once_then_stops() {
        let scheduler = Scheduler::new(10);
        let running = AtomicBool::new(true);
        let calls = Cell::new(0);

        run_loop(&scheduler, &running, Tz::UTC, |_| {
            calls.set(calls.get() + 1);
            running.store(false, Ordering::SeqCst);
        });

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_run_loop_skips_when_already_stopped() {
        let scheduler = Scheduler::new(10);
        let running = AtomicBool::new(false);
        let calls = Cell::new(0);

        run_loop(&scheduler, &running, Tz::UTC, |_| calls.set(calls.get() + 1));

        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_describe_path_outside_home() {
        assert_eq!(describe_path(Path::new("/tmp/x.log")), "/tmp/x.log");
    }
}
