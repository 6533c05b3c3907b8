use clap::Parser;

use external_monitor_brightness::args::Cli;
use external_monitor_brightness::daemon;

fn main() {
    let cli = Cli::parse();
    std::process::exit(daemon::run(cli));
}
