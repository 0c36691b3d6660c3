//! `automac` binary entry point.
use std::io::Write as _;
use std::process::ExitCode;
use std::sync::Arc;

use automac_cli::logging::{self, Log, Logger};
use automac_cli::{cli, commands};
use clap::Parser;

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();

    let command = match &args.command {
        cli::Command::Apply(_) => "apply",
        cli::Command::CheckConfig(_) => "check-config",
        cli::Command::Version => {
            commands::version::run();
            return ExitCode::SUCCESS;
        }
    };
    logging::init_subscriber(args.verbose, command);
    let log = Arc::new(Logger::new(command));

    let result = match &args.command {
        cli::Command::Apply(opts) => commands::apply::run(opts, &log),
        cli::Command::CheckConfig(opts) => {
            commands::check_config::run(opts, &(Arc::clone(&log) as Arc<dyn Log>))
        }
        cli::Command::Version => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&format!("{e:#}"));
            writeln!(std::io::stdout(), "ABORT: {e:#}").ok();
            ExitCode::FAILURE
        }
    }
}
