use std::process::ExitCode;

use clap::Parser;
use tree_scope::{Cli, commands, logging};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // help and version land here too and are not failures
            let failed = e.use_stderr();
            e.print().ok();
            return if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    match commands::inspect::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "inspect failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
