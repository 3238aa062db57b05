// twincam-cli/src/main.rs
//
// Entry point for the `twincam` binary: parses arguments, sets up logging,
// dispatches to the selected command and maps any error to exit status 1.

use clap::Parser;
use owo_colors::OwoColorize;
use std::process;
use twincam_cli::logging::init_logging;
use twincam_cli::{Cli, Commands, run_job, run_probe};

fn main() {
    let cli = Cli::parse();

    let log_dir = match &cli.command {
        Commands::Run(args) => args.log_dir.as_deref(),
        Commands::Probe(_) => None,
    };
    let result = init_logging(log_dir, cli.verbose).and_then(|log_file| {
        if let Some(path) = log_file {
            log::info!("Run log: {}", path.display());
        }
        match cli.command {
            Commands::Run(args) => run_job(args),
            Commands::Probe(args) => run_probe(args),
        }
    });

    if let Err(e) = result {
        log::debug!("Exiting with error: {e:?}");
        if std::env::var_os("NO_COLOR").is_none() {
            eprintln!("{} {e}", "Error:".bright_red().bold());
        } else {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}
