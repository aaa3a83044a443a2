//! `sshdeck` CLI - Command-line interface for the `sshdeck` server manager
//!
//! Provides commands for running remote commands and interactive shells over
//! SSH, managing the server registry and listing auxiliary scripts.

mod cli;
mod commands;
mod error;
mod format;
mod util;

use clap::Parser;
use cli::Cli;
use sshdeck_core::tracing::{TracingConfig, init_tracing};

fn main() {
    let cli = Cli::parse();

    if cli.verbose > 0 && !cli.quiet {
        let mut tracing_config = TracingConfig::from_verbosity(cli.verbose);
        // RUST_LOG replaces the -v derived directives
        if let Ok(filter) = std::env::var("RUST_LOG") {
            tracing_config = tracing_config.with_filter(filter);
        }
        if let Err(e) = init_tracing(&tracing_config) {
            eprintln!("[WARNING] {e}");
        }
    }

    let globals = commands::Globals {
        config_path: cli.config.as_deref(),
        verbose: cli.verbose,
        quiet: cli.quiet,
    };
    let result = commands::dispatch(&globals, cli.command);

    if let Err(e) = result {
        if !cli.quiet && !matches!(e, error::CliError::Reported(_)) {
            eprintln!("[ERROR] {e}");
        }
        std::process::exit(e.exit_code());
    }
}
