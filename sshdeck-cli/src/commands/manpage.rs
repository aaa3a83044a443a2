//! Man page generation via `clap_mangen`.

use clap::CommandFactory;

use crate::cli::Cli;
use crate::error::CliError;

/// Render the `sshdeck(1)` man page to stdout.
pub fn cmd_manpage() -> Result<(), CliError> {
    clap_mangen::Man::new(Cli::command())
        .render(&mut std::io::stdout())
        .map_err(CliError::Io)
}
