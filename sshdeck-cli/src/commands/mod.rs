//! Command handler modules for the CLI.

mod completions;
mod manpage;
mod run;
mod scripts;
mod server;

use std::path::Path;

use crate::cli::{Commands, ServerCommands};
use crate::error::CliError;

/// Flags shared by every command
pub struct Globals<'a> {
    /// Custom configuration directory
    pub config_path: Option<&'a Path>,
    /// `-v` count
    pub verbose: u8,
    /// `-q`
    pub quiet: bool,
}

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(globals: &Globals<'_>, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Run(args) => run::cmd_run(globals, args),
        Commands::Server { command } => dispatch_server(globals.config_path, command),
        Commands::Scripts { dir } => scripts::cmd_scripts(globals.config_path, dir.as_deref()),
        Commands::Completions { shell } => completions::cmd_completions(shell),
        Commands::Manpage => manpage::cmd_manpage(),
    }
}

fn dispatch_server(config_path: Option<&Path>, command: ServerCommands) -> Result<(), CliError> {
    match command {
        ServerCommands::Add {
            name,
            host,
            protocol,
            port,
            user,
            password,
            full_access,
            description,
        } => server::cmd_add(
            config_path,
            &name,
            server::AddParams {
                host,
                protocol,
                port,
                user,
                password,
                full_access,
                description,
            },
        ),
        ServerCommands::Update {
            name,
            host,
            protocol,
            port,
            user,
            password,
            full_access,
            description,
        } => server::cmd_update(
            config_path,
            &name,
            sshdeck_core::ServerUpdate {
                host,
                protocol,
                port,
                user,
                password,
                full_access,
                description,
            },
        ),
        ServerCommands::Delete { name } => server::cmd_delete(config_path, &name),
        ServerCommands::List {
            format,
            show_passwords,
        } => server::cmd_list(config_path, format, show_passwords),
        ServerCommands::Show {
            name,
            show_password,
        } => server::cmd_show(config_path, &name, show_password),
    }
}
