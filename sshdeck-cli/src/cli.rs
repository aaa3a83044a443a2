//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use sshdeck_core::registry::parse_yes_no;
use sshdeck_core::{EchoMode, ErrorStreamPolicy, HostKeyPolicy};

/// `sshdeck` command-line interface for managing servers and SSH sessions
#[derive(Parser)]
#[command(name = "sshdeck")]
#[command(author, version, about = "Manage servers and run remote SSH sessions")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(long, global = true, env = "SSHDECK_CONFIG_DIR")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress banners and error messages
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Connect to a server and run a command or an interactive shell
    #[command(about = "Connect to a server by name or IP address")]
    Run(RunArgs),

    /// Manage the server registry
    #[command(about = "Add, update, delete and list registered servers")]
    Server {
        #[command(subcommand)]
        command: ServerCommands,
    },

    /// List the scripts directory
    #[command(about = "List auxiliary scripts")]
    Scripts {
        /// Directory to list instead of the configured one
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Generate shell completions
    #[command(about = "Generate shell completion scripts")]
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate a man page
    #[command(about = "Print the man page to stdout")]
    Manpage,
}

/// Arguments of `run`
#[derive(Args)]
pub struct RunArgs {
    /// Server name from the registry, or an IP address
    #[arg(short, long)]
    pub server: String,

    /// SSH port (default: registry value, or 22)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// SSH username
    #[arg(short, long)]
    pub user: Option<String>,

    /// SSH password
    #[arg(short = 'P', long)]
    pub password: Option<String>,

    /// Prompt for the password on the terminal
    #[arg(long, conflicts_with = "password")]
    pub ask_pass: bool,

    /// Command to execute on the server
    #[arg(short, long = "cmd")]
    pub cmd: Option<String>,

    /// Open an interactive shell
    #[arg(short, long)]
    pub interactive: bool,

    /// Write a session log file
    #[arg(short, long)]
    pub log: bool,

    /// Session log file path (implies --log)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Echo handling in interactive mode (full, none, partial)
    #[arg(long, value_name = "MODE")]
    pub echo: Option<EchoMode>,

    /// Host key policy (accept-new, strict, accept-all)
    #[arg(long, value_name = "POLICY")]
    pub host_key_policy: Option<HostKeyPolicy>,

    /// Whether error-stream output fails the command (advisory, fatal)
    #[arg(long, value_name = "POLICY")]
    pub stderr_policy: Option<ErrorStreamPolicy>,

    /// Wait for output to go quiet instead of fixed delays
    #[arg(long)]
    pub quiescent: bool,

    /// Give up connecting after this many seconds
    #[arg(long, value_name = "SECS")]
    pub connect_timeout: Option<u64>,
}

/// Registry subcommands
#[derive(Subcommand)]
pub enum ServerCommands {
    /// Add a new server
    #[command(about = "Add a new server to the registry")]
    Add {
        /// Server name
        #[arg(short, long)]
        name: String,

        /// IP address
        #[arg(short = 'H', long)]
        host: String,

        /// Protocol label
        #[arg(long, default_value = "ssh")]
        protocol: String,

        /// Port
        #[arg(short, long, default_value_t = sshdeck_core::DEFAULT_SSH_PORT)]
        port: u16,

        /// Login user
        #[arg(short, long)]
        user: String,

        /// Password
        #[arg(short = 'P', long)]
        password: Option<String>,

        /// Mark the account as having full access
        #[arg(short, long)]
        full_access: bool,

        /// Description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Update a server
    #[command(about = "Change fields of a registered server")]
    Update {
        /// Server name
        #[arg(short, long)]
        name: String,

        /// New IP address
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// New protocol label
        #[arg(long)]
        protocol: Option<String>,

        /// New port
        #[arg(short, long)]
        port: Option<u16>,

        /// New login user
        #[arg(short, long)]
        user: Option<String>,

        /// New password
        #[arg(short = 'P', long)]
        password: Option<String>,

        /// Full access (yes or no)
        #[arg(short, long, value_parser = parse_full_access)]
        full_access: Option<bool>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a server
    #[command(about = "Remove a server from the registry")]
    Delete {
        /// Server name
        #[arg(short, long)]
        name: String,
    },

    /// List servers
    #[command(about = "List all registered servers")]
    List {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,

        /// Show stored passwords instead of masking them
        #[arg(long)]
        show_passwords: bool,
    },

    /// Show one server
    #[command(about = "Show details of a registered server")]
    Show {
        /// Server name
        name: String,

        /// Show the stored password instead of masking it
        #[arg(long)]
        show_password: bool,
    },
}

/// Output format for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Boxed text table
    Table,
    /// JSON array
    Json,
}

fn parse_full_access(value: &str) -> Result<bool, String> {
    parse_yes_no(value).ok_or_else(|| format!("expected yes or no, got '{value}'"))
}
