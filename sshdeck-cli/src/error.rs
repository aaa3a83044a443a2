//! CLI error types and exit codes.

use sshdeck_core::{ConfigError, LogError, RegistryError, SessionError};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// Session, configuration, registry or any other runtime failure
    pub const GENERAL_ERROR: i32 = 1;
    /// The invocation itself was unusable
    pub const USAGE_ERROR: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server registry error
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Remote session error
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Session log could not be opened
    #[error("Session log error: {0}")]
    Log(#[from] LogError),

    /// The command ran but wrote to its error stream under the fatal policy
    #[error("Remote command reported errors: {0}")]
    CommandFailed(String),

    /// Invalid invocation detected after argument parsing
    #[error("{0}")]
    Usage(String),

    /// Scripts listing error
    #[error("Scripts error: {0}")]
    Scripts(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Already shown to the user by the command that failed
    #[error(transparent)]
    Reported(Box<CliError>),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: Any session, configuration or registry failure
    /// - 2: Usage error
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Reported(inner) => inner.exit_code(),
            Self::Usage(_) => exit_codes::USAGE_ERROR,
            Self::Config(_)
            | Self::Registry(_)
            | Self::Session(_)
            | Self::Log(_)
            | Self::CommandFailed(_)
            | Self::Scripts(_)
            | Self::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
