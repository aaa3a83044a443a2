//! Error types for remote session operations.

use thiserror::Error;

/// Errors raised while connecting to, or working with, a remote session.
///
/// Every session entry point reports failures through this type; callers
/// pick an exit code per variant instead of collapsing them into one.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The remote rejected the supplied credentials
    #[error("Authentication failed for {user}@{host}")]
    Authentication {
        /// Username that was rejected
        user: String,
        /// Host that rejected it
        host: String,
    },

    /// The remote could not be reached, or the socket failed mid-session
    #[error("Network failure: {0}")]
    Network(String),

    /// The remote host key did not pass the configured policy
    #[error("Host key rejected for {host}: {reason}")]
    HostKeyRejected {
        /// `host:port` whose key was rejected
        host: String,
        /// Why the key was rejected
        reason: String,
    },

    /// The SSH layer reported a failure after the socket was up
    #[error("Protocol failure: {0}")]
    Protocol(String),

    /// The local user ended the session in a way other than `exit`/`quit`
    #[error("Session aborted: {0}")]
    UserAbort(String),

    /// A command was required but none was supplied
    #[error("No command given")]
    EmptyCommand,

    /// Local I/O (console or input) failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// Short machine-friendly label used in error log records
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "authentication",
            Self::Network(_) => "network",
            Self::HostKeyRejected { .. } => "host_key",
            Self::Protocol(_) => "protocol",
            Self::UserAbort(_) => "user_abort",
            Self::EmptyCommand => "empty_command",
            Self::Io(_) => "io",
        }
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
