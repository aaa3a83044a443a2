//! Result of a one-shot remote command.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How text on the remote error stream affects the command outcome.
///
/// The remote exit status is not authoritative here: many commands write
/// harmless diagnostics to stderr, others fail silently. The policy makes
/// that call explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStreamPolicy {
    /// Error-stream text is shown as a notice and never fails the command
    #[default]
    Advisory,
    /// Any non-blank error-stream text fails the command
    Fatal,
}

impl FromStr for ErrorStreamPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "advisory" => Ok(Self::Advisory),
            "fatal" => Ok(Self::Fatal),
            _ => Err(format!("Unknown error stream policy: {s}")),
        }
    }
}

impl fmt::Display for ErrorStreamPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Advisory => write!(f, "advisory"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// Captured output of one remote command
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommandResult {
    /// Standard output, decoded lossily as UTF-8
    pub output: String,
    /// Error stream, decoded lossily as UTF-8
    pub error: String,
    /// Exit status, when the server reported one
    pub exit_status: Option<u32>,
}

impl CommandResult {
    /// Builds a result from raw stream bytes
    #[must_use]
    pub fn from_streams(stdout: &[u8], stderr: &[u8], exit_status: Option<u32>) -> Self {
        Self {
            output: String::from_utf8_lossy(stdout).into_owned(),
            error: String::from_utf8_lossy(stderr).into_owned(),
            exit_status,
        }
    }

    /// Returns true when the error stream carried non-blank text
    #[must_use]
    pub fn has_error_output(&self) -> bool {
        !self.error.trim().is_empty()
    }

    /// Success as inferred from the error stream alone.
    ///
    /// This is an approximation, not a verified exit code.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.has_error_output()
    }

    /// Whether the command counts as successful under `policy`
    #[must_use]
    pub fn succeeded_under(&self, policy: ErrorStreamPolicy) -> bool {
        match policy {
            ErrorStreamPolicy::Advisory => true,
            ErrorStreamPolicy::Fatal => self.is_success(),
        }
    }
}
