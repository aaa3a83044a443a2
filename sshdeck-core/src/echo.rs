//! Echo suppression for interactive output.
//!
//! A remote shell with a pty echoes each line it receives before printing the
//! command's own output. What exactly comes back depends on the remote, so
//! the stripping rule is a strategy behind [`EchoFilter`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Removes the remote's echo of a sent line from the drained output
pub trait EchoFilter: Send + Sync {
    /// `sent_line` is exactly what was transmitted, trailing newline
    /// included; `received` is the drained text.
    fn strip(&self, sent_line: &str, received: &str) -> String;
}

/// Built-in echo behaviours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EchoMode {
    /// The remote echoes the full line as `line\r\n`: drop the first
    /// `len(sent_line) + 1` characters unconditionally
    #[default]
    Full,
    /// The remote does not echo: pass output through
    None,
    /// Drop only the part of the output that matches the sent line, plus
    /// one line break after it
    Partial,
}

impl EchoMode {
    /// All modes, in display order
    pub const ALL: [Self; 3] = [Self::Full, Self::None, Self::Partial];
}

impl EchoFilter for EchoMode {
    fn strip(&self, sent_line: &str, received: &str) -> String {
        match self {
            Self::Full => strip_full(sent_line, received),
            Self::None => received.to_string(),
            Self::Partial => strip_partial(sent_line, received),
        }
    }
}

impl FromStr for EchoMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "none" | "off" => Ok(Self::None),
            "partial" => Ok(Self::Partial),
            _ => Err(format!("Unknown echo mode: {s}")),
        }
    }
}

impl fmt::Display for EchoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::None => write!(f, "none"),
            Self::Partial => write!(f, "partial"),
        }
    }
}

// Offset is counted in characters, not bytes.
fn strip_full(sent_line: &str, received: &str) -> String {
    let offset = sent_line.chars().count() + 1;
    received.chars().skip(offset).collect()
}

fn strip_partial(sent_line: &str, received: &str) -> String {
    let command = sent_line.trim_end_matches(['\r', '\n']);
    let matched: usize = command
        .chars()
        .zip(received.chars())
        .take_while(|(a, b)| a == b)
        .map(|(_, c)| c.len_utf8())
        .sum();
    if matched == 0 {
        return received.to_string();
    }

    let rest = &received[matched..];
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .or_else(|| rest.strip_prefix('\r'))
        .unwrap_or(rest);
    rest.to_string()
}
