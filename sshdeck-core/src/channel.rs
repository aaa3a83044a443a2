//! Transport seams between the session logic and the SSH library.
//!
//! [`RemoteSession`] is what a connected session offers to its single
//! consumer; [`ShellChannel`] is an open interactive channel on it. The
//! russh-backed implementations live in [`crate::connection`].

use async_trait::async_trait;

use crate::drain::ChunkSource;
use crate::error::SessionResult;

/// Raw output of a command that ran to completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOutput {
    /// Bytes received on the standard output stream
    pub stdout: Vec<u8>,
    /// Bytes received on the error stream
    pub stderr: Vec<u8>,
    /// Exit status, when the server reported one
    pub exit_status: Option<u32>,
}

/// An interactive channel: pollable for output, writable for input
#[async_trait]
pub trait ShellChannel: ChunkSource + Send {
    /// Sends raw bytes to the remote
    async fn send(&mut self, data: &[u8]) -> SessionResult<()>;

    /// Closes the channel. Best effort; failures are only traced.
    async fn close(&mut self);
}

/// A live, authenticated session owned by exactly one consumer
#[async_trait]
pub trait RemoteSession: Send {
    /// Interactive channel type produced by [`RemoteSession::open_shell`]
    type Shell: ShellChannel + 'static;

    /// Host name the session is connected to
    fn host(&self) -> &str;

    /// Opens a new interactive shell channel
    async fn open_shell(&mut self) -> SessionResult<Self::Shell>;

    /// Runs `command` on its own channel and reads both streams until the
    /// remote closes them. There is no timeout.
    async fn run_command(&mut self, command: &str) -> SessionResult<RemoteOutput>;

    /// Releases the session. Idempotent and best effort.
    async fn close(&mut self);
}
