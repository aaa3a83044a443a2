//! russh-backed [`RemoteSession`] and [`ShellChannel`] implementations.

use async_trait::async_trait;
use futures::FutureExt;
use russh::client::{self, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use tracing::{debug, trace};

use super::host_keys::HostKeyVerifier;
use super::map_transport_error;
use crate::channel::{RemoteOutput, RemoteSession, ShellChannel};
use crate::drain::ChunkSource;
use crate::error::SessionResult;

/// SSH extended data type code for stderr
const EXTENDED_DATA_STDERR: u32 = 1;

/// Authenticated session produced by [`super::ConnectionFactory`]
pub struct SessionHandle {
    handle: client::Handle<HostKeyVerifier>,
    host: String,
    closed: bool,
}

impl SessionHandle {
    pub(super) const fn new(handle: client::Handle<HostKeyVerifier>, host: String) -> Self {
        Self {
            handle,
            host,
            closed: false,
        }
    }

    async fn open_channel(&self) -> SessionResult<Channel<Msg>> {
        self.handle
            .channel_open_session()
            .await
            .map_err(|e| map_transport_error(e, &self.host, None))
    }
}

#[async_trait]
impl RemoteSession for SessionHandle {
    type Shell = RusshShell;

    fn host(&self) -> &str {
        &self.host
    }

    async fn open_shell(&mut self) -> SessionResult<RusshShell> {
        let channel = self.open_channel().await?;
        channel
            .request_pty(false, "xterm", 80, 24, 0, 0, &[])
            .await
            .map_err(|e| map_transport_error(e, &self.host, None))?;
        channel
            .request_shell(false)
            .await
            .map_err(|e| map_transport_error(e, &self.host, None))?;
        debug!(host = %self.host, "Interactive shell opened");
        Ok(RusshShell::new(channel, self.host.clone()))
    }

    async fn run_command(&mut self, command: &str) -> SessionResult<RemoteOutput> {
        let mut channel = self.open_channel().await?;
        channel
            .exec(true, command)
            .await
            .map_err(|e| map_transport_error(e, &self.host, None))?;

        let mut output = RemoteOutput::default();
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => output.stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext } if ext == EXTENDED_DATA_STDERR => {
                    output.stderr.extend_from_slice(data);
                }
                ChannelMsg::ExitStatus { exit_status } => output.exit_status = Some(exit_status),
                ChannelMsg::Close => break,
                _ => {}
            }
        }

        if let Err(e) = channel.close().await {
            trace!(error = %e, "Command channel already closed");
        }
        debug!(
            host = %self.host,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            exit_status = ?output.exit_status,
            "Command finished"
        );
        Ok(output)
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
        {
            debug!(host = %self.host, error = %e, "Disconnect failed");
        }
    }
}

/// Interactive shell channel with a local buffer for partially served data
pub struct RusshShell {
    channel: Channel<Msg>,
    host: String,
    pending: Vec<u8>,
    eof: bool,
}

impl RusshShell {
    const fn new(channel: Channel<Msg>, host: String) -> Self {
        Self {
            channel,
            host,
            pending: Vec::new(),
            eof: false,
        }
    }

    /// Moves every message already queued on the channel into `pending`
    /// without waiting for new ones.
    fn pull_ready(&mut self) {
        while !self.eof {
            // `wait` is a plain queue receive, so dropping it unpolled loses nothing
            let Some(next) = self.channel.wait().now_or_never() else {
                break;
            };
            match next {
                Some(ChannelMsg::Data { ref data } | ChannelMsg::ExtendedData { ref data, .. }) => {
                    self.pending.extend_from_slice(data);
                }
                Some(ChannelMsg::Eof | ChannelMsg::Close) | None => self.eof = true,
                Some(_) => {}
            }
        }
    }
}

impl ChunkSource for RusshShell {
    fn poll_chunk(&mut self, max_len: usize) -> Option<Vec<u8>> {
        if self.pending.is_empty() {
            self.pull_ready();
        }
        if self.pending.is_empty() {
            return None;
        }
        let take = max_len.min(self.pending.len());
        let rest = self.pending.split_off(take);
        Some(std::mem::replace(&mut self.pending, rest))
    }
}

#[async_trait]
impl ShellChannel for RusshShell {
    async fn send(&mut self, data: &[u8]) -> SessionResult<()> {
        self.channel
            .data(data)
            .await
            .map_err(|e| map_transport_error(e, &self.host, None))
    }

    async fn close(&mut self) {
        if let Err(e) = self.channel.close().await {
            trace!(error = %e, "Shell channel already closed");
        }
    }
}
