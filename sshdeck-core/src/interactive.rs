//! Line-oriented interactive shell.
//!
//! The loop reads one local line, sends it, waits for the settle strategy,
//! drains whatever the remote produced and prints it with the echo removed.
//! There is no framing on the shell stream, so "the command finished" is
//! only ever approximated by the settle step.

use std::collections::VecDeque;
use std::io::{self, Write};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::channel::{RemoteSession, ShellChannel};
use crate::drain::OutputDrainer;
use crate::echo::{EchoFilter, EchoMode};
use crate::error::{SessionError, SessionResult};
use crate::logger::SessionLogger;
use crate::settle::SettleStrategy;

/// Source of local input lines
#[async_trait]
pub trait LineSource: Send {
    /// Next line without its terminator, or `None` at end of input
    async fn next_line(&mut self) -> io::Result<Option<String>>;
}

/// Lines read from the process's standard input
pub struct StdinLines {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinLines {
    /// Wraps tokio's stdin
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinLines {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LineSource for StdinLines {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await
    }
}

#[async_trait]
impl LineSource for VecDeque<String> {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.pop_front())
    }
}

/// Returns true for `exit` or `quit` in any letter case
#[must_use]
pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim_end_matches(['\r', '\n']);
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

/// Tunables for [`InteractiveSession`]
pub struct InteractiveOptions {
    /// Wait before the first drain after opening the shell
    pub banner_settle: SettleStrategy,
    /// Wait after sending the initial command
    pub initial_settle: SettleStrategy,
    /// Wait after each command from the loop
    pub command_settle: SettleStrategy,
    /// Removes the remote echo from drained output
    pub echo: Box<dyn EchoFilter>,
    /// Drainer used after every settle
    pub drainer: OutputDrainer,
}

impl Default for InteractiveOptions {
    fn default() -> Self {
        Self {
            banner_settle: SettleStrategy::fixed_secs(2),
            initial_settle: SettleStrategy::fixed_secs(1),
            command_settle: SettleStrategy::fixed_secs(1),
            echo: Box::new(EchoMode::Full),
            drainer: OutputDrainer::new(),
        }
    }
}

impl InteractiveOptions {
    /// Uses `strategy` for every command exchange (initial and loop)
    #[must_use]
    pub const fn with_command_settle(mut self, strategy: SettleStrategy) -> Self {
        self.initial_settle = strategy;
        self.command_settle = strategy;
        self
    }

    /// Replaces the echo filter
    #[must_use]
    pub fn with_echo(mut self, echo: impl EchoFilter + 'static) -> Self {
        self.echo = Box::new(echo);
        self
    }
}

/// What happened during a completed session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSummary {
    /// Lines sent to the remote, including the initial command
    pub commands_sent: usize,
}

/// Drives an interactive shell over a session
pub struct InteractiveSession<'a> {
    logger: &'a SessionLogger,
    options: InteractiveOptions,
}

impl<'a> InteractiveSession<'a> {
    /// Creates a session driver writing diagnostics to `logger`
    #[must_use]
    pub const fn new(logger: &'a SessionLogger, options: InteractiveOptions) -> Self {
        Self { logger, options }
    }

    /// Runs the read-send-settle-drain loop until `exit`/`quit` is entered.
    ///
    /// `initial`, when non-blank, is sent once before the loop starts; if it
    /// is itself `exit`/`quit` the session ends without sending anything.
    /// The session is closed on every return path.
    ///
    /// # Errors
    ///
    /// - [`SessionError::UserAbort`] when local input ends before `exit`
    /// - [`SessionError::Io`] when local input or `out` fails
    /// - any transport error from the shell channel
    pub async fn run<S, L, W>(
        &self,
        session: &mut S,
        initial: Option<&str>,
        input: &mut L,
        out: &mut W,
    ) -> SessionResult<SessionSummary>
    where
        S: RemoteSession,
        L: LineSource + ?Sized,
        W: Write,
    {
        let result = self.drive(session, initial, input, out).await;
        session.close().await;

        match &result {
            Ok(summary) => self.logger.info(format!(
                "Session closed by user after {} command(s)",
                summary.commands_sent
            )),
            Err(SessionError::UserAbort(reason)) => {
                self.logger.warn(format!("Session aborted: {reason}"));
            }
            Err(e) => self
                .logger
                .error(format!("Interactive session failed [{}]: {e}", e.kind())),
        }
        result
    }

    async fn drive<S, L, W>(
        &self,
        session: &mut S,
        initial: Option<&str>,
        input: &mut L,
        out: &mut W,
    ) -> SessionResult<SessionSummary>
    where
        S: RemoteSession,
        L: LineSource + ?Sized,
        W: Write,
    {
        let host = session.host().to_string();
        let mut shell = session.open_shell().await?;
        let result = self
            .converse(&mut shell, &host, initial, input, out)
            .await;
        shell.close().await;
        result
    }

    async fn converse<C, L, W>(
        &self,
        shell: &mut C,
        host: &str,
        initial: Option<&str>,
        input: &mut L,
        out: &mut W,
    ) -> SessionResult<SessionSummary>
    where
        C: ShellChannel + ?Sized,
        L: LineSource + ?Sized,
        W: Write,
    {
        let banner = self
            .options
            .banner_settle
            .settle_and_drain(shell, &self.options.drainer)
            .await;
        let banner = String::from_utf8_lossy(&banner);
        self.logger.info(format!("Server banner:\n{banner}"));

        writeln!(out, "Successful connection to server {host}")?;
        writeln!(out, "Type exit or quit to end the session.")?;
        write!(out, "{banner}")?;
        out.flush()?;

        let mut summary = SessionSummary::default();

        if let Some(command) = initial.filter(|c| !c.trim().is_empty()) {
            writeln!(out, "{command}")?;
            if is_exit_command(command) {
                return Ok(summary);
            }
            self.exchange(shell, command, self.options.initial_settle, out)
                .await?;
            summary.commands_sent += 1;
        }

        loop {
            let Some(line) = input.next_line().await? else {
                return Err(SessionError::UserAbort(
                    "end of input before exit".to_string(),
                ));
            };
            if is_exit_command(&line) {
                return Ok(summary);
            }
            self.exchange(shell, &line, self.options.command_settle, out)
                .await?;
            summary.commands_sent += 1;
        }
    }

    /// Sends one line, settles, drains and prints the echo-stripped output
    async fn exchange<C, W>(
        &self,
        shell: &mut C,
        command: &str,
        settle: SettleStrategy,
        out: &mut W,
    ) -> SessionResult<()>
    where
        C: ShellChannel + ?Sized,
        W: Write,
    {
        let sent = format!("{command}\n");
        shell.send(sent.as_bytes()).await?;
        self.logger.info(format!("COMMAND: {command}"));

        let raw = settle.settle_and_drain(shell, &self.options.drainer).await;
        let raw = String::from_utf8_lossy(&raw);

        write!(out, "{}", self.options.echo.strip(&sent, &raw))?;
        out.flush()?;
        self.logger.info(format!("OUTPUT:\n{raw}"));
        Ok(())
    }
}
