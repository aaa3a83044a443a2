//! One-shot command execution.
//!
//! [`CommandExecutor`] consumes a connected session, runs a single command
//! and returns its separated output streams. The session is closed on every
//! path out of [`CommandExecutor::execute`].

use std::io::Write;

use crate::channel::{RemoteSession, ShellChannel};
use crate::connection::ConnectionFactory;
use crate::drain::OutputDrainer;
use crate::error::{SessionError, SessionResult};
use crate::logger::SessionLogger;
use crate::models::{CommandResult, ErrorStreamPolicy, RemoteEndpoint};
use crate::settle::SettleStrategy;

/// Settle delay before the verbose banner read
const VERBOSE_SETTLE_SECS: u64 = 3;

/// Tunables for [`CommandExecutor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// Wait before draining the banner channel in verbose mode
    pub verbose_settle: SettleStrategy,
    /// Drainer used for the banner channel
    pub drainer: OutputDrainer,
    /// Whether error-stream text fails the command
    pub error_policy: ErrorStreamPolicy,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            verbose_settle: SettleStrategy::fixed_secs(VERBOSE_SETTLE_SECS),
            drainer: OutputDrainer::new(),
            error_policy: ErrorStreamPolicy::default(),
        }
    }
}

/// Runs one command over a session
pub struct CommandExecutor<'a> {
    logger: &'a SessionLogger,
    options: ExecutorOptions,
}

impl<'a> CommandExecutor<'a> {
    /// Creates an executor writing diagnostics to `logger`
    #[must_use]
    pub const fn new(logger: &'a SessionLogger, options: ExecutorOptions) -> Self {
        Self { logger, options }
    }

    /// Options in use
    #[must_use]
    pub const fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Returns true when `result` counts as success under the configured
    /// error-stream policy
    #[must_use]
    pub fn succeeded(&self, result: &CommandResult) -> bool {
        result.succeeded_under(self.options.error_policy)
    }

    /// Validates `command`, connects, then runs it.
    ///
    /// An empty command is rejected before any network activity.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyCommand`] for a blank command, or any
    /// error from [`ConnectionFactory::connect`] and [`Self::execute`].
    pub async fn connect_and_execute<W: Write>(
        &self,
        factory: &ConnectionFactory,
        endpoint: &RemoteEndpoint,
        command: &str,
        verbose: bool,
        out: &mut W,
    ) -> SessionResult<CommandResult> {
        if is_blank(command) {
            self.logger.warn("No command given, nothing to run");
            return Err(SessionError::EmptyCommand);
        }
        let mut session = factory.connect(endpoint, self.logger).await?;
        self.execute(&mut session, command, verbose, out).await
    }

    /// Runs `command` on `session`, printing progress and output to `out`.
    ///
    /// With `verbose`, a separate shell channel is opened first and whatever
    /// banner text is available after the settle delay is logged and
    /// printed. That read is independent of the command result.
    ///
    /// Text on the error stream is printed as a notice and never turns into
    /// an `Err`; use [`Self::succeeded`] to apply the error-stream policy.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyCommand`] for a blank command (no channel
    /// is opened), or the transport error that interrupted the run. Either
    /// way the session is closed before returning.
    pub async fn execute<S, W>(
        &self,
        session: &mut S,
        command: &str,
        verbose: bool,
        out: &mut W,
    ) -> SessionResult<CommandResult>
    where
        S: RemoteSession,
        W: Write,
    {
        let result = self.run(session, command, verbose, out).await;
        session.close().await;
        self.logger.info("Connection closed.");

        match &result {
            Err(SessionError::EmptyCommand) => {
                self.logger.warn("No command given, nothing to run");
            }
            Err(e) => self
                .logger
                .error(format!("Command failed [{}]: {e}", e.kind())),
            Ok(res) if !self.succeeded(res) => {
                self.logger
                    .error("Command wrote to the error stream (fatal policy)");
            }
            Ok(_) => {}
        }
        result
    }

    async fn run<S, W>(
        &self,
        session: &mut S,
        command: &str,
        verbose: bool,
        out: &mut W,
    ) -> SessionResult<CommandResult>
    where
        S: RemoteSession,
        W: Write,
    {
        if is_blank(command) {
            return Err(SessionError::EmptyCommand);
        }

        if verbose {
            self.read_banner(session, out).await?;
        }

        self.logger.info(format!(
            "Connected successfully. Running command: {command}"
        ));
        writeln!(out, "Running command \"{command}\"")?;
        writeln!(out, "Please wait...")?;
        out.flush()?;

        let raw = session.run_command(command).await?;
        let result = CommandResult::from_streams(&raw.stdout, &raw.stderr, raw.exit_status);

        self.logger.info(format!("Command output:\n{}", result.output));
        if result.has_error_output() {
            self.logger.error(format!("Command error:\n{}", result.error));
            writeln!(out, "Command error:")?;
            writeln!(out, "{}", result.error)?;
        }
        writeln!(out, "{}", result.output)?;
        if let Some(status) = result.exit_status {
            self.logger.debug(format!("Exit status: {status}"));
        }
        out.flush()?;

        Ok(result)
    }

    async fn read_banner<S, W>(&self, session: &mut S, out: &mut W) -> SessionResult<()>
    where
        S: RemoteSession,
        W: Write,
    {
        let mut shell = session.open_shell().await?;
        let banner = self
            .options
            .verbose_settle
            .settle_and_drain(&mut shell, &self.options.drainer)
            .await;
        shell.close().await;

        let text = String::from_utf8_lossy(&banner);
        self.logger.info(format!("Server banner:\n{text}"));
        writeln!(out, "Successful connection to server {}", session.host())?;
        writeln!(out, "{text}")?;
        Ok(())
    }
}

fn is_blank(command: &str) -> bool {
    command.trim().is_empty()
}
