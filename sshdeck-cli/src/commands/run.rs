//! Remote session command: one-shot command execution or interactive shell.

use std::io;

use secrecy::SecretString;
use sshdeck_core::registry::is_ip_address;
use sshdeck_core::{
    AppSettings, CommandExecutor, ConfigManager, ConnectionFactory, DEFAULT_SSH_PORT,
    InteractiveOptions, InteractiveSession, LogConfig, RemoteEndpoint, ServerRegistry,
    SessionError, SessionLogger, SessionResult, StdinLines,
};

use super::Globals;
use crate::cli::RunArgs;
use crate::error::CliError;
use crate::util::{create_config_manager, print_banner, print_goodbye, sysinfo};

const EMPTY_COMMAND_NOTICE: &str = "No command given: please enter a command with -c/--cmd";

/// Run command handler
///
/// A failure is reported on stdout ahead of the goodbye line and returned
/// as [`CliError::Reported`] so it is not printed twice.
pub fn cmd_run(globals: &Globals<'_>, args: RunArgs) -> Result<(), CliError> {
    if !globals.quiet {
        print_banner();
        if globals.verbose > 0 {
            println!("{}", sysinfo());
        }
    }

    let result = run_session(globals, args);

    if !globals.quiet {
        if let Err(e) = &result {
            println!("[ERROR] {e}");
        }
        print_goodbye();
    }
    result.map_err(|e| CliError::Reported(Box::new(e)))
}

fn run_session(globals: &Globals<'_>, args: RunArgs) -> Result<(), CliError> {
    let config_manager = create_config_manager(globals.config_path)?;
    let loaded = config_manager.load_settings();

    let fallback = AppSettings::default();
    let log_config = log_config(&config_manager, loaded.as_ref().unwrap_or(&fallback), &args);
    let logger = SessionLogger::open(&log_config)?;
    if let Some(path) = logger.path() {
        tracing::info!("Session log: {}", path.display());
    }

    let status = match loaded {
        Ok(settings) => drive_session(globals, args, &config_manager, settings, &logger),
        Err(e) => Err(logged(&logger, e.into())),
    };

    let closed = logger.close();
    status?;
    closed?;
    Ok(())
}

/// `--log-file` wins; otherwise `-l` or `logging.always` log into the
/// configured directory under a timestamped name.
fn log_config(
    config_manager: &ConfigManager,
    settings: &AppSettings,
    args: &RunArgs,
) -> LogConfig {
    if let Some(path) = args.log_file.as_deref() {
        LogConfig::new(path)
    } else if args.log || settings.logging.always {
        LogConfig::timestamped_in(&config_manager.log_dir(settings))
    } else {
        LogConfig::disabled()
    }
}

/// Records a failure that happened before the session layer could log it
fn logged(logger: &SessionLogger, err: CliError) -> CliError {
    logger.error(format!("Run aborted: {err}"));
    err
}

fn drive_session(
    globals: &Globals<'_>,
    args: RunArgs,
    config_manager: &ConfigManager,
    mut settings: AppSettings,
    logger: &SessionLogger,
) -> Result<(), CliError> {
    apply_overrides(&mut settings, &args);

    let command = args.cmd.clone().unwrap_or_default();
    if !args.interactive && command.trim().is_empty() {
        println!("{EMPTY_COMMAND_NOTICE}");
        return Ok(());
    }

    let endpoint =
        resolve_endpoint(config_manager, &settings, &args).map_err(|e| logged(logger, e))?;
    tracing::debug!(server = %args.server, "Resolved endpoint {endpoint}");

    let factory = ConnectionFactory::new(config_manager.connect_options(&settings))
        .map_err(|e| logged(logger, e.into()))?;
    let executor = CommandExecutor::new(logger, settings.session.executor_options());
    let runtime = tokio::runtime::Runtime::new().map_err(|e| logged(logger, e.into()))?;

    let outcome = if args.interactive {
        let options = settings.session.interactive_options();
        runtime
            .block_on(run_interactive(
                &factory,
                &endpoint,
                logger,
                options,
                args.cmd.as_deref(),
            ))
            .map(|()| None)
    } else {
        let mut out = io::stdout();
        runtime
            .block_on(executor.connect_and_execute(
                &factory,
                &endpoint,
                &command,
                globals.verbose > 0,
                &mut out,
            ))
            .map(Some)
    };

    match outcome {
        Ok(Some(result)) if !executor.succeeded(&result) => Err(CliError::CommandFailed(
            result.error.trim_end().to_string(),
        )),
        Ok(_) => Ok(()),
        Err(e) => session_end(e),
    }
}

/// End of input and a missing command end the run normally; every other
/// session error fails it.
fn session_end(err: SessionError) -> Result<(), CliError> {
    match err {
        SessionError::UserAbort(reason) => {
            println!("Session ended: {reason}");
            Ok(())
        }
        SessionError::EmptyCommand => {
            println!("{EMPTY_COMMAND_NOTICE}");
            Ok(())
        }
        e => Err(e.into()),
    }
}

async fn run_interactive(
    factory: &ConnectionFactory,
    endpoint: &RemoteEndpoint,
    logger: &SessionLogger,
    options: InteractiveOptions,
    initial: Option<&str>,
) -> SessionResult<()> {
    let mut session = factory.connect(endpoint, logger).await?;
    let mut input = StdinLines::new();
    let mut out = io::stdout();
    InteractiveSession::new(logger, options)
        .run(&mut session, initial, &mut input, &mut out)
        .await?;
    Ok(())
}

/// Folds command-line flags into the loaded settings
fn apply_overrides(settings: &mut AppSettings, args: &RunArgs) {
    if let Some(echo) = args.echo {
        settings.session.echo = echo;
    }
    if let Some(policy) = args.stderr_policy {
        settings.session.error_policy = policy;
    }
    if args.quiescent {
        settings.session.quiescent = true;
    }
    if let Some(policy) = args.host_key_policy {
        settings.connection.host_key_policy = policy;
    }
    if let Some(secs) = args.connect_timeout {
        settings.connection.connect_timeout_secs = Some(secs);
    }
}

/// An IP address is used directly; anything else is looked up in the
/// registry. Explicit flags override registry values.
fn resolve_endpoint(
    config_manager: &ConfigManager,
    settings: &AppSettings,
    args: &RunArgs,
) -> Result<RemoteEndpoint, CliError> {
    let mut endpoint = if is_ip_address(&args.server) {
        RemoteEndpoint::new(&args.server, DEFAULT_SSH_PORT, "")
    } else {
        ServerRegistry::load(config_manager.servers_path(settings))?.resolve_endpoint(&args.server)
    };

    if let Some(port) = args.port {
        endpoint.port = port;
    }
    if let Some(ref user) = args.user {
        endpoint.username.clone_from(user);
    }
    if let Some(ref password) = args.password {
        endpoint = endpoint.with_password(password.as_str());
    } else if args.ask_pass {
        let password = rpassword::prompt_password(format!("{endpoint}'s password: "))
            .map_err(|e| CliError::Usage(format!("Cannot read password: {e}")))?;
        endpoint = endpoint.with_credential(Some(SecretString::from(password)));
    }
    Ok(endpoint)
}
