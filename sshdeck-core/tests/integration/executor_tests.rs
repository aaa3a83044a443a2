//! One-shot command execution against scripted sessions

use std::fs;
use std::time::Duration;

use sshdeck_core::{
    CommandExecutor, ConnectOptions, ConnectionFactory, ErrorStreamPolicy, ExecutorOptions,
    LogConfig, RemoteEndpoint, SessionError, SessionLogger, SettleStrategy,
};
use tempfile::TempDir;

use super::mock_session::ScriptedSession;

fn instant_options() -> ExecutorOptions {
    ExecutorOptions {
        verbose_settle: SettleStrategy::Fixed(Duration::ZERO),
        ..ExecutorOptions::default()
    }
}

fn printed(out: &[u8]) -> String {
    String::from_utf8_lossy(out).into_owned()
}

#[tokio::test]
async fn echo_hello_yields_output_and_no_error() {
    let logger = SessionLogger::disabled();
    let executor = CommandExecutor::new(&logger, instant_options());
    let mut session = ScriptedSession::new("10.0.0.5").with_command_output("hello\n", "", Some(0));
    let wire = session.wire();
    let mut out = Vec::new();

    let result = executor
        .execute(&mut session, "echo hello", false, &mut out)
        .await
        .unwrap();

    assert!(result.output.contains("hello"));
    assert!(result.error.is_empty());
    assert!(executor.succeeded(&result));

    let wire = wire.lock().unwrap();
    assert_eq!(wire.commands, ["echo hello"]);
    assert_eq!(wire.shells_opened, 0);
    assert_eq!(wire.session_closes, 1);

    let printed = printed(&out);
    assert!(printed.contains("Running command \"echo hello\""));
    assert!(printed.contains("Please wait..."));
    assert!(printed.contains("hello"));
    assert!(!printed.contains("Command error:"));
}

#[tokio::test]
async fn uptime_scenario_keeps_output_verbatim() {
    let logger = SessionLogger::disabled();
    let executor = CommandExecutor::new(&logger, instant_options());
    let uptime = " 10:01:02 up 3 days,  1 user,  load average: 0.00, 0.01, 0.05\n";
    let mut session = ScriptedSession::new("10.0.0.5").with_command_output(uptime, "", Some(0));
    let mut out = Vec::new();

    let result = executor
        .execute(&mut session, "uptime", false, &mut out)
        .await
        .unwrap();

    assert_eq!(result.output, uptime);
    assert_eq!(result.error, "");
    assert_eq!(result.exit_status, Some(0));
}

#[tokio::test]
async fn empty_command_touches_nothing_but_still_closes() {
    let logger = SessionLogger::disabled();
    let executor = CommandExecutor::new(&logger, instant_options());
    let mut session = ScriptedSession::new("10.0.0.5");
    let wire = session.wire();
    let mut out = Vec::new();

    for command in ["", "   "] {
        let result = executor.execute(&mut session, command, true, &mut out).await;
        assert!(matches!(result, Err(SessionError::EmptyCommand)));
    }

    let wire = wire.lock().unwrap();
    assert!(wire.commands.is_empty());
    assert_eq!(wire.shells_opened, 0);
    assert_eq!(wire.session_closes, 2);
    assert!(out.is_empty());
}

#[tokio::test]
async fn empty_command_is_rejected_before_connecting() {
    let logger = SessionLogger::disabled();
    let executor = CommandExecutor::new(&logger, instant_options());
    let factory = ConnectionFactory::new(ConnectOptions::default()).unwrap();
    // Unroutable: any connection attempt would hang far past the assertion.
    let endpoint = RemoteEndpoint::new("10.255.255.1", 22, "ops").with_password("x");
    let mut out = Vec::new();

    let result = tokio::time::timeout(
        Duration::from_secs(1),
        executor.connect_and_execute(&factory, &endpoint, "", false, &mut out),
    )
    .await
    .expect("empty command must not wait on the network");

    assert!(matches!(result, Err(SessionError::EmptyCommand)));
    assert!(factory.known_hosts().is_empty());
}

#[tokio::test]
async fn verbose_reads_banner_on_a_separate_shell() {
    let logger = SessionLogger::disabled();
    let executor = CommandExecutor::new(&logger, instant_options());
    let mut session = ScriptedSession::new("10.0.0.5")
        .with_banner("Welcome to web01\r\n$ ")
        .with_command_output("ok\n", "", Some(0));
    let wire = session.wire();
    let mut out = Vec::new();

    let result = executor
        .execute(&mut session, "true", true, &mut out)
        .await
        .unwrap();
    assert_eq!(result.output, "ok\n");

    let wire = wire.lock().unwrap();
    assert_eq!(wire.shells_opened, 1);
    assert_eq!(wire.shells_closed, 1);
    assert!(wire.sent.is_empty(), "banner read must not send anything");
    assert_eq!(wire.commands, ["true"]);

    let printed = printed(&out);
    let banner_at = printed.find("Welcome to web01").unwrap();
    let running_at = printed.find("Running command").unwrap();
    assert!(banner_at < running_at);
    assert!(printed.contains("Successful connection to server 10.0.0.5"));
}

#[tokio::test]
async fn error_stream_is_advisory_by_default() {
    let logger = SessionLogger::disabled();
    let executor = CommandExecutor::new(&logger, instant_options());
    let mut session =
        ScriptedSession::new("10.0.0.5").with_command_output("", "warning: deprecated\n", Some(0));
    let mut out = Vec::new();

    let result = executor
        .execute(&mut session, "legacy-tool", false, &mut out)
        .await
        .unwrap();

    assert_eq!(result.error, "warning: deprecated\n");
    assert!(executor.succeeded(&result));
    let printed = printed(&out);
    assert!(printed.contains("Command error:"));
    assert!(printed.contains("warning: deprecated"));
}

#[tokio::test]
async fn error_stream_fails_under_fatal_policy() {
    let logger = SessionLogger::disabled();
    let options = ExecutorOptions {
        error_policy: ErrorStreamPolicy::Fatal,
        ..instant_options()
    };
    let executor = CommandExecutor::new(&logger, options);
    let mut session =
        ScriptedSession::new("10.0.0.5").with_command_output("", "permission denied\n", Some(1));
    let mut out = Vec::new();

    let result = executor
        .execute(&mut session, "cat /etc/shadow", false, &mut out)
        .await
        .unwrap();

    assert!(!executor.succeeded(&result));
}

#[tokio::test]
async fn transport_failure_is_logged_and_session_closed() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("run.log");
    let logger = SessionLogger::open(&LogConfig::new(&log_path)).unwrap();
    let executor = CommandExecutor::new(&logger, instant_options());
    let mut session = ScriptedSession::new("10.0.0.5").failing_commands("channel refused");
    let wire = session.wire();
    let mut out = Vec::new();

    let result = executor
        .execute(&mut session, "uptime", false, &mut out)
        .await;
    assert!(matches!(result, Err(SessionError::Protocol(_))));
    assert_eq!(wire.lock().unwrap().session_closes, 1);

    logger.close().unwrap();
    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains(" - ERROR - Command failed [protocol]: Protocol failure: channel refused"));
    assert!(log.contains(" - INFO - Connection closed."));
}

#[tokio::test]
async fn successful_run_is_logged_in_order() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("run.log");
    let logger = SessionLogger::open(&LogConfig::new(&log_path)).unwrap();
    let executor = CommandExecutor::new(&logger, instant_options());
    let mut session = ScriptedSession::new("10.0.0.5").with_command_output("hello\n", "", None);
    let mut out = Vec::new();

    executor
        .execute(&mut session, "echo hello", false, &mut out)
        .await
        .unwrap();
    logger.close().unwrap();

    let log = fs::read_to_string(&log_path).unwrap();
    let running = log.find("Running command: echo hello").unwrap();
    let output = log.find("Command output:").unwrap();
    let closed = log.find("Connection closed.").unwrap();
    assert!(running < output && output < closed);
}
