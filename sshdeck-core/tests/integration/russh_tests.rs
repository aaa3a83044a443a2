//! The russh-backed session against an in-process SSH server on loopback

use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use russh::server::{self, Auth, Msg, Session};
use russh::{Channel, ChannelId, CryptoVec, Pty};
use sshdeck_core::{
    ChunkSource, ConnectOptions, ConnectionFactory, DRAIN_CHUNK_SIZE, HostKeyPolicy,
    RemoteEndpoint, RemoteSession, SessionError, SessionLogger, ShellChannel,
};
use tempfile::TempDir;
use tokio::net::TcpListener;

const BANNER: &[u8] = b"Welcome to loopback\r\n";

/// Accepts any password, greets shells with [`BANNER`], echoes shell input
/// and answers every exec request with a fixed three-stream reply.
#[derive(Default)]
struct LoopbackServer {
    channels: Vec<Channel<Msg>>,
}

#[async_trait]
impl server::Handler for LoopbackServer {
    type Error = russh::Error;

    async fn auth_password(&mut self, _user: &str, _password: &str) -> Result<Auth, Self::Error> {
        Ok(Auth::Accept)
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        self.channels.push(channel);
        Ok(true)
    }

    async fn pty_request(
        &mut self,
        _channel: ChannelId,
        _term: &str,
        _col_width: u32,
        _row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(Pty, u32)],
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn shell_request(
        &mut self,
        channel: ChannelId,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        session.data(channel, CryptoVec::from_slice(BANNER));
        Ok(())
    }

    async fn data(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        session.data(channel, CryptoVec::from_slice(data));
        Ok(())
    }

    async fn exec_request(
        &mut self,
        channel: ChannelId,
        _data: &[u8],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        session.data(channel, CryptoVec::from_slice(b"up 3 days\n"));
        session.extended_data(channel, 1, CryptoVec::from_slice(b"warning: load high\n"));
        // Type 2 is not stderr and must not leak into either stream
        session.extended_data(channel, 2, CryptoVec::from_slice(b"vendor noise\n"));
        session.exit_status_request(channel, 3);
        session.eof(channel);
        session.close(channel);
        Ok(())
    }
}

/// Binds a loopback listener and serves every incoming connection
async fn spawn_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = Arc::new(server::Config {
        keys: vec![russh_keys::key::KeyPair::generate_ed25519().unwrap()],
        ..Default::default()
    });

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let config = Arc::clone(&config);
            tokio::spawn(async move {
                let _ = server::run_stream(config, socket, LoopbackServer::default()).await;
            });
        }
    });
    port
}

fn endpoint(port: u16) -> RemoteEndpoint {
    RemoteEndpoint::new("127.0.0.1", port, "deploy").with_password("secret")
}

fn factory(policy: HostKeyPolicy, known_hosts: &std::path::Path) -> ConnectionFactory {
    ConnectionFactory::new(
        ConnectOptions::default()
            .with_host_key_policy(policy)
            .with_known_hosts(known_hosts)
            .with_connect_timeout(Some(Duration::from_secs(5))),
    )
    .unwrap()
}

/// Polls `source` until `needle` shows up or a few seconds pass
async fn read_until(source: &mut impl ChunkSource, needle: &str) -> String {
    let mut seen = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        match source.poll_chunk(DRAIN_CHUNK_SIZE) {
            Some(chunk) => {
                seen.extend_from_slice(&chunk);
                if String::from_utf8_lossy(&seen).contains(needle) {
                    break;
                }
            }
            None => tokio::time::sleep(Duration::from_millis(10)).await,
        }
    }
    String::from_utf8_lossy(&seen).into_owned()
}

#[tokio::test]
async fn accept_new_records_unseen_host_key() {
    let port = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let known_hosts = dir.path().join("known_hosts");
    let logger = SessionLogger::disabled();
    let factory = factory(HostKeyPolicy::AcceptNew, &known_hosts);

    let mut session = factory.connect(&endpoint(port), &logger).await.unwrap();
    session.close().await;

    let recorded = factory.known_hosts();
    let fingerprint = recorded.get("127.0.0.1", port).unwrap();
    assert!(fingerprint.starts_with("SHA256:"), "{fingerprint}");
    let saved = fs::read_to_string(&known_hosts).unwrap();
    assert!(saved.contains(&format!("127.0.0.1:{port} {fingerprint}")), "{saved}");
}

#[tokio::test]
async fn strict_rejects_unknown_key_and_accepts_recorded_one() {
    let port = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let known_hosts = dir.path().join("known_hosts");
    let logger = SessionLogger::disabled();

    let err = factory(HostKeyPolicy::Strict, &known_hosts)
        .connect(&endpoint(port), &logger)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SessionError::HostKeyRejected { .. }), "{err:?}");
    assert!(!known_hosts.exists());

    let mut first = factory(HostKeyPolicy::AcceptNew, &known_hosts)
        .connect(&endpoint(port), &logger)
        .await
        .unwrap();
    first.close().await;

    let mut again = factory(HostKeyPolicy::Strict, &known_hosts)
        .connect(&endpoint(port), &logger)
        .await
        .unwrap();
    again.close().await;
}

#[tokio::test]
async fn command_output_keeps_streams_apart() {
    let port = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let logger = SessionLogger::disabled();
    let factory = factory(HostKeyPolicy::AcceptNew, &dir.path().join("known_hosts"));
    let mut session = factory.connect(&endpoint(port), &logger).await.unwrap();

    let output = session.run_command("uptime").await.unwrap();
    session.close().await;

    assert_eq!(output.stdout, b"up 3 days\n");
    assert_eq!(output.stderr, b"warning: load high\n");
    assert_eq!(output.exit_status, Some(3));
}

#[tokio::test]
async fn idle_shell_poll_returns_promptly() {
    let port = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let logger = SessionLogger::disabled();
    let factory = factory(HostKeyPolicy::AcceptNew, &dir.path().join("known_hosts"));
    let mut session = factory.connect(&endpoint(port), &logger).await.unwrap();
    let mut shell = session.open_shell().await.unwrap();

    let banner = read_until(&mut shell, "Welcome to loopback").await;
    assert!(banner.contains("Welcome to loopback"), "{banner:?}");

    let started = Instant::now();
    assert_eq!(shell.poll_chunk(DRAIN_CHUNK_SIZE), None);
    assert!(started.elapsed() < Duration::from_millis(100));

    shell.send(b"whoami\n").await.unwrap();
    let echoed = read_until(&mut shell, "whoami").await;
    assert!(echoed.contains("whoami"), "{echoed:?}");

    shell.close().await;
    session.close().await;
}
