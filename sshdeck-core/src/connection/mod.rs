//! Connection establishment.
//!
//! [`ConnectionFactory`] turns a [`RemoteEndpoint`] into an authenticated
//! [`SessionHandle`], applying the configured [`HostKeyPolicy`] during the
//! handshake.

mod handle;
mod host_keys;

pub use handle::{RusshShell, SessionHandle};
pub use host_keys::{
    HostKeyDecision, HostKeyPolicy, HostKeyVerifier, KnownHosts, fingerprint_bytes,
};

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use russh::client;
use secrecy::ExposeSecret;
use tracing::debug;

use crate::error::{SessionError, SessionResult};
use crate::logger::SessionLogger;
use crate::models::RemoteEndpoint;

/// Options applied to every connection made by a factory
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Host key policy
    pub host_key_policy: HostKeyPolicy,
    /// Known hosts file; `None` keeps recorded keys in memory only
    pub known_hosts: Option<PathBuf>,
    /// Limit on TCP connect plus handshake; `None` waits indefinitely
    pub connect_timeout: Option<Duration>,
}

impl ConnectOptions {
    /// Sets the host key policy
    #[must_use]
    pub const fn with_host_key_policy(mut self, policy: HostKeyPolicy) -> Self {
        self.host_key_policy = policy;
        self
    }

    /// Sets the known hosts file
    #[must_use]
    pub fn with_known_hosts(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts = Some(path.into());
        self
    }

    /// Sets the connect timeout
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Opens authenticated SSH sessions
pub struct ConnectionFactory {
    options: ConnectOptions,
    known_hosts: Arc<Mutex<KnownHosts>>,
}

impl ConnectionFactory {
    /// Creates a factory, loading the known hosts store
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the known hosts file exists but cannot
    /// be read.
    pub fn new(options: ConnectOptions) -> SessionResult<Self> {
        let known_hosts = match &options.known_hosts {
            Some(path) => KnownHosts::load(path)?,
            None => KnownHosts::in_memory(),
        };
        Ok(Self {
            options,
            known_hosts: Arc::new(Mutex::new(known_hosts)),
        })
    }

    /// Snapshot of the known hosts store
    #[must_use]
    pub fn known_hosts(&self) -> KnownHosts {
        self.known_hosts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Connects and authenticates. Failures are logged at error level
    /// before being returned.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Network`] for an empty host, unreachable host or timeout
    /// - [`SessionError::HostKeyRejected`] when the policy refuses the key
    /// - [`SessionError::Authentication`] when the credential is refused
    /// - [`SessionError::Protocol`] for any other transport failure
    pub async fn connect(
        &self,
        endpoint: &RemoteEndpoint,
        logger: &SessionLogger,
    ) -> SessionResult<SessionHandle> {
        let result = self.establish(endpoint, logger).await;
        if let Err(e) = &result {
            logger.error(format!("Connection to {endpoint} failed [{}]: {e}", e.kind()));
        }
        result
    }

    async fn establish(
        &self,
        endpoint: &RemoteEndpoint,
        logger: &SessionLogger,
    ) -> SessionResult<SessionHandle> {
        if !endpoint.is_resolved() {
            return Err(SessionError::Network(
                "no host given (unknown server name?)".to_string(),
            ));
        }
        logger.info(format!(
            "Connecting to {} as {}",
            endpoint.address(),
            endpoint.username
        ));

        let address = endpoint.address();
        let rejection = Arc::new(Mutex::new(None));
        let verifier = HostKeyVerifier::new(
            endpoint.host.clone(),
            endpoint.port,
            self.options.host_key_policy,
            Arc::clone(&self.known_hosts),
            Arc::clone(&rejection),
        );
        let config = Arc::new(client::Config::default());

        let connecting = client::connect(config, (endpoint.host.clone(), endpoint.port), verifier);
        let connected = match self.options.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, connecting).await.map_err(|_| {
                SessionError::Network(format!(
                    "timed out after {}s connecting to {address}",
                    limit.as_secs_f32()
                ))
            })?,
            None => connecting.await,
        };
        let mut handle =
            connected.map_err(|e| map_transport_error(e, &address, Some(&rejection)))?;

        let accepted = match &endpoint.credential {
            Some(secret) => {
                handle
                    .authenticate_password(endpoint.username.clone(), secret.expose_secret())
                    .await
            }
            None => handle.authenticate_none(endpoint.username.clone()).await,
        }
        .map_err(|e| map_transport_error(e, &address, None))?;

        if !accepted {
            let _ = handle
                .disconnect(russh::Disconnect::ByApplication, "", "English")
                .await;
            return Err(SessionError::Authentication {
                user: endpoint.username.clone(),
                host: address,
            });
        }

        debug!(host = %address, user = %endpoint.username, "Authenticated");
        Ok(SessionHandle::new(handle, endpoint.host.clone()))
    }
}

/// Maps a transport error onto the session error kinds.
///
/// `rejection` carries the reason recorded by the host key verifier, if the
/// error came out of the handshake.
fn map_transport_error(
    err: russh::Error,
    host: &str,
    rejection: Option<&Mutex<Option<String>>>,
) -> SessionError {
    match err {
        russh::Error::UnknownKey => {
            let reason = rejection
                .and_then(|r| r.lock().unwrap_or_else(PoisonError::into_inner).take())
                .unwrap_or_else(|| "host key not accepted".to_string());
            SessionError::HostKeyRejected {
                host: host.to_string(),
                reason,
            }
        }
        russh::Error::IO(e) => SessionError::Network(format!("{host}: {e}")),
        russh::Error::ConnectionTimeout => {
            SessionError::Network(format!("{host}: connection timed out"))
        }
        other => SessionError::Protocol(format!("{host}: {other}")),
    }
}
