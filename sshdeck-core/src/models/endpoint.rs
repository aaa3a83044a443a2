//! Remote endpoint model: network address plus credentials.

use std::fmt;

use secrecy::SecretString;

/// Default SSH port
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Address and credentials identifying a managed host.
///
/// An endpoint resolved from a registry name that does not exist has an empty
/// host and username and no credential; connecting with it fails as a network
/// failure rather than a distinct "unknown server" error.
pub struct RemoteEndpoint {
    /// Hostname or IP address
    pub host: String,
    /// SSH port
    pub port: u16,
    /// Login user
    pub username: String,
    /// Password, if any. `None` means the `none` auth method is tried.
    pub credential: Option<SecretString>,
}

impl RemoteEndpoint {
    /// Creates an endpoint without a credential
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            credential: None,
        }
    }

    /// Creates the placeholder endpoint produced by a registry miss
    #[must_use]
    pub fn unresolved() -> Self {
        Self::new("", DEFAULT_SSH_PORT, "")
    }

    /// Sets the password credential
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.credential = Some(SecretString::from(password.into()));
        self
    }

    /// Sets the credential from an optional secret
    #[must_use]
    pub fn with_credential(mut self, credential: Option<SecretString>) -> Self {
        self.credential = credential;
        self
    }

    /// Returns true when the endpoint names a host
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !self.host.trim().is_empty()
    }

    /// `host:port`, bracketing IPv6 literals
    #[must_use]
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for RemoteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.username, self.address())
    }
}

impl fmt::Debug for RemoteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteEndpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("credential", &self.credential.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
