//! Flat-file server registry.
//!
//! Servers are kept in a YAML mapping from name to entry, in insertion
//! order. Every mutation is written back to the file immediately.

use std::fmt;
use std::fs;
use std::io;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{DEFAULT_SSH_PORT, RemoteEndpoint};

/// Errors raised by [`ServerRegistry`]
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Reading or writing the registry file failed
    #[error("Failed to access registry file {path}: {source}")]
    Io {
        /// Registry file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The registry file is not valid YAML of the expected shape
    #[error("Failed to parse registry file {path}: {source}")]
    Parse {
        /// Registry file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_yaml::Error,
    },

    /// The registry could not be serialized
    #[error("Failed to serialize registry: {0}")]
    Serialize(#[source] serde_yaml::Error),

    /// A server with this name already exists
    #[error("Entry '{0}' already exists")]
    Duplicate(String),

    /// No server with this name exists
    #[error("Entry '{0}' not found")]
    NotFound(String),

    /// The host is not an IP address
    #[error("The IP address is not valid: {0}")]
    InvalidHost(String),

    /// A field failed validation
    #[error("Invalid {field}: {reason}")]
    Validation {
        /// Field name
        field: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

fn default_protocol() -> String {
    "ssh".to_string()
}

const fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

/// One registered server
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    /// IP address
    pub host: String,
    /// Protocol label (informational)
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// Port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login user
    #[serde(default)]
    pub user: String,
    /// Stored password, in plain text as the file format requires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Whether the account has full access; stored as `yes`/`no`
    #[serde(default, with = "yes_no")]
    pub full_access: bool,
    /// Free-form description
    #[serde(default)]
    pub description: String,
}

impl fmt::Debug for ServerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerEntry")
            .field("host", &self.host)
            .field("protocol", &self.protocol)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("full_access", &self.full_access)
            .field("description", &self.description)
            .finish()
    }
}

impl ServerEntry {
    /// Creates an SSH entry with default port and no password
    #[must_use]
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            protocol: default_protocol(),
            port: DEFAULT_SSH_PORT,
            user: user.into(),
            password: None,
            full_access: false,
            description: String::new(),
        }
    }

    /// Checks the entry's fields
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not an IP address or the port is 0.
    pub fn validate(&self) -> RegistryResult<()> {
        if !is_ip_address(&self.host) {
            return Err(RegistryError::InvalidHost(self.host.clone()));
        }
        if self.port == 0 {
            return Err(RegistryError::Validation {
                field: "port".to_string(),
                reason: "must be between 1 and 65535".to_string(),
            });
        }
        Ok(())
    }

    /// Endpoint for connecting to this server
    #[must_use]
    pub fn to_endpoint(&self) -> RemoteEndpoint {
        let endpoint = RemoteEndpoint::new(self.host.clone(), self.port, self.user.clone());
        match &self.password {
            Some(password) => endpoint.with_password(password.clone()),
            None => endpoint,
        }
    }
}

/// Partial update: only `Some` fields change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerUpdate {
    /// New host
    pub host: Option<String>,
    /// New protocol
    pub protocol: Option<String>,
    /// New port
    pub port: Option<u16>,
    /// New user
    pub user: Option<String>,
    /// New password
    pub password: Option<String>,
    /// New full-access flag
    pub full_access: Option<bool>,
    /// New description
    pub description: Option<String>,
}

impl ServerUpdate {
    /// Returns true when nothing would change
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.host.is_none()
            && self.protocol.is_none()
            && self.port.is_none()
            && self.user.is_none()
            && self.password.is_none()
            && self.full_access.is_none()
            && self.description.is_none()
    }

    fn apply_to(self, entry: &mut ServerEntry) {
        if let Some(host) = self.host {
            entry.host = host;
        }
        if let Some(protocol) = self.protocol {
            entry.protocol = protocol;
        }
        if let Some(port) = self.port {
            entry.port = port;
        }
        if let Some(user) = self.user {
            entry.user = user;
        }
        if let Some(password) = self.password {
            entry.password = Some(password);
        }
        if let Some(full_access) = self.full_access {
            entry.full_access = full_access;
        }
        if let Some(description) = self.description {
            entry.description = description;
        }
    }
}

/// Returns true if `host` parses as an IPv4 or IPv6 address
#[must_use]
pub fn is_ip_address(host: &str) -> bool {
    host.parse::<IpAddr>().is_ok()
}

/// Parses the accepted spellings of a yes/no flag
#[must_use]
pub fn parse_yes_no(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" => Some(true),
        "no" | "n" | "false" => Some(false),
        _ => None,
    }
}

mod yes_no {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)] // signature fixed by serde(with)
    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "yes" } else { "no" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(flag) => Ok(flag),
            Raw::Text(text) => super::parse_yes_no(&text)
                .ok_or_else(|| D::Error::custom(format!("expected yes or no, got '{text}'"))),
        }
    }
}

/// Name-indexed server store backed by a YAML file
#[derive(Debug, Clone)]
pub struct ServerRegistry {
    path: PathBuf,
    servers: IndexMap<String, ServerEntry>,
}

impl ServerRegistry {
    /// Loads the registry; a missing or empty file is an empty registry
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> RegistryResult<Self> {
        let path = path.into();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(source) => return Err(RegistryError::Io { path, source }),
        };

        let servers = if content.trim().is_empty() {
            IndexMap::new()
        } else {
            serde_yaml::from_str::<Option<IndexMap<String, ServerEntry>>>(&content)
                .map_err(|source| RegistryError::Parse {
                    path: path.clone(),
                    source,
                })?
                .unwrap_or_default()
        };

        tracing::debug!(path = %path.display(), count = servers.len(), "Loaded server registry");
        Ok(Self { path, servers })
    }

    /// Registry file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the registry to its file, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self) -> RegistryResult<()> {
        let content = serde_yaml::to_string(&self.servers).map_err(RegistryError::Serialize)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| RegistryError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, content).map_err(|source| RegistryError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Looks up a server by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ServerEntry> {
        self.servers.get(name)
    }

    /// Servers in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServerEntry)> {
        self.servers.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Number of servers
    #[must_use]
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Returns true when no servers are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Adds a server and saves
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or taken, the entry is invalid,
    /// or saving fails.
    pub fn add(&mut self, name: &str, entry: ServerEntry) -> RegistryResult<()> {
        if name.trim().is_empty() {
            return Err(RegistryError::Validation {
                field: "name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.servers.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        entry.validate()?;

        self.servers.insert(name.to_string(), entry);
        self.save()?;
        tracing::info!(name, "Server added");
        Ok(())
    }

    /// Applies a partial update and saves
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not exist, the updated entry is
    /// invalid, or saving fails. The registry is unchanged on error.
    pub fn update(&mut self, name: &str, update: ServerUpdate) -> RegistryResult<&ServerEntry> {
        let current = self
            .servers
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        let mut updated = current.clone();
        update.apply_to(&mut updated);
        updated.validate()?;

        self.servers.insert(name.to_string(), updated);
        self.save()?;
        tracing::info!(name, "Server updated");
        self.servers
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Removes a server and saves
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not exist or saving fails.
    pub fn delete(&mut self, name: &str) -> RegistryResult<ServerEntry> {
        let removed = self
            .servers
            .shift_remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        self.save()?;
        tracing::info!(name, "Server deleted");
        Ok(removed)
    }

    /// Endpoint for `name`. A miss yields [`RemoteEndpoint::unresolved`],
    /// which fails later as a network error.
    #[must_use]
    pub fn resolve_endpoint(&self, name: &str) -> RemoteEndpoint {
        self.get(name).map_or_else(
            || {
                tracing::debug!(name, "Server not in registry");
                RemoteEndpoint::unresolved()
            },
            ServerEntry::to_endpoint,
        )
    }
}
