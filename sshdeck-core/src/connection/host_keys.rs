//! Host identity verification.
//!
//! The default policy is trust-on-first-use: an identity never seen before is
//! accepted without a prompt and recorded, and a recorded identity that later
//! changes is rejected. This is a deliberate security trade-off and is kept
//! explicit through [`HostKeyPolicy`].

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use russh::client;
use russh_keys::PublicKeyBase64;
use russh_keys::key::PublicKey;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// What to do with a presented host key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyPolicy {
    /// Trust on first use: accept and record unknown keys, reject changed ones
    #[default]
    AcceptNew,
    /// Only accept keys that are already recorded
    Strict,
    /// Accept everything and record nothing (insecure)
    AcceptAll,
}

impl FromStr for HostKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accept-new" | "accept_new" | "tofu" => Ok(Self::AcceptNew),
            "strict" => Ok(Self::Strict),
            "accept-all" | "accept_all" | "disabled" => Ok(Self::AcceptAll),
            _ => Err(format!("Unknown host key policy: {s}")),
        }
    }
}

impl fmt::Display for HostKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcceptNew => write!(f, "accept-new"),
            Self::Strict => write!(f, "strict"),
            Self::AcceptAll => write!(f, "accept-all"),
        }
    }
}

/// Outcome of checking a presented key against the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKeyDecision {
    /// The key matches the recorded one, or the policy does not check
    Accept,
    /// The key is unseen and should be recorded
    AcceptAndRecord,
    /// The key is refused
    Reject(String),
}

impl HostKeyPolicy {
    /// Decides on `presented` given the fingerprint on record, if any
    #[must_use]
    pub fn evaluate(self, recorded: Option<&str>, presented: &str) -> HostKeyDecision {
        match (self, recorded) {
            (Self::AcceptAll, _) => HostKeyDecision::Accept,
            (_, Some(known)) if known == presented => HostKeyDecision::Accept,
            (_, Some(known)) => HostKeyDecision::Reject(format!(
                "fingerprint changed (recorded {known}, presented {presented})"
            )),
            (Self::AcceptNew, None) => HostKeyDecision::AcceptAndRecord,
            (Self::Strict, None) => {
                HostKeyDecision::Reject("host is not in known hosts (strict policy)".to_string())
            }
        }
    }
}

/// SHA-256 fingerprint of a public key blob, hex encoded
#[must_use]
pub fn fingerprint_bytes(key_blob: &[u8]) -> String {
    let digest = ring::digest::digest(&ring::digest::SHA256, key_blob);
    format!("SHA256:{}", hex::encode(digest.as_ref()))
}

/// Store of recorded host fingerprints.
///
/// File format: one `host:port fingerprint` pair per line, `#` starts a
/// comment. A missing file is an empty store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownHosts {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl KnownHosts {
    /// Creates an empty store that is never written to disk
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the store from `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(path: &Path) -> io::Result<Self> {
        let entries = match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            entries,
        })
    }

    fn parse(content: &str) -> BTreeMap<String, String> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let mut parts = line.split_whitespace();
                match (parts.next(), parts.next()) {
                    (Some(host), Some(fp)) => Some((host.to_string(), fp.to_string())),
                    _ => {
                        warn!(line, "Skipping malformed known hosts line");
                        None
                    }
                }
            })
            .collect()
    }

    /// Key under which `host`/`port` is recorded
    #[must_use]
    pub fn entry_key(host: &str, port: u16) -> String {
        if host.contains(':') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        }
    }

    /// Recorded fingerprint for `host`/`port`
    #[must_use]
    pub fn get(&self, host: &str, port: u16) -> Option<&str> {
        self.entries
            .get(&Self::entry_key(host, port))
            .map(String::as_str)
    }

    /// Records a fingerprint, replacing any previous one
    pub fn insert(&mut self, host: &str, port: u16, fingerprint: impl Into<String>) {
        self.entries
            .insert(Self::entry_key(host, port), fingerprint.into());
    }

    /// Number of recorded hosts
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes the store in its file format
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("# sshdeck known hosts\n");
        for (host, fp) in &self.entries {
            out.push_str(host);
            out.push(' ');
            out.push_str(fp);
            out.push('\n');
        }
        out
    }

    /// Writes the store back to its file; no-op for in-memory stores
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its directory cannot be written.
    pub fn save(&self) -> io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render())
    }
}

/// russh client handler applying a [`HostKeyPolicy`]
pub struct HostKeyVerifier {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
    known_hosts: Arc<Mutex<KnownHosts>>,
    rejection: Arc<Mutex<Option<String>>>,
}

impl HostKeyVerifier {
    /// Creates a verifier for one connection attempt
    pub fn new(
        host: impl Into<String>,
        port: u16,
        policy: HostKeyPolicy,
        known_hosts: Arc<Mutex<KnownHosts>>,
        rejection: Arc<Mutex<Option<String>>>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            policy,
            known_hosts,
            rejection,
        }
    }

    fn check_fingerprint(&self, fingerprint: &str) -> bool {
        let host_key = KnownHosts::entry_key(&self.host, self.port);
        let mut store = self
            .known_hosts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match self
            .policy
            .evaluate(store.get(&self.host, self.port), fingerprint)
        {
            HostKeyDecision::Accept => {
                if self.policy == HostKeyPolicy::AcceptAll {
                    warn!(host = %host_key, "Host key verification disabled, accepting key");
                } else {
                    debug!(host = %host_key, "Host key verified");
                }
                true
            }
            HostKeyDecision::AcceptAndRecord => {
                info!(
                    host = %host_key,
                    fingerprint,
                    "First time connecting, accepting host key"
                );
                store.insert(&self.host, self.port, fingerprint);
                if let Err(e) = store.save() {
                    warn!(error = %e, "Failed to save known hosts");
                }
                true
            }
            HostKeyDecision::Reject(reason) => {
                error!(host = %host_key, reason = %reason, "Host key rejected");
                *self
                    .rejection
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(reason);
                false
            }
        }
    }
}

#[async_trait]
impl client::Handler for HostKeyVerifier {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = fingerprint_bytes(&server_public_key.public_key_bytes());
        Ok(self.check_fingerprint(&fingerprint))
    }
}
