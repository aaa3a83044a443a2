//! Settings file and path resolution.
//!
//! Settings live in `config.toml` under the config directory
//! (`$XDG_CONFIG_HOME/sshdeck` by default). Every field has a default, so a
//! missing or partial file is fine. Path fields accept `~`; relative paths
//! are resolved against the config directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::connection::{ConnectOptions, HostKeyPolicy};
use crate::drain::OutputDrainer;
use crate::echo::EchoMode;
use crate::executor::ExecutorOptions;
use crate::interactive::InteractiveOptions;
use crate::models::ErrorStreamPolicy;
use crate::settle::SettleStrategy;

/// Application directory name under the platform config dir
pub const APP_DIR_NAME: &str = "sshdeck";
/// Settings file name
pub const SETTINGS_FILE: &str = "config.toml";

/// Errors raised while loading or saving settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No platform config directory could be determined
    #[error("Could not determine a configuration directory")]
    NoConfigDir,

    /// Reading or writing a file failed
    #[error("Failed to access {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The settings file is not valid TOML of the expected shape
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// Settings could not be serialized
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Timing and presentation of remote sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Wait before reading the shell banner
    pub banner_settle_secs: u64,
    /// Wait after each interactive command
    pub command_settle_secs: u64,
    /// Wait before the verbose banner read of a one-shot command
    pub verbose_settle_secs: u64,
    /// Use idle detection instead of fixed waits
    pub quiescent: bool,
    /// Silence that ends an idle-detection wait
    pub quiescent_idle_ms: u64,
    /// Upper bound on an idle-detection wait
    pub quiescent_max_secs: u64,
    /// Echo stripping strategy
    pub echo: EchoMode,
    /// Whether error-stream text fails a one-shot command
    pub error_policy: ErrorStreamPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            banner_settle_secs: 2,
            command_settle_secs: 1,
            verbose_settle_secs: 3,
            quiescent: false,
            quiescent_idle_ms: 300,
            quiescent_max_secs: 10,
            echo: EchoMode::Full,
            error_policy: ErrorStreamPolicy::Advisory,
        }
    }
}

impl SessionSettings {
    fn settle(&self, fixed_secs: u64) -> SettleStrategy {
        if self.quiescent {
            SettleStrategy::Quiescent {
                idle: Duration::from_millis(self.quiescent_idle_ms),
                max: Duration::from_secs(self.quiescent_max_secs.max(fixed_secs)),
            }
        } else {
            SettleStrategy::fixed_secs(fixed_secs)
        }
    }

    /// Settle step before the shell banner is drained
    #[must_use]
    pub fn banner_settle(&self) -> SettleStrategy {
        self.settle(self.banner_settle_secs)
    }

    /// Settle step after each sent command
    #[must_use]
    pub fn command_settle(&self) -> SettleStrategy {
        self.settle(self.command_settle_secs)
    }

    /// Settle step before the verbose banner read
    #[must_use]
    pub fn verbose_settle(&self) -> SettleStrategy {
        self.settle(self.verbose_settle_secs)
    }

    /// Options for [`crate::interactive::InteractiveSession`]
    #[must_use]
    pub fn interactive_options(&self) -> InteractiveOptions {
        InteractiveOptions {
            banner_settle: self.banner_settle(),
            initial_settle: self.command_settle(),
            command_settle: self.command_settle(),
            echo: Box::new(self.echo),
            drainer: OutputDrainer::new(),
        }
    }

    /// Options for [`crate::executor::CommandExecutor`]
    #[must_use]
    pub fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            verbose_settle: self.verbose_settle(),
            drainer: OutputDrainer::new(),
            error_policy: self.error_policy,
        }
    }
}

/// Connection behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Host key policy
    pub host_key_policy: HostKeyPolicy,
    /// Known hosts file (default `known_hosts` in the config dir)
    pub known_hosts: Option<String>,
    /// Connect timeout; absent means wait indefinitely
    pub connect_timeout_secs: Option<u64>,
}

/// Session log file location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Write a session log even without `-l`
    pub always: bool,
    /// Log directory (default `log` in the config dir)
    pub directory: Option<String>,
}

/// Server registry location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Registry file (default `servers.yaml` in the config dir)
    pub file: Option<String>,
}

/// Scripts directory location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsSettings {
    /// Scripts directory (default `scripts` in the config dir)
    pub directory: Option<String>,
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// `[session]`
    pub session: SessionSettings,
    /// `[connection]`
    pub connection: ConnectionSettings,
    /// `[logging]`
    pub logging: LoggingSettings,
    /// `[registry]`
    pub registry: RegistrySettings,
    /// `[scripts]`
    pub scripts: ScriptsSettings,
}

/// Locates and reads configuration files
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Uses the platform config directory
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] if the platform has none.
    pub fn new() -> ConfigResult<Self> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::with_config_dir(base.join(APP_DIR_NAME)))
    }

    /// Uses a custom config directory
    #[must_use]
    pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: expand_path(&config_dir.into().to_string_lossy(), Path::new(".")),
        }
    }

    /// Config directory
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path of `config.toml`
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    /// Loads settings; a missing file yields defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_settings(&self) -> ConfigResult<AppSettings> {
        let path = self.settings_path();
        match fs::read_to_string(&path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                Ok(AppSettings::default())
            }
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }

    /// Writes settings, creating the config directory
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_settings(&self, settings: &AppSettings) -> ConfigResult<()> {
        let content = toml::to_string_pretty(settings)?;
        fs::create_dir_all(&self.config_dir).map_err(|source| ConfigError::Io {
            path: self.config_dir.clone(),
            source,
        })?;
        let path = self.settings_path();
        fs::write(&path, content).map_err(|source| ConfigError::Io { path, source })
    }

    fn resolve(&self, configured: Option<&str>, default_name: &str) -> PathBuf {
        configured.map_or_else(
            || self.config_dir.join(default_name),
            |value| expand_path(value, &self.config_dir),
        )
    }

    /// Server registry file
    #[must_use]
    pub fn servers_path(&self, settings: &AppSettings) -> PathBuf {
        self.resolve(settings.registry.file.as_deref(), "servers.yaml")
    }

    /// Known hosts file
    #[must_use]
    pub fn known_hosts_path(&self, settings: &AppSettings) -> PathBuf {
        self.resolve(settings.connection.known_hosts.as_deref(), "known_hosts")
    }

    /// Session log directory
    #[must_use]
    pub fn log_dir(&self, settings: &AppSettings) -> PathBuf {
        self.resolve(settings.logging.directory.as_deref(), "log")
    }

    /// Scripts directory
    #[must_use]
    pub fn scripts_dir(&self, settings: &AppSettings) -> PathBuf {
        self.resolve(settings.scripts.directory.as_deref(), "scripts")
    }

    /// Connect options with the known hosts path resolved
    #[must_use]
    pub fn connect_options(&self, settings: &AppSettings) -> ConnectOptions {
        ConnectOptions::default()
            .with_host_key_policy(settings.connection.host_key_policy)
            .with_known_hosts(self.known_hosts_path(settings))
            .with_connect_timeout(
                settings
                    .connection
                    .connect_timeout_secs
                    .map(Duration::from_secs),
            )
    }
}

/// Expands `~` and anchors relative paths at `base`
fn expand_path(value: &str, base: &Path) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(value).into_owned());
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}
