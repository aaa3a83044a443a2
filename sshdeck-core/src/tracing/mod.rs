//! Diagnostic tracing on stderr.
//!
//! Separate from the [`crate::logger::SessionLogger`] file: this is the
//! developer-facing `tracing` output, off unless the CLI is run with `-v`.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Global flag indicating whether tracing has been initialized
static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Targets that follow the configured level
const OWN_TARGETS: [&str; 2] = ["sshdeck", "sshdeck_core"];

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to initialize tracing subscriber
    #[error("Failed to initialize tracing: {0}")]
    InitializationFailed(String),

    /// Tracing already initialized
    #[error("Tracing has already been initialized")]
    AlreadyInitialized,
}

/// Result type for tracing operations
pub type TracingResult<T> = Result<T, TracingError>;

/// Tracing log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum TracingLevel {
    /// Errors only
    Error,
    /// Errors and warnings (default)
    #[default]
    Warn,
    /// Adds informational events
    Info,
    /// Adds debug events
    Debug,
    /// Everything
    Trace,
}

impl TracingLevel {
    /// Level for a `-v` count: 0 warn, 1 info, 2 debug, 3+ trace
    #[must_use]
    pub const fn from_verbosity(count: u8) -> Self {
        match count {
            0 => Self::Warn,
            1 => Self::Info,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }
}

impl std::str::FromStr for TracingLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for TracingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Configuration for tracing initialization
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Level applied to this application's targets
    pub level: TracingLevel,
    /// Include module targets in each line
    pub with_target: bool,
    /// Custom filter string (overrides level if set)
    pub filter: Option<String>,
}

impl TracingConfig {
    /// Creates a new tracing configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for a CLI `-v` count
    #[must_use]
    pub const fn from_verbosity(count: u8) -> Self {
        Self {
            level: TracingLevel::from_verbosity(count),
            with_target: count >= 2,
            filter: None,
        }
    }

    /// Sets the log level
    #[must_use]
    pub const fn with_level(mut self, level: TracingLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets a custom filter string
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Filter directives derived from the configuration
    #[must_use]
    pub fn directives(&self) -> String {
        if let Some(filter) = &self.filter {
            return filter.clone();
        }
        let mut directives = vec!["warn".to_string()];
        directives.extend(
            OWN_TARGETS
                .iter()
                .map(|target| format!("{target}={}", self.level)),
        );
        directives.join(",")
    }
}

/// Installs a stderr subscriber. Call once at startup.
///
/// # Errors
///
/// Returns an error if tracing was already initialized, the filter string is
/// invalid, or another global subscriber is installed.
pub fn init_tracing(config: &TracingConfig) -> TracingResult<()> {
    if TRACING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(TracingError::AlreadyInitialized);
    }

    let filter = EnvFilter::try_new(config.directives())
        .map_err(|e| TracingError::InitializationFailed(e.to_string()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(config.with_target)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| TracingError::InitializationFailed(e.to_string()))?;

    tracing::debug!(level = %config.level, "Tracing initialized");
    Ok(())
}
