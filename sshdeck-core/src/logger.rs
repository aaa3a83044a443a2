//! Session log file.
//!
//! A [`SessionLogger`] is an explicitly constructed, append-only diagnostic
//! sink for one run. It is opened once, handed by reference to every session
//! component, and flushed/closed when the run ends. Records are plain text
//! lines of the form `YYYY-mm-dd HH:MM:SS,mmm - LEVEL - message`; there is no
//! rotation or size bound. Each record is also forwarded to `tracing` at
//! debug level, so it only reaches stderr diagnostics from `-vv` upwards.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Local};
use thiserror::Error;

/// Marker written when a logger is opened
pub const SESSION_START_MARKER: &str = "==== NEW SSH SESSION STARTED ====";

/// Timestamp format used for the default file name
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Timestamp format used inside records
pub const RECORD_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Errors raised by the session logger
#[derive(Debug, Error)]
pub enum LogError {
    /// Logging is enabled but no destination was given
    #[error("Log path must not be empty")]
    EmptyPath,

    /// The log file or its directory could not be created
    #[error("Failed to open log file {path}: {source}")]
    Open {
        /// Destination path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Writing or flushing failed
    #[error("Failed to write log file: {0}")]
    Write(#[from] std::io::Error),
}

/// Result type for logger operations
pub type LogResult<T> = Result<T, LogError>;

/// Severity of a log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Verbose diagnostics
    Debug,
    /// Normal progress
    Info,
    /// Something unexpected that did not stop the run
    Warning,
    /// A failure
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// One line of the session log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// When the record was produced
    pub timestamp: DateTime<Local>,
    /// Severity
    pub level: LogLevel,
    /// Free-form message, may span lines
    pub message: String,
}

impl LogRecord {
    /// Creates a record stamped with the current local time
    #[must_use]
    pub fn now(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            message: message.into(),
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {}",
            self.timestamp.format(RECORD_TIMESTAMP_FORMAT),
            self.level,
            self.message
        )
    }
}

/// Where and whether to write the session log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether a file is written at all
    pub enabled: bool,
    /// Destination file
    pub path: PathBuf,
}

impl LogConfig {
    /// Creates an enabled configuration writing to `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            path: path.into(),
        }
    }

    /// Creates a configuration that writes nothing
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            path: PathBuf::new(),
        }
    }

    /// Uses the default `ssh_log_<timestamp>.log` name inside `dir`
    #[must_use]
    pub fn timestamped_in(dir: &Path) -> Self {
        Self::new(dir.join(default_file_name(Local::now())))
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns [`LogError::EmptyPath`] when enabled without a destination.
    pub fn validate(&self) -> LogResult<()> {
        if self.enabled && self.path.as_os_str().is_empty() {
            return Err(LogError::EmptyPath);
        }
        Ok(())
    }
}

/// Default log file name for a run started at `now`
#[must_use]
pub fn default_file_name(now: DateTime<Local>) -> String {
    format!("ssh_log_{}.log", now.format(FILE_TIMESTAMP_FORMAT))
}

/// Append-only diagnostic sink for one run
#[derive(Debug)]
pub struct SessionLogger {
    path: Option<PathBuf>,
    writer: Option<Mutex<BufWriter<File>>>,
}

impl SessionLogger {
    /// Opens the logger described by `config`.
    ///
    /// Parent directories are created as needed and the file is opened for
    /// appending, so several runs may share one destination. A disabled
    /// configuration yields a no-op logger.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the file cannot
    /// be opened.
    pub fn open(config: &LogConfig) -> LogResult<Self> {
        config.validate()?;
        if !config.enabled {
            return Ok(Self::disabled());
        }

        let open_err = |source| LogError::Open {
            path: config.path.clone(),
            source,
        };

        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(open_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)
            .map_err(open_err)?;

        let logger = Self {
            path: Some(config.path.clone()),
            writer: Some(Mutex::new(BufWriter::new(file))),
        };
        logger.info(SESSION_START_MARKER);
        Ok(logger)
    }

    /// Creates a logger that only forwards to `tracing`
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            path: None,
            writer: None,
        }
    }

    /// Returns true when records are written to a file
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Destination file, if enabled
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Appends one record
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        let message = message.as_ref();
        // Console output already carries these records; mirror quietly.
        tracing::debug!(target: "sshdeck::session", level = %level, "{message}");

        let Some(writer) = &self.writer else {
            return;
        };
        let record = LogRecord::now(level, message);
        let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(writer, "{record}") {
            tracing::warn!(error = %e, "Failed to append session log record");
        }
    }

    /// Appends a debug record
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    /// Appends an info record
    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    /// Appends a warning record
    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warning, message);
    }

    /// Appends an error record
    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    /// Flushes buffered records to disk
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn flush(&self) -> LogResult<()> {
        if let Some(writer) = &self.writer {
            writer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .flush()?;
        }
        Ok(())
    }

    /// Flushes and releases the file
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    pub fn close(mut self) -> LogResult<()> {
        let result = self.flush();
        self.writer = None;
        result
    }
}

impl Drop for SessionLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "Failed to flush session log on drop");
        }
    }
}
