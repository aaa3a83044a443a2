//! `sshdeck` Core Library
//!
//! This crate provides the remote-session core of the `sshdeck` server manager:
//! opening an authenticated SSH session, running one command with separately
//! captured output streams, and driving a line-oriented interactive shell over
//! a polling read loop.
//!
//! # Crate Structure
//!
//! - [`models`] - Endpoint and command result types
//! - [`connection`] - Connection factory, host-key policy and known-hosts store
//! - [`channel`] - Transport seams (`RemoteSession`, `ShellChannel`)
//! - [`drain`] - Non-blocking output drainer
//! - [`settle`] - Settle strategies used between send and drain
//! - [`echo`] - Echo-suppression strategies for interactive output
//! - [`executor`] / [`interactive`] - The two ways a session is consumed
//! - [`logger`] - Per-run session log file
//! - [`registry`] - Flat-file server registry
//! - [`scripts`] - Auxiliary script directory listing
//! - [`config`] - Settings file and path resolution

// Enable missing_docs warning for public API documentation
#![warn(missing_docs)]

pub mod channel;
pub mod config;
pub mod connection;
pub mod drain;
pub mod echo;
pub mod error;
pub mod executor;
pub mod interactive;
pub mod logger;
pub mod models;
pub mod registry;
pub mod scripts;
pub mod settle;
pub mod tracing;

pub use channel::{RemoteOutput, RemoteSession, ShellChannel};
pub use config::{AppSettings, ConfigError, ConfigManager};
pub use connection::{
    ConnectOptions, ConnectionFactory, HostKeyDecision, HostKeyPolicy, KnownHosts, SessionHandle,
};
pub use drain::{ChunkSource, DRAIN_CHUNK_SIZE, OutputDrainer};
pub use echo::{EchoFilter, EchoMode};
pub use error::{SessionError, SessionResult};
pub use executor::{CommandExecutor, ExecutorOptions};
pub use interactive::{
    InteractiveOptions, InteractiveSession, LineSource, SessionSummary, StdinLines,
    is_exit_command,
};
pub use logger::{LogConfig, LogError, LogLevel, LogRecord, SessionLogger};
pub use models::{CommandResult, DEFAULT_SSH_PORT, ErrorStreamPolicy, RemoteEndpoint};
pub use registry::{RegistryError, ServerEntry, ServerRegistry, ServerUpdate};
pub use scripts::{EntryKind, ScriptEntry, list_scripts};
pub use settle::SettleStrategy;
