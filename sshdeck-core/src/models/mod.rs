//! Core data models shared by the session components.

mod command;
mod endpoint;

pub use command::{CommandResult, ErrorStreamPolicy};
pub use endpoint::{DEFAULT_SSH_PORT, RemoteEndpoint};
