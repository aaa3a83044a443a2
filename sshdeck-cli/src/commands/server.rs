//! Server registry commands: add, update, delete, list, show.

use std::path::Path;

use serde::Serialize;
use sshdeck_core::{ServerEntry, ServerRegistry, ServerUpdate};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::format::{Table, mask};
use crate::util::create_config_manager;

/// Field values for a new server
pub struct AddParams {
    pub host: String,
    pub protocol: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub full_access: bool,
    pub description: String,
}

fn load_registry(config_path: Option<&Path>) -> Result<ServerRegistry, CliError> {
    let config_manager = create_config_manager(config_path)?;
    let settings = config_manager.load_settings()?;
    Ok(ServerRegistry::load(config_manager.servers_path(&settings))?)
}

/// Add server command handler
pub fn cmd_add(config_path: Option<&Path>, name: &str, params: AddParams) -> Result<(), CliError> {
    let mut registry = load_registry(config_path)?;

    let entry = ServerEntry {
        host: params.host,
        protocol: params.protocol,
        port: params.port,
        user: params.user,
        password: params.password,
        full_access: params.full_access,
        description: params.description,
    };
    registry.add(name, entry)?;

    println!("'{name}' added successfully");
    Ok(())
}

/// Update server command handler
pub fn cmd_update(
    config_path: Option<&Path>,
    name: &str,
    update: ServerUpdate,
) -> Result<(), CliError> {
    if update.is_empty() {
        return Err(CliError::Usage(format!(
            "Nothing to update for '{name}': give at least one field"
        )));
    }
    let mut registry = load_registry(config_path)?;
    registry.update(name, update)?;

    println!("'{name}' updated successfully");
    Ok(())
}

/// Delete server command handler
pub fn cmd_delete(config_path: Option<&Path>, name: &str) -> Result<(), CliError> {
    let mut registry = load_registry(config_path)?;
    let removed = registry.delete(name)?;

    println!("'{name}' ({}) deleted successfully", removed.host);
    Ok(())
}

/// List servers command handler
pub fn cmd_list(
    config_path: Option<&Path>,
    format: OutputFormat,
    show_passwords: bool,
) -> Result<(), CliError> {
    let registry = load_registry(config_path)?;
    let rows: Vec<ServerRow> = registry
        .iter()
        .map(|(name, entry)| ServerRow::new(name, entry, show_passwords))
        .collect();

    match format {
        OutputFormat::Table => println!("{}", format_table(&rows)),
        OutputFormat::Json => println!("{}", format_json(&rows)?),
    }
    Ok(())
}

/// Show server command handler
pub fn cmd_show(config_path: Option<&Path>, name: &str, show_password: bool) -> Result<(), CliError> {
    let registry = load_registry(config_path)?;
    let entry = registry
        .get(name)
        .ok_or_else(|| sshdeck_core::RegistryError::NotFound(name.to_string()))?;
    let row = ServerRow::new(name, entry, show_password);

    println!("Server Details:");
    println!("  Name:        {}", row.name);
    println!("  Host:        {}", row.host);
    println!("  Port:        {}", row.port);
    println!("  Protocol:    {}", row.protocol);
    println!("  User:        {}", row.user);
    if let Some(ref password) = row.password {
        println!("  Password:    {password}");
    }
    println!("  Full access: {}", row.full_access);
    if !row.description.is_empty() {
        println!("  Description: {}", row.description);
    }
    Ok(())
}

/// One server as shown by `list` and `show`
#[derive(Debug, Clone, Serialize)]
pub struct ServerRow {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub protocol: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub full_access: &'static str,
    pub description: String,
}

impl ServerRow {
    fn new(name: &str, entry: &ServerEntry, reveal: bool) -> Self {
        Self {
            name: name.to_string(),
            host: entry.host.clone(),
            port: entry.port,
            protocol: entry.protocol.clone(),
            user: entry.user.clone(),
            password: entry.password.as_deref().map(|pw| mask(pw, reveal)),
            full_access: if entry.full_access { "yes" } else { "no" },
            description: entry.description.clone(),
        }
    }
}

/// Format servers as a table string
#[must_use]
pub fn format_table(rows: &[ServerRow]) -> String {
    if rows.is_empty() {
        return "No servers found".to_string();
    }

    let mut table = Table::new([
        "Name",
        "Host",
        "Protocol",
        "Port",
        "User",
        "Password",
        "Full access",
        "Description",
    ]);
    for row in rows {
        table.push_row([
            row.name.clone(),
            row.host.clone(),
            row.protocol.clone(),
            row.port.to_string(),
            row.user.clone(),
            row.password.clone().unwrap_or_default(),
            row.full_access.to_string(),
            row.description.clone(),
        ]);
    }
    table.render()
}

/// Format servers as a JSON array
///
/// # Errors
///
/// Returns `CliError::Config` if JSON serialization fails.
pub fn format_json(rows: &[ServerRow]) -> Result<String, CliError> {
    serde_json::to_string_pretty(rows)
        .map_err(|e| CliError::Config(format!("Failed to serialize to JSON: {e}")))
}
