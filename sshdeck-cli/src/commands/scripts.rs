//! Scripts directory listing command.

use std::path::Path;

use sshdeck_core::list_scripts;

use crate::error::CliError;
use crate::format::Table;
use crate::util::create_config_manager;

/// List the scripts directory as a table
pub fn cmd_scripts(config_path: Option<&Path>, dir: Option<&Path>) -> Result<(), CliError> {
    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => {
            let config_manager = create_config_manager(config_path)?;
            let settings = config_manager.load_settings()?;
            config_manager.scripts_dir(&settings)
        }
    };

    let entries = list_scripts(&dir)
        .map_err(|e| CliError::Scripts(format!("cannot list {}: {e}", dir.display())))?;

    if entries.is_empty() {
        println!("No scripts found in {}", dir.display());
        return Ok(());
    }

    let mut table = Table::new(["Name", "Permissions", "Owner", "Modified", "Type"]);
    for entry in &entries {
        table.push_row([
            entry.name.clone(),
            entry.permissions.clone(),
            entry.owner.map_or_else(|| "-".to_string(), |uid| uid.to_string()),
            entry.modified_display(),
            entry.kind.label().to_string(),
        ]);
    }
    println!("{}", table.render());
    Ok(())
}
