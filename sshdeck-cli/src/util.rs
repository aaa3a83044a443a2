//! Shared utility functions used across command modules.

use std::path::Path;

use sshdeck_core::ConfigManager;

use crate::error::CliError;

/// Width of the banner rules
const RULE_WIDTH: usize = 60;

const BANNER: &str = "\
**************************************************************************
This app is designed to manage and monitor servers, devices, and networks.
**************************************************************************";

/// Creates a `ConfigManager` using the optional custom config directory
/// from CLI args.
pub fn create_config_manager(config_path: Option<&Path>) -> Result<ConfigManager, CliError> {
    match config_path {
        Some(path) => Ok(ConfigManager::with_config_dir(path)),
        None => ConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}"))),
    }
}

/// `text` centered in a rule of dashes
#[must_use]
pub fn centered_rule(text: &str) -> String {
    format!("{text:-^RULE_WIDTH$}")
}

/// Startup banner printed before a session
pub fn print_banner() {
    println!("{BANNER}");
    println!(
        "{}",
        centered_rule(&format!(" sshdeck {} ID: {} ", env!("CARGO_PKG_VERSION"), std::process::id()))
    );
}

/// Closing line printed after a session
pub fn print_goodbye() {
    println!(
        "{}",
        centered_rule(&format!(" Goodbye! ID: {} ", std::process::id()))
    );
}

/// System information block shown in verbose runs
#[must_use]
pub fn sysinfo() -> String {
    format!(
        "{}\nOS: {}({})\nApp version: {}\n{}",
        centered_rule("SYSINFO"),
        capitalize(std::env::consts::OS),
        std::env::consts::ARCH,
        env!("CARGO_PKG_VERSION"),
        "-".repeat(RULE_WIDTH)
    )
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
