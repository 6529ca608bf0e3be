//! Open the configuration file in the user's preferred editor.

use crate::config::file::{get_config_path, ResuwinConfig};
use anyhow::anyhow;
use std::env;
use std::process::Command;

/// Opens the config file in $EDITOR, falling back to nano then vim.
///
/// Ensures the file exists first so the editor never opens an empty buffer.
///
/// # Errors
/// - If the config file cannot be created
/// - If no editor can be launched
pub fn handle_config() -> Result<(), anyhow::Error> {
    // Writes defaults if the file does not exist yet.
    ResuwinConfig::load()?;
    let config_path = get_config_path()?;

    let editor = env::var("EDITOR").unwrap_or_else(|_| "nano".to_string());

    tracing::info!("Opening config {} with {}", config_path.display(), editor);

    let status = Command::new(&editor)
        .arg(&config_path)
        .status()
        .or_else(|_| Command::new("vim").arg(&config_path).status())
        .map_err(|e| anyhow!("Failed to launch an editor ({editor}): {e}"))?;

    if !status.success() {
        return Err(anyhow!("Editor exited with an error"));
    }

    Ok(())
}
