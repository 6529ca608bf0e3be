//! ResuWin API token storage.
//!
//! The bearer token is kept out of the main config file and stored in the
//! user's local data directory with owner-only permissions. The token is
//! issued by the ResuWin account page; when it expires the API answers 401
//! and the user re-runs `resuwin auth`.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Secrets {
    api_token: Option<String>,
}

/// Saves the API bearer token, replacing any existing one.
///
/// # Errors
/// - If the data directory cannot be determined or created
/// - If the secrets file cannot be written
pub fn save_api_token(token: &str) -> anyhow::Result<()> {
    let path = secrets_path()?;
    save_token_at(&path, token)
}

/// Reads the stored API bearer token, if any.
///
/// # Errors
/// - If the secrets file exists but cannot be read or parsed
pub fn get_api_token() -> anyhow::Result<Option<String>> {
    let path = secrets_path()?;
    read_token_at(&path)
}

/// Removes the stored token (used after a forced sign-out).
///
/// # Errors
/// - If the secrets file cannot be removed
pub fn clear_api_token() -> anyhow::Result<()> {
    let path = secrets_path()?;
    if path.exists() {
        fs::remove_file(&path)?;
        tracing::info!("API token cleared");
    }
    Ok(())
}

fn save_token_at(path: &Path, token: &str) -> anyhow::Result<()> {
    if token.trim().is_empty() {
        return Err(anyhow!("API token cannot be empty"));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let secrets = Secrets {
        api_token: Some(token.trim().to_string()),
    };
    fs::write(path, toml::to_string_pretty(&secrets)?)?;

    // Owner-only: the file holds a live credential.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    tracing::info!("API token saved");
    Ok(())
}

fn read_token_at(path: &Path) -> anyhow::Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let secrets: Secrets = toml::from_str(&content)?;
    Ok(secrets.api_token.filter(|t| !t.is_empty()))
}

/// Path to the secrets file under the user's local data directory.
fn secrets_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home
        .join(".local")
        .join("share")
        .join("resuwin")
        .join("secrets.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");

        save_token_at(&path, "rw_token_123").unwrap();
        assert_eq!(
            read_token_at(&path).unwrap(),
            Some("rw_token_123".to_string())
        );
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        assert_eq!(read_token_at(&path).unwrap(), None);
    }

    #[test]
    fn empty_token_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        assert!(save_token_at(&path, "   ").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn secrets_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        save_token_at(&path, "rw_token_123").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
