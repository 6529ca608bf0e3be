//! Configuration file management for resuwin.
//!
//! This module handles loading and saving application configuration from TOML files.
//! Configuration is stored in the user's config directory. A missing file is
//! replaced with written defaults on first load so `resuwin config` always has
//! something to open.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `resuwin list-devices`
    /// - device name from `resuwin list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Recording sample rate in Hz (16000 recommended for speech)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
        }
    }
}

/// ResuWin API endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the ResuWin API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (uploads of long answers can be slow)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.resuwin.com".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Interview flow configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewConfig {
    /// Maximum submission attempts for one answer set. Retries only happen
    /// for retryable failures (network, server errors); answers are never
    /// re-recorded between attempts.
    #[serde(default = "default_submit_attempts")]
    pub submit_attempts: u32,
}

fn default_submit_attempts() -> u32 {
    3
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            submit_attempts: default_submit_attempts(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResuwinConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub interview: InterviewConfig,
}

impl ResuwinConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// If the file does not exist yet, default configuration is written to
    /// disk and returned.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the config file cannot be read or written
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;

        if !config_path.exists() {
            let config = ResuwinConfig::default();
            config.save()?;
            tracing::info!("Default configuration written to {}", config_path.display());
            return Ok(config);
        }

        let config_content = fs::read_to_string(&config_path)?;
        let config: ResuwinConfig = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Saves configuration to the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be written
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = get_config_path()?;
        let config_content = toml::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        tracing::info!("Configuration saved");
        Ok(())
    }
}

/// Retrieves the path to the config file, creating the config directory if needed.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> Result<PathBuf, std::io::Error> {
    let home = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "Could not find home directory")
    })?;
    let config_path = home.join(".config").join("resuwin").join("resuwin.toml");

    std::fs::create_dir_all(config_path.parent().unwrap())?;

    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: ResuwinConfig = toml::from_str("").unwrap();
        assert_eq!(config.audio.device, "default");
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.api.base_url, "https://api.resuwin.com");
        assert_eq!(config.interview.submit_attempts, 3);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: ResuwinConfig = toml::from_str(
            r#"
            [audio]
            device = "2"

            [interview]
            submit_attempts = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.audio.device, "2");
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.interview.submit_attempts, 1);
        assert_eq!(config.api.timeout_secs, 120);
    }

    #[test]
    fn config_serializes_round_trip() {
        let config = ResuwinConfig::default();
        let toml_text = toml::to_string_pretty(&config).unwrap();
        let parsed: ResuwinConfig = toml::from_str(&toml_text).unwrap();
        assert_eq!(parsed.api.base_url, config.api.base_url);
        assert_eq!(parsed.audio.sample_rate, config.audio.sample_rate);
    }
}
