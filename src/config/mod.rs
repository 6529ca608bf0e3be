//! Configuration management for resuwin.
//!
//! This module handles loading and saving application configuration from TOML
//! files, as well as storage of the ResuWin API token. Configuration is stored
//! in the user's config directory, while the token is stored with restricted
//! permissions in the user's local data directory.

pub mod file;
pub mod secrets;

pub use file::{ApiConfig, AudioConfig, InterviewConfig, ResuwinConfig};
pub use secrets::{clear_api_token, get_api_token, save_api_token};
