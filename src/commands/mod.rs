//! Application command handlers for resuwin.
//!
//! This module organizes command handling into separate submodules, each responsible for a specific
//! application command.
//!
//! # Commands
//! - `interview`: Record a mock interview session and submit it for scoring
//! - `results`: Fetch and display the analysis for a submitted session
//! - `sessions`: List local session history
//! - `auth`: Store the ResuWin API token
//! - `config`: Open configuration file in user's preferred editor
//! - `list_devices`: List available audio input devices
//! - `logs`: Display recent log entries

pub mod auth;
pub mod config;
pub mod interview;
pub mod list_devices;
pub mod logs;
pub mod results;
pub mod sessions;

pub use auth::handle_auth;
pub use config::handle_config;
pub use interview::handle_interview;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use results::handle_results;
pub use sessions::handle_sessions;
