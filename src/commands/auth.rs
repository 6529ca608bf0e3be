//! API token management.
//!
//! Stores the ResuWin bearer token used on every API call. Users can keep an
//! existing token by pressing Enter without entering anything.

use crate::config;
use cliclack::{intro, note, outro, password};
use console::style;

/// Handles API token entry and storage.
///
/// If a token is already saved, the user can press Enter to keep it.
/// With `clear` set, the stored token is removed instead.
pub async fn handle_auth(clear: bool) -> Result<(), anyhow::Error> {
    tracing::info!("=== resuwin Authentication ===");

    if clear {
        config::clear_api_token()?;
        println!("Stored API token removed.");
        return Ok(());
    }

    ctrlc::set_handler(move || {}).expect("setting Ctrl-C handler");

    intro(style(" auth ").on_white().black())?;

    let current_token = config::get_api_token().ok().flatten();

    if current_token.is_some() {
        note("Current token", "A ResuWin API token is already stored.")?;
    } else {
        note(
            "No token stored",
            "Get your API token from the ResuWin account page.",
        )?;
    }

    let token = if current_token.is_some() {
        password("Enter ResuWin API token (press Enter to keep current):")
            .allow_empty()
            .interact()
            .map_err(|e| anyhow::anyhow!("Token input cancelled: {e}"))?
    } else {
        password("Enter ResuWin API token:")
            .interact()
            .map_err(|e| anyhow::anyhow!("Token input cancelled: {e}"))?
    };

    // If empty input and we have a current token, keep the current one
    let token_to_save = if token.is_empty() {
        match current_token {
            Some(existing) => existing,
            None => return Err(anyhow::anyhow!("API token cannot be empty")),
        }
    } else {
        token
    };

    config::save_api_token(&token_to_save)?;

    outro("✅ Token saved.")?;

    tracing::info!("Authentication completed");
    Ok(())
}
