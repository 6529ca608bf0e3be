//! Fetch and display the analysis for a submitted session.

use crate::api::ApiClient;
use crate::config::{self, ResuwinConfig};
use crate::history::SessionHistory;
use crate::session::SessionStatus;
use anyhow::anyhow;
use console::style;

/// Shows scoring and per-question feedback for a session.
///
/// Without an explicit id, the most recently submitted session from local
/// history is used.
///
/// # Errors
/// - If no session id is given and none exists in local history
/// - If the API call fails
pub async fn handle_results(session_id: Option<String>) -> Result<(), anyhow::Error> {
    let config_data = ResuwinConfig::load()?;
    let token = config::get_api_token()?
        .ok_or_else(|| anyhow!("No API token configured. Run 'resuwin auth' first."))?;

    let session_id = match session_id {
        Some(id) => id,
        None => {
            let mut history = SessionHistory::open_default()?;
            history
                .latest_submitted()?
                .map(|record| record.session_id)
                .ok_or_else(|| {
                    anyhow!("No submitted sessions in local history. Pass a session id explicitly.")
                })?
        }
    };

    let client = ApiClient::new(&config_data.api.base_url, &token, config_data.api.timeout_secs)?;
    let analysis = client.fetch_session(&session_id).await.map_err(|e| {
        tracing::error!("Failed to fetch session {}: {}", session_id, e);
        anyhow!("{e}")
    })?;

    println!();
    println!(
        "{} {}  ({})",
        style("Session").bold(),
        style(&analysis.id).cyan(),
        analysis.status
    );

    if analysis.status != SessionStatus::Completed {
        println!();
        println!("Processing has not finished yet. Try again in a little while.");
        return Ok(());
    }

    if let Some(score) = analysis.overall_score {
        println!("{} {:.1}/10", style("Overall score:").bold(), score);
    }

    for (index, item) in analysis.feedback.iter().enumerate() {
        println!();
        println!(
            "{} {}",
            style(format!("Q{}:", index + 1)).bold().cyan(),
            item.question
        );
        if let Some(score) = item.score {
            println!("   {} {:.1}/10", style("Score:").bold(), score);
        }
        if let Some(transcript) = &item.transcript {
            println!("   {} {}", style("You said:").dim(), transcript);
        }
        if let Some(feedback) = &item.feedback {
            println!("   {} {}", style("Feedback:").bold(), feedback);
        }
        if let Some(url) = &item.audio_url {
            println!("   {} {}", style("Recording:").dim(), url);
        }
    }

    println!();
    Ok(())
}
