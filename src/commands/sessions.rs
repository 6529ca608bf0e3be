//! List local session history.

use crate::history::SessionHistory;
use console::style;

/// Prints all locally recorded sessions, newest first.
///
/// # Errors
/// - If the history database cannot be opened or read
pub fn handle_sessions() -> Result<(), anyhow::Error> {
    let mut history = SessionHistory::open_default()?;
    let entries = history.list_sessions()?;

    if entries.is_empty() {
        println!("No sessions yet. Run 'resuwin interview' to start one.");
        return Ok(());
    }

    println!();
    println!("{}", style("Your interview sessions:").bold());
    println!();

    for entry in entries {
        let status = if entry.submitted {
            style("submitted").green()
        } else {
            style("not submitted").yellow()
        };

        println!(
            "  {}  {}  {} questions  [{}]",
            style(&entry.session_id).cyan(),
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.question_count,
            status
        );
        println!("      {}", entry.job_title);
    }

    println!();
    Ok(())
}
