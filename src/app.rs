//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process;

/// A terminal-based mock interview client for the ResuWin career coaching API
#[derive(Parser)]
#[command(name = "resuwin")]
#[command(version)]
#[command(about = "Practice AI mock interviews from your terminal")]
#[command(
    long_about = "Practice AI mock interviews from your terminal.\n\nStart a session for a job you are applying to, answer each interview\nquestion out loud, and submit your recorded answers to the ResuWin API\nfor scoring and per-question feedback.\n\nDEFAULT COMMAND:\n    If no command is specified, 'interview' is used by default.\n    Interview options (-t, -d) can be used without explicitly saying 'interview'.\n\nEXAMPLES:\n    # Start an interview for a specific role\n    $ resuwin -t \"Backend Engineer\" -d \"Rust, distributed systems\"\n    $ resuwin interview --job-title \"Backend Engineer\"\n\n    # View scoring for your most recent submitted session\n    $ resuwin results\n\n    # View scoring for a specific session\n    $ resuwin results 9f41c2aa\n\n    # List your local session history\n    $ resuwin sessions\n\n    # Store your ResuWin API token\n    $ resuwin auth"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/resuwin/resuwin.toml\n    Logs:               ~/.local/state/resuwin/resuwin.log.*"
)]
struct Cli {
    /// Job title for the interview session (interview default command)
    #[arg(short = 't', long, global = true, value_name = "TITLE")]
    job_title: Option<String>,

    /// Job description for the interview session (interview default command)
    #[arg(short = 'd', long, global = true, value_name = "DESCRIPTION")]
    job_description: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a mock interview session (default)
    ///
    /// Starts a new session, records one spoken answer per question, and
    /// submits the answers for scoring. Press Enter to start and finish an
    /// answer, Escape/q to abandon the session.
    #[command(visible_alias = "i")]
    Interview {
        /// Job title for the interview session
        #[arg(short = 't', long, value_name = "TITLE")]
        job_title: Option<String>,

        /// Job description for the interview session
        #[arg(short = 'd', long, value_name = "DESCRIPTION")]
        job_description: Option<String>,
    },

    /// Show scoring and feedback for a submitted session
    ///
    /// Fetches the analysis for a session once the ResuWin API has finished
    /// processing it. Without an argument, uses the most recently submitted
    /// session from local history.
    #[command(visible_alias = "r")]
    Results {
        /// Session identifier (defaults to the most recently submitted session)
        #[arg(value_name = "SESSION_ID")]
        session_id: Option<String>,
    },

    /// List your local session history
    ///
    /// Shows sessions started from this machine, their question counts and
    /// whether they were submitted.
    #[command(visible_alias = "s")]
    Sessions,

    /// Store your ResuWin API token
    ///
    /// The token is obtained from your ResuWin account page and is required
    /// for every API call. Stored with restricted file permissions.
    #[command(visible_alias = "a")]
    Auth {
        /// Remove the stored token instead of entering a new one
        #[arg(long)]
        clear: bool,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Edit audio settings, the API endpoint and submission retry policy.
    /// Uses $EDITOR environment variable or falls back to nano.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in resuwin.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Generate shell completion script
    ///
    /// Generate completion script for your shell. Save the output to your
    /// shell's completion directory or source it directly.
    ///
    /// Examples:
    ///   resuwin completions bash > resuwin.bash
    ///   resuwin completions zsh > _resuwin
    ///   resuwin completions fish > resuwin.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails (e.g., authentication, recording, submission)
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging or config setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "resuwin", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    // Initialize logging for all other commands
    logging::init_logging()?;

    // Route to appropriate command handler
    match cli.command {
        None | Some(Commands::Interview { .. }) => {
            // Default command is interview
            // Merge top-level options with explicit interview command options
            // If both are specified, the explicit interview command options take precedence
            let (job_title, job_description) = match cli.command {
                Some(Commands::Interview {
                    job_title,
                    job_description,
                }) => (
                    job_title.or(cli.job_title),
                    job_description.or(cli.job_description),
                ),
                None => (cli.job_title, cli.job_description),
                _ => unreachable!(),
            };
            commands::handle_interview(job_title, job_description).await?;
        }
        Some(Commands::Results { session_id }) => {
            commands::handle_results(session_id).await?;
        }
        Some(Commands::Sessions) => {
            commands::handle_sessions()?;
        }
        Some(Commands::Auth { clear }) => {
            if let Err(e) = commands::handle_auth(clear).await {
                // Check if it's a cancellation error (cliclack already displayed the message)
                let err_msg = e.to_string();
                if err_msg.contains("cancelled") || err_msg.contains("interrupted") {
                    // Silent exit - cliclack already showed "Operation cancelled"
                    process::exit(0);
                } else {
                    return Err(e);
                }
            }
        }
        Some(Commands::Config) => {
            commands::handle_config()?;
        }
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
