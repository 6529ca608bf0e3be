//! The mock interview flow.
//!
//! Starts a session against the ResuWin API, acquires the microphone once,
//! walks the question list recording one answer per question, then submits
//! the full answer set. The capture handle is released on every exit path:
//! submission success, user abandon, Ctrl-C, and error unwinds (controller
//! drop).

use crate::api::{ApiClient, ApiError, StartInterviewRequest};
use crate::capture::{self, CaptureConstraints, CaptureError};
use crate::config::{self, ResuwinConfig};
use crate::history::SessionHistory;
use crate::session::{SessionController, SessionError, SessionPhase};
use anyhow::anyhow;
use console::style;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Delay between submission attempts for retryable failures.
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// What the user decided during the question loop.
enum LoopOutcome {
    Completed,
    Abandoned,
}

/// Handles a full mock interview session.
///
/// # Errors
/// - If configuration or the API token cannot be loaded
/// - If the interview cannot be started or the microphone acquired
/// - If submission exhausts its configured attempts
pub async fn handle_interview(
    job_title: Option<String>,
    job_description: Option<String>,
) -> Result<(), anyhow::Error> {
    tracing::info!("=== resuwin Interview Started ===");

    let config_data = ResuwinConfig::load().map_err(|err| {
        tracing::error!("Failed to load configuration: {err}");
        anyhow!("Configuration error: {err}. Check your ~/.config/resuwin/resuwin.toml file.")
    })?;

    let token = config::get_api_token()?
        .ok_or_else(|| anyhow!("No API token configured. Run 'resuwin auth' first."))?;

    // Prompt for whatever the flags didn't provide.
    let (job_title, job_description) = prompt_for_job(job_title, job_description)?;

    let client = ApiClient::new(&config_data.api.base_url, &token, config_data.api.timeout_secs)?;

    println!();
    println!("Starting interview session for {}...", style(&job_title).bold());

    let session = client
        .start_interview(&StartInterviewRequest {
            job_title,
            job_description,
            resume_id: None,
        })
        .await
        .map_err(|e| {
            tracing::error!("Failed to start interview: {e}");
            anyhow!("{e}")
        })?;

    let mut history = SessionHistory::open_default()?;
    if let Err(e) = history.record_session(&session) {
        tracing::warn!("Failed to record session in history: {}", e);
    }

    println!(
        "Session {} created with {} questions.",
        style(&session.id).cyan(),
        session.questions.len()
    );
    println!();

    // One capture handle for the whole session. Denial is terminal for this
    // attempt; the user re-runs the command to try again.
    let constraints = CaptureConstraints {
        device: config_data.audio.device.clone(),
        sample_rate: config_data.audio.sample_rate,
    };
    let handle = match capture::acquire(&constraints) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!("Microphone acquisition failed: {}", e);
            print_capture_help(&e);
            return Err(anyhow!("{e}"));
        }
    };

    tracing::info!("Recording at {}Hz", handle.sample_rate());

    let mut controller = SessionController::new(session);
    let session_id = controller.session_id().to_string();
    controller
        .media_granted(handle)
        .map_err(|e| anyhow!("{e}"))?;

    // Raw-mode SIGINT arrives as a key event; this flag covers the prompt
    // and submission phases outside raw mode.
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::SeqCst);
        })
        .map_err(|e| anyhow!("Failed to register Ctrl-C handler: {e}"))?;
    }

    match run_question_loop(&mut controller, &interrupted)? {
        LoopOutcome::Abandoned => {
            controller.abandon();
            println!();
            println!("Interview abandoned. Nothing was submitted.");
            tracing::info!("=== resuwin Interview Abandoned ===");
            return Ok(());
        }
        LoopOutcome::Completed => {}
    }

    println!();
    println!(
        "All {} questions answered.",
        style(controller.question_count()).bold()
    );

    let confirmed = cliclack::confirm("Submit your answers for scoring?")
        .initial_value(true)
        .interact()
        .unwrap_or(false);
    if !confirmed || interrupted.load(Ordering::SeqCst) {
        controller.abandon();
        println!("Interview discarded. Nothing was submitted.");
        return Ok(());
    }

    submit_with_retries(&mut controller, &client, config_data.interview.submit_attempts).await?;

    if let Err(e) = history.mark_submitted(&session_id) {
        tracing::warn!("Failed to update history: {}", e);
    }

    println!();
    println!("{} Answers submitted for scoring.", style("✓").green());
    println!(
        "Run {} once processing completes.",
        style(format!("resuwin results {session_id}")).cyan()
    );

    tracing::info!("=== resuwin Interview Completed ===");
    Ok(())
}

/// Walks every question: Enter starts and finishes an answer, `r` after a
/// failed take retries, Escape/q/Ctrl-C abandons.
fn run_question_loop(
    controller: &mut SessionController,
    interrupted: &AtomicBool,
) -> Result<LoopOutcome, anyhow::Error> {
    let total = controller.question_count();
    let mut warned_unhealthy = false;

    while controller.phase() != SessionPhase::AllAnswered {
        let question = controller
            .current_question()
            .ok_or_else(|| anyhow!("no question awaiting an answer"))?;
        println!(
            "{} {}",
            style(format!(
                "Question {}/{}:",
                controller.answered_count() + 1,
                total
            ))
            .bold()
            .cyan(),
            question.question
        );

        let _guard = RawModeGuard::new()?;
        let mut status = String::new();

        loop {
            if interrupted.load(Ordering::SeqCst) {
                return Ok(LoopOutcome::Abandoned);
            }

            if !controller.media_healthy() && !warned_unhealthy {
                warned_unhealthy = true;
                print!(
                    "\r\n{} microphone stream reported an error; recordings may be incomplete\r\n",
                    style("warning:").yellow()
                );
            }

            let line = match controller.phase() {
                SessionPhase::Recording => format!(
                    "  {} {:>3}s   (Enter to finish, Esc to abandon)",
                    style("● recording").red(),
                    controller.elapsed_seconds()
                ),
                _ => "  press Enter to start answering   (Esc to abandon)".to_string(),
            };
            if line != status {
                // Overwrite the previous status line in place.
                print!("\r{:<70}", line);
                std::io::stdout().flush().ok();
                status = line;
            } else if controller.phase() == SessionPhase::Recording {
                print!("\r{:<70}", status);
                std::io::stdout().flush().ok();
            }

            if !event::poll(Duration::from_millis(100))? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match key.code {
                KeyCode::Enter => {
                    if controller.phase() == SessionPhase::Recording {
                        match controller.stop_answer() {
                            Ok(()) => {
                                print!("\r{:<70}\r", "");
                                print!("  {} answer captured\r\n", style("✓").green());
                                std::io::stdout().flush().ok();
                                break;
                            }
                            Err(SessionError::Record(e)) => {
                                print!("\r{:<70}\r", "");
                                print!(
                                    "  {} {e}. Press Enter to redo this question.\r\n",
                                    style("✗").red()
                                );
                                std::io::stdout().flush().ok();
                                status.clear();
                            }
                            Err(e) => return Err(anyhow!("{e}")),
                        }
                    } else {
                        controller.start_answer().map_err(|e| anyhow!("{e}"))?;
                    }
                }
                KeyCode::Char('r') if controller.phase() == SessionPhase::Ready => {
                    // Same as Enter when waiting: start (or redo) the answer.
                    controller.start_answer().map_err(|e| anyhow!("{e}"))?;
                }
                KeyCode::Esc | KeyCode::Char('q') => {
                    return Ok(LoopOutcome::Abandoned);
                }
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(LoopOutcome::Abandoned);
                }
                _ => {}
            }
        }
    }

    Ok(LoopOutcome::Completed)
}

/// Submits the answer set, retrying only retryable failures up to the
/// configured attempt count. Answers are never re-recorded between attempts.
async fn submit_with_retries(
    controller: &mut SessionController,
    client: &ApiClient,
    attempts: u32,
) -> Result<(), anyhow::Error> {
    let attempts = attempts.max(1);

    println!();
    println!("Submitting answers...");

    for attempt in 1..=attempts {
        match controller.submit(client).await {
            Ok(()) => return Ok(()),
            Err(SessionError::Submit(e)) if e.is_retryable() && attempt < attempts => {
                tracing::warn!("Submission attempt {attempt}/{attempts} failed: {e}");
                println!(
                    "  {} attempt {attempt} failed ({e}), retrying...",
                    style("!").yellow()
                );
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(SessionError::Submit(e @ ApiError::Unauthorized)) => {
                // Fatal: the token cannot be refreshed mid-session.
                controller.abandon();
                return Err(anyhow!("{e}"));
            }
            Err(e) => return Err(anyhow!("{e}")),
        }
    }

    unreachable!("loop returns on success or final error")
}

/// Prompts for job title and description when not supplied as flags.
fn prompt_for_job(
    job_title: Option<String>,
    job_description: Option<String>,
) -> Result<(String, String), anyhow::Error> {
    let job_title = match job_title {
        Some(t) if !t.trim().is_empty() => t,
        _ => cliclack::input("What job are you interviewing for?")
            .placeholder("Backend Engineer")
            .interact()
            .map_err(|e| anyhow!("Job title input cancelled: {e}"))?,
    };

    let job_description = match job_description {
        Some(d) if !d.trim().is_empty() => d,
        _ => cliclack::input("Paste a short job description:")
            .placeholder("Rust, distributed systems, 3+ years")
            .interact()
            .map_err(|e| anyhow!("Job description input cancelled: {e}"))?,
    };

    Ok((job_title, job_description))
}

/// Prints actionable guidance for each acquisition failure class.
fn print_capture_help(error: &CaptureError) {
    eprintln!();
    match error {
        CaptureError::NotFound(msg) => {
            eprintln!("{} {}", style("Microphone not found:").red(), msg);
            eprintln!("Run 'resuwin list-devices' to see available devices.");
        }
        CaptureError::NotAllowed(msg) => {
            eprintln!("{} {}", style("Microphone unavailable:").red(), msg);
            eprintln!("Close other applications using the microphone and try again.");
        }
        CaptureError::NotReadable(msg) => {
            eprintln!("{} {}", style("Microphone failed to start:").red(), msg);
        }
    }
}

/// Keeps the terminal in raw mode for the key-driven recording loop and
/// restores it on every exit path, including error unwinds.
struct RawModeGuard;

impl RawModeGuard {
    fn new() -> Result<Self, anyhow::Error> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}
