//! The session controller: one state machine from media grant to submission.
//!
//! Drives Media Acquisition, the per-question recorder, and the submission
//! gateway. The controller is the single owner of the capture handle's
//! lifecycle: it releases media on successful submission, on abandon, and on
//! drop, and never holds two recorders at once. Recording never auto-resumes
//! between questions; the user starts each answer explicitly.

use crate::api::{ApiError, SubmissionGateway};
use crate::capture::{AnswerRecorder, MediaHandle, RecordError};
use crate::session::types::{Answer, InterviewSession, Question};
use std::time::Instant;
use thiserror::Error;

/// Where the session currently is.
///
/// `Ready` is the explicit between-questions state: media is granted and the
/// next answer is waiting for the user to press start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Awaiting media acquisition
    Setup,
    /// Media granted, waiting for the user to start the current question
    Ready,
    /// Recorder armed for the current question
    Recording,
    /// Every question has an answer; submission is enabled
    AllAnswered,
    /// Submission in flight
    Submitting,
    /// Submission failed; answers retained, media still open, retry allowed
    Failed,
    /// Submitted successfully; media released, local state cleared
    Done,
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// The operation needs a granted capture handle.
    #[error("media has not been granted for this session")]
    NoMedia,
    /// The operation is not legal in the current phase.
    #[error("cannot {action} while the session is in the {phase:?} phase")]
    WrongPhase {
        action: &'static str,
        phase: SessionPhase,
    },
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Submit(#[from] ApiError),
}

/// Orchestrates one interview session end to end.
pub struct SessionController {
    session: InterviewSession,
    media: Option<MediaHandle>,
    recorder: Option<AnswerRecorder>,
    answers: Vec<Answer>,
    /// Index of the question currently being answered
    cursor: usize,
    phase: SessionPhase,
    /// Set on entering Recording, cleared on every transition out of it
    recording_started_at: Option<Instant>,
}

impl SessionController {
    pub fn new(session: InterviewSession) -> Self {
        Self {
            session,
            media: None,
            recorder: None,
            answers: Vec::new(),
            cursor: 0,
            phase: SessionPhase::Setup,
            recording_started_at: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn session_id(&self) -> &str {
        &self.session.id
    }

    /// The question awaiting an answer, None once all are answered.
    pub fn current_question(&self) -> Option<&Question> {
        self.session.questions.get(self.cursor)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn question_count(&self) -> usize {
        self.session.questions.len()
    }

    /// Necessary and sufficient condition for enabling submission.
    pub fn ready_to_submit(&self) -> bool {
        self.answers.len() == self.session.questions.len()
    }

    /// Advisory elapsed time for the in-progress recording, zero otherwise.
    pub fn elapsed_seconds(&self) -> u64 {
        self.recording_started_at
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0)
    }

    /// False once the capture stream has reported an error mid-session.
    /// The session is degraded; the controller does not auto-recover.
    pub fn media_healthy(&self) -> bool {
        self.media.as_ref().map(|m| m.is_healthy()).unwrap_or(false)
    }

    /// Accepts the acquired capture handle and leaves Setup.
    ///
    /// A session with no questions goes straight to AllAnswered.
    ///
    /// # Errors
    /// - [`SessionError::WrongPhase`] outside Setup
    pub fn media_granted(&mut self, handle: MediaHandle) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Setup {
            return Err(SessionError::WrongPhase {
                action: "grant media",
                phase: self.phase,
            });
        }

        self.media = Some(handle);
        self.phase = if self.cursor < self.session.questions.len() {
            SessionPhase::Ready
        } else {
            SessionPhase::AllAnswered
        };
        tracing::info!(
            "Media granted for session {} ({} questions)",
            self.session.id,
            self.session.questions.len()
        );
        Ok(())
    }

    /// Arms the recorder for the current question.
    ///
    /// # Errors
    /// - [`SessionError::WrongPhase`] unless the session is Ready
    /// - [`SessionError::NoMedia`] if no capture handle was granted
    /// - [`SessionError::Record`] if the recorder cannot arm
    pub fn start_answer(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Ready {
            return Err(SessionError::WrongPhase {
                action: "start recording",
                phase: self.phase,
            });
        }
        let media = self.media.as_ref().ok_or(SessionError::NoMedia)?;

        self.recorder = Some(AnswerRecorder::start(media)?);
        self.recording_started_at = Some(Instant::now());
        self.phase = SessionPhase::Recording;
        tracing::debug!(
            "Recording question {}/{}",
            self.cursor + 1,
            self.session.questions.len()
        );
        Ok(())
    }

    /// Finalizes the current recording into an Answer and advances the
    /// question cursor.
    ///
    /// On an empty or failed take the session returns to Ready for the same
    /// question so the user can redo it; no Answer is appended.
    ///
    /// # Errors
    /// - [`SessionError::WrongPhase`] unless Recording
    /// - [`SessionError::Record`] if finalization fails (redo allowed)
    pub fn stop_answer(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Recording {
            return Err(SessionError::WrongPhase {
                action: "stop recording",
                phase: self.phase,
            });
        }

        // Leave Recording before finalizing so the elapsed clock never
        // outlives its question.
        self.recording_started_at = None;

        let recorder = self
            .recorder
            .take()
            .expect("Recording phase implies an armed recorder");

        match recorder.stop() {
            Ok(blob) => {
                let question = &self.session.questions[self.cursor];
                self.answers.push(Answer {
                    question_id: question.question_id.clone(),
                    recording: blob,
                });
                self.cursor += 1;

                self.phase = if self.cursor < self.session.questions.len() {
                    SessionPhase::Ready
                } else {
                    SessionPhase::AllAnswered
                };
                tracing::info!(
                    "Answer {}/{} captured for session {}",
                    self.answers.len(),
                    self.session.questions.len(),
                    self.session.id
                );
                Ok(())
            }
            Err(e) => {
                // The take is lost but the session is not: same question, redo.
                self.phase = SessionPhase::Ready;
                tracing::warn!("Answer recording failed, question can be redone: {}", e);
                Err(e.into())
            }
        }
    }

    /// Uploads the complete answer set through the gateway.
    ///
    /// Success releases the capture handle and clears local answer state.
    /// Failure keeps the answers and the open handle so the user may retry
    /// without re-recording; the retry policy belongs to the caller.
    ///
    /// # Errors
    /// - [`SessionError::WrongPhase`] unless AllAnswered or Failed
    /// - [`SessionError::Submit`] carrying the gateway failure
    pub async fn submit<G: SubmissionGateway + ?Sized>(
        &mut self,
        gateway: &G,
    ) -> Result<(), SessionError> {
        if !matches!(self.phase, SessionPhase::AllAnswered | SessionPhase::Failed) {
            return Err(SessionError::WrongPhase {
                action: "submit",
                phase: self.phase,
            });
        }
        debug_assert!(self.ready_to_submit());

        self.phase = SessionPhase::Submitting;
        match gateway.submit(&self.session.id, &self.answers).await {
            Ok(()) => {
                self.release_media();
                self.answers.clear();
                self.phase = SessionPhase::Done;
                tracing::info!("Session {} submitted", self.session.id);
                Ok(())
            }
            Err(e) => {
                self.phase = SessionPhase::Failed;
                tracing::error!("Submission failed for session {}: {}", self.session.id, e);
                Err(e.into())
            }
        }
    }

    /// Tears the session down from any phase.
    ///
    /// Discards an in-flight recording (no partial Answer is synthesized)
    /// and releases the capture handle. Safe to call repeatedly; also runs
    /// on drop so navigation-style exits cannot leak the microphone.
    pub fn abandon(&mut self) {
        if self.recorder.take().is_some() {
            tracing::info!("Session {} abandoned mid-recording", self.session.id);
        }
        self.recording_started_at = None;
        self.release_media();
    }

    fn release_media(&mut self) {
        if let Some(mut handle) = self.media.take() {
            handle.release();
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::media::SharedCapture;
    use crate::session::types::SessionStatus;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn session(question_count: usize) -> InterviewSession {
        InterviewSession {
            id: "sess-1".to_string(),
            job_title: "Backend Engineer".to_string(),
            job_description: "Rust services".to_string(),
            questions: (0..question_count)
                .map(|i| Question {
                    question_id: format!("q-{i}"),
                    question: format!("Question {i}"),
                })
                .collect(),
            created_at: Utc::now(),
            status: SessionStatus::Pending,
        }
    }

    /// Controller wired to a synthetic capture handle; returns the shared
    /// sink so tests can feed samples and observe release behavior.
    fn granted_controller(question_count: usize) -> (SessionController, Arc<SharedCapture>) {
        let handle = MediaHandle::synthetic(16000);
        let shared = handle.shared();
        let mut controller = SessionController::new(session(question_count));
        controller.media_granted(handle).unwrap();
        (controller, shared)
    }

    fn answer_current_question(controller: &mut SessionController, shared: &SharedCapture) {
        controller.start_answer().unwrap();
        shared.push_test_samples(&[100, -100, 50, -50]);
        controller.stop_answer().unwrap();
    }

    /// Gateway that fails a configured number of times before accepting,
    /// capturing the answer sets it was handed.
    struct FlakyGateway {
        failures_left: Mutex<u32>,
        calls: AtomicUsize,
        seen_answer_ids: Mutex<Vec<Vec<String>>>,
    }

    impl FlakyGateway {
        fn failing(times: u32) -> Self {
            Self {
                failures_left: Mutex::new(times),
                calls: AtomicUsize::new(0),
                seen_answer_ids: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl SubmissionGateway for FlakyGateway {
        async fn submit(&self, _session_id: &str, answers: &[Answer]) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_answer_ids
                .lock()
                .await
                .push(answers.iter().map(|a| a.question_id.clone()).collect());

            let mut failures = self.failures_left.lock().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(ApiError::Server {
                    status: 503,
                    message: "processing backlog".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn denied_permission_keeps_session_in_setup() {
        let mut controller = SessionController::new(session(3));
        // Acquisition failed: media_granted is never called.
        assert_eq!(controller.phase(), SessionPhase::Setup);
        assert!(matches!(
            controller.start_answer(),
            Err(SessionError::WrongPhase { .. })
        ));
    }

    #[test]
    fn full_question_walk_reaches_all_answered() {
        let (mut controller, shared) = granted_controller(3);

        for i in 0..3 {
            assert_eq!(controller.current_question().unwrap().question_id, format!("q-{i}"));
            assert!(!controller.ready_to_submit());
            answer_current_question(&mut controller, &shared);
        }

        assert_eq!(controller.phase(), SessionPhase::AllAnswered);
        assert!(controller.ready_to_submit());
        assert_eq!(controller.answered_count(), 3);
        assert!(controller.current_question().is_none());
    }

    #[test]
    fn submission_gating_tracks_answer_count_exactly() {
        let (mut controller, shared) = granted_controller(2);
        assert!(!controller.ready_to_submit());

        answer_current_question(&mut controller, &shared);
        assert!(!controller.ready_to_submit());

        answer_current_question(&mut controller, &shared);
        assert!(controller.ready_to_submit());
    }

    #[test]
    fn starting_twice_is_rejected() {
        let (mut controller, _shared) = granted_controller(2);
        controller.start_answer().unwrap();
        assert!(matches!(
            controller.start_answer(),
            Err(SessionError::WrongPhase { .. })
        ));
    }

    #[test]
    fn empty_take_allows_redo_of_same_question() {
        let (mut controller, shared) = granted_controller(2);

        controller.start_answer().unwrap();
        // No samples pushed: the take finalizes empty.
        assert!(matches!(
            controller.stop_answer(),
            Err(SessionError::Record(RecordError::Empty))
        ));

        // Same question, no answer appended, recorder can arm again.
        assert_eq!(controller.phase(), SessionPhase::Ready);
        assert_eq!(controller.answered_count(), 0);
        assert_eq!(controller.current_question().unwrap().question_id, "q-0");
        answer_current_question(&mut controller, &shared);
        assert_eq!(controller.answered_count(), 1);
    }

    #[test]
    fn abandon_mid_recording_releases_media_without_partial_answer() {
        let (mut controller, shared) = granted_controller(3);

        controller.start_answer().unwrap();
        shared.push_test_samples(&[1, 2, 3]);
        controller.abandon();

        assert_eq!(controller.answered_count(), 0);
        assert!(shared.is_released());
        assert_eq!(shared.release_count(), 1);
        assert!(!shared.is_armed());
    }

    #[test]
    fn abandon_after_two_of_three_keeps_submission_disabled() {
        let (mut controller, shared) = granted_controller(3);

        answer_current_question(&mut controller, &shared);
        answer_current_question(&mut controller, &shared);
        controller.abandon();

        assert_eq!(controller.answered_count(), 2);
        assert!(!controller.ready_to_submit());
        assert!(shared.is_released());
        assert_eq!(shared.release_count(), 1);
    }

    #[test]
    fn drop_releases_media() {
        let (controller, shared) = granted_controller(1);
        drop(controller);
        assert!(shared.is_released());
        assert_eq!(shared.release_count(), 1);
    }

    #[tokio::test]
    async fn failed_submission_retains_answers_and_retry_succeeds() {
        let (mut controller, shared) = granted_controller(3);
        for _ in 0..3 {
            answer_current_question(&mut controller, &shared);
        }

        let gateway = FlakyGateway::failing(1);

        // First attempt fails: answers retained, media stays open.
        let err = controller.submit(&gateway).await.unwrap_err();
        assert!(matches!(err, SessionError::Submit(ref e) if e.is_retryable()));
        assert_eq!(controller.phase(), SessionPhase::Failed);
        assert_eq!(controller.answered_count(), 3);
        assert!(!shared.is_released());

        // Retry succeeds with the identical answer set, no re-recording.
        controller.submit(&gateway).await.unwrap();
        assert_eq!(controller.phase(), SessionPhase::Done);
        assert_eq!(controller.answered_count(), 0);

        let seen = gateway.seen_answer_ids.lock().await;
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);

        // Media released exactly once across both attempts.
        assert!(shared.is_released());
        assert_eq!(shared.release_count(), 1);
    }

    #[tokio::test]
    async fn submit_is_rejected_before_all_answers_exist() {
        let (mut controller, shared) = granted_controller(2);
        answer_current_question(&mut controller, &shared);

        let gateway = FlakyGateway::failing(0);
        assert!(matches!(
            controller.submit(&gateway).await,
            Err(SessionError::WrongPhase { .. })
        ));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn elapsed_clock_only_runs_while_recording() {
        let (mut controller, shared) = granted_controller(1);
        assert_eq!(controller.elapsed_seconds(), 0);

        controller.start_answer().unwrap();
        assert!(controller.recording_started_at.is_some());

        shared.push_test_samples(&[1, 2]);
        controller.stop_answer().unwrap();
        assert!(controller.recording_started_at.is_none());
        assert_eq!(controller.elapsed_seconds(), 0);
    }

    #[test]
    fn zero_question_session_is_immediately_all_answered() {
        let (controller, _shared) = granted_controller(0);
        assert_eq!(controller.phase(), SessionPhase::AllAnswered);
        assert!(controller.ready_to_submit());
    }
}
