//! HTTP client for the ResuWin mock interview endpoints.
//!
//! Three calls make up the consumed contract: start an interview (JSON),
//! process a session's answers (multipart upload), and fetch the finished
//! analysis. Answer blobs are opaque payloads; the client never inspects
//! recording contents.

use super::{ApiError, SubmissionGateway};
use crate::session::{Answer, InterviewSession, SessionStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request body for `POST /mock-interview/start`.
#[derive(Debug, Clone, Serialize)]
pub struct StartInterviewRequest {
    pub job_title: String,
    pub job_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_id: Option<String>,
}

/// Acknowledgment from `POST /mock-interview/{id}/process`.
#[derive(Debug, Deserialize)]
struct ProcessAck {
    #[serde(default)]
    message: String,
}

/// Per-question scoring from `GET /mock-interview/sessions/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionFeedback {
    pub question_id: String,
    pub question: String,
    pub transcript: Option<String>,
    pub score: Option<f32>,
    pub feedback: Option<String>,
    pub audio_url: Option<String>,
}

/// Full analysis result for a processed session.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionAnalysis {
    pub id: String,
    pub status: SessionStatus,
    pub overall_score: Option<f32>,
    #[serde(default)]
    pub feedback: Vec<QuestionFeedback>,
}

/// Bearer-authenticated client for the ResuWin API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// Creates a client for the given endpoint and bearer token.
    ///
    /// # Errors
    /// - If the underlying HTTP client cannot be constructed
    pub fn new(base_url: &str, token: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Starts a new mock interview session and returns its question list.
    ///
    /// # Errors
    /// - [`ApiError::Unauthorized`] if the token is rejected
    /// - [`ApiError::Network`] on connection or timeout failures
    /// - [`ApiError::Decode`] if the response body is malformed
    pub async fn start_interview(
        &self,
        request: &StartInterviewRequest,
    ) -> Result<InterviewSession, ApiError> {
        let url = format!("{}/mock-interview/start", self.base_url);
        tracing::debug!(
            "ResuWin API call: POST {} (job_title={})",
            url,
            request.job_title
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response).await?;

        let session: InterviewSession = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        tracing::info!(
            "Interview session started: {} ({} questions)",
            session.id,
            session.questions.len()
        );
        Ok(session)
    }

    /// Uploads all recorded answers for a session in one multipart request.
    ///
    /// Each answer contributes a `recordings` file part named
    /// `{question_id}.wav` plus a `question_ids` text part, preserving
    /// question order. The answers are only borrowed; a failed attempt
    /// leaves them intact for an identical retry.
    pub async fn submit_answers(
        &self,
        session_id: &str,
        answers: &[Answer],
    ) -> Result<(), ApiError> {
        let url = format!("{}/mock-interview/{}/process", self.base_url, session_id);
        tracing::debug!(
            "ResuWin API call: POST {} ({} answers, {} bytes total)",
            url,
            answers.len(),
            answers.iter().map(|a| a.recording.len()).sum::<usize>()
        );

        let mut form = reqwest::multipart::Form::new();
        for answer in answers {
            let part = reqwest::multipart::Part::bytes(answer.recording.clone())
                .file_name(format!("{}.wav", answer.question_id))
                .mime_str("audio/wav")
                .map_err(|e| ApiError::Request(e.to_string()))?;
            form = form
                .part("recordings", part)
                .text("question_ids", answer.question_id.clone());
        }

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response).await?;

        let ack: ProcessAck = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        tracing::info!(
            "Answers submitted for session {}: {}",
            session_id,
            if ack.message.is_empty() {
                "accepted"
            } else {
                &ack.message
            }
        );
        Ok(())
    }

    /// Fetches the full analysis for a submitted session.
    ///
    /// Scores arrive once background processing completes; a session fetched
    /// too early comes back with a non-completed status and empty feedback.
    pub async fn fetch_session(&self, session_id: &str) -> Result<SessionAnalysis, ApiError> {
        let url = format!("{}/mock-interview/sessions/{}", self.base_url, session_id);
        tracing::debug!("ResuWin API call: GET {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SubmissionGateway for ApiClient {
    async fn submit(&self, session_id: &str, answers: &[Answer]) -> Result<(), ApiError> {
        self.submit_answers(session_id, answers).await
    }
}

/// Maps transport-level failures to the API error taxonomy.
fn map_send_error(e: reqwest::Error) -> ApiError {
    if e.is_connect() {
        ApiError::Network(
            "failed to connect to the ResuWin API server. Check your internet connection"
                .to_string(),
        )
    } else if e.is_timeout() {
        ApiError::Network("request to the ResuWin API timed out".to_string())
    } else {
        ApiError::Network(e.to_string())
    }
}

/// Converts non-success responses into typed errors, consuming the body for
/// the error message.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    Err(classify_status(status.as_u16(), body))
}

/// Pure status-code classification, shared by every endpoint.
fn classify_status(status: u16, message: String) -> ApiError {
    match status {
        401 | 403 => ApiError::Unauthorized,
        429 => ApiError::RateLimited,
        500..=599 => ApiError::Server { status, message },
        _ => ApiError::Api { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_statuses_are_fatal() {
        assert!(matches!(
            classify_status(401, String::new()),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            classify_status(403, String::new()),
            ApiError::Unauthorized
        ));
        assert!(!classify_status(401, String::new()).is_retryable());
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = classify_status(503, "maintenance".to_string());
        assert!(matches!(err, ApiError::Server { status: 503, .. }));
        assert!(err.is_retryable());
        assert!(classify_status(429, String::new()).is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        let err = classify_status(422, "bad input".to_string());
        assert!(matches!(err, ApiError::Api { status: 422, .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn start_request_omits_missing_resume() {
        let request = StartInterviewRequest {
            job_title: "Backend Engineer".to_string(),
            job_description: "Rust services".to_string(),
            resume_id: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("resume_id").is_none());
        assert_eq!(json["job_title"], "Backend Engineer");
    }

    #[test]
    fn analysis_parses_with_partial_feedback() {
        let json = r#"{
            "id": "9f41c2aa",
            "status": "completed",
            "overall_score": 7.5,
            "feedback": [
                {
                    "question_id": "q-1",
                    "question": "Tell me about yourself.",
                    "transcript": "I am a backend engineer...",
                    "score": 8.0,
                    "feedback": "Good structure.",
                    "audio_url": null
                }
            ]
        }"#;

        let analysis: SessionAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.overall_score, Some(7.5));
        assert_eq!(analysis.feedback.len(), 1);
        assert!(analysis.feedback[0].audio_url.is_none());
    }

    #[test]
    fn analysis_parses_before_processing_finishes() {
        let json = r#"{"id": "9f41c2aa", "status": "in_progress", "overall_score": null}"#;
        let analysis: SessionAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.status, SessionStatus::InProgress);
        assert!(analysis.feedback.is_empty());
    }
}
