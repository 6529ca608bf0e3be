//! ResuWin API client and submission gateway.
//!
//! Everything behind this module is a remote collaborator: interview
//! creation, answer processing, and analysis retrieval all happen on the
//! ResuWin servers. This crate only speaks the HTTP contract, with a bearer
//! token on every call.

pub mod client;

pub use client::{
    ApiClient, QuestionFeedback, SessionAnalysis, StartInterviewRequest,
};

use crate::session::Answer;
use async_trait::async_trait;
use thiserror::Error;

/// API failure taxonomy.
///
/// Authorization failures are fatal for the session (the token cannot be
/// refreshed from here); network and server-side failures are retryable
/// without re-recording because a failed submission never mutates the
/// answer set.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401/403: the bearer token is missing, invalid, or expired.
    #[error("authorization failed. Run 'resuwin auth' to sign in again")]
    Unauthorized,
    /// Connection, timeout, or transport failure before a response arrived.
    #[error("network error: {0}")]
    Network(String),
    /// 429 from the API.
    #[error("too many requests to the ResuWin API. Wait a moment and try again")]
    RateLimited,
    /// 5xx from the API.
    #[error("ResuWin API server error (status {status}): {message}")]
    Server { status: u16, message: String },
    /// Any other non-success response.
    #[error("ResuWin API error (status {status}): {message}")]
    Api { status: u16, message: String },
    /// The request could not be built (e.g. malformed multipart).
    #[error("failed to build API request: {0}")]
    Request(String),
    /// The response body could not be parsed.
    #[error("failed to parse API response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether a retry with identical input can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::Server { .. } | ApiError::RateLimited
        )
    }
}

/// Uploads a complete answer set for scoring.
///
/// All-or-nothing: a partial failure is reported as total failure, and the
/// borrowed answers are left untouched so the caller may re-invoke with the
/// same set. The session controller is generic over this seam so the flow
/// can be exercised without a network.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn submit(&self, session_id: &str, answers: &[Answer]) -> Result<(), ApiError>;
}
