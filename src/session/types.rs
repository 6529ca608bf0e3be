//! Domain types for a mock interview session.
//!
//! `InterviewSession` is created by the ResuWin API when an interview is
//! started; the client holds a read-only working copy for the session's
//! lifetime. Question order is significant: questions are presented
//! sequentially and answers are collected in the same order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single interview question. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question_id: String,
    pub question: String,
}

/// Processing status of a session, as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    InProgress,
    Completed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// A mock interview session as returned by `POST /mock-interview/start`.
#[derive(Debug, Clone, Deserialize)]
pub struct InterviewSession {
    /// Opaque identifier assigned by the API
    pub id: String,
    pub job_title: String,
    pub job_description: String,
    /// Ordered question list; index = current position
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
    pub status: SessionStatus,
}

/// A finalized recording for one question. One Answer per Question,
/// collected in question order. The blob is opaque WAV bytes; a failed
/// submission leaves it untouched so retries reuse the same set.
#[derive(Clone)]
pub struct Answer {
    pub question_id: String,
    pub recording: Vec<u8>,
}

impl std::fmt::Debug for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Answer")
            .field("question_id", &self.question_id)
            .field("recording_bytes", &self.recording.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_start_response_shape() {
        let json = r#"{
            "id": "9f41c2aa",
            "job_title": "Backend Engineer",
            "job_description": "Rust services",
            "questions": [
                {"question_id": "q-1", "question": "Tell me about yourself."},
                {"question_id": "q-2", "question": "Describe a hard bug you fixed."}
            ],
            "created_at": "2026-08-12T09:30:00Z",
            "status": "pending"
        }"#;

        let session: InterviewSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.id, "9f41c2aa");
        assert_eq!(session.questions.len(), 2);
        assert_eq!(session.questions[0].question_id, "q-1");
        assert_eq!(session.status, SessionStatus::Pending);
    }

    #[test]
    fn status_round_trips_snake_case() {
        let status: SessionStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, SessionStatus::InProgress);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"in_progress\"");
    }
}
