//! Interview session domain: questions, answers, and the controller that
//! drives the record-per-question flow from media grant to submission.

pub mod controller;
pub mod types;

pub use controller::{SessionController, SessionError, SessionPhase};
pub use types::{Answer, InterviewSession, Question, SessionStatus};
