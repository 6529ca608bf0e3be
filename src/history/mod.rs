//! Local session history.
//!
//! Remembers which interview sessions were started and submitted from this
//! machine so `resuwin results` can default to the most recent one.

pub mod storage;

pub use storage::{SessionHistory, SessionRecord};
