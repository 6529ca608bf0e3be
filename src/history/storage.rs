//! Session history storage and retrieval using SQLite.
//!
//! Manages persistent storage of started interview sessions with timestamps
//! and submission state. This is a local convenience cache: the API remains
//! the source of truth for session contents and scores.

use anyhow::Result;
use chrono::{DateTime, Local};
use rusqlite::OptionalExtension;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

use crate::session::InterviewSession;

/// A single session entry in the local history.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// Session identifier assigned by the ResuWin API
    pub session_id: String,
    pub job_title: String,
    /// Number of questions in the session
    pub question_count: usize,
    /// Whether the answer set was successfully submitted
    pub submitted: bool,
    /// When this session was started locally
    pub created_at: DateTime<Local>,
}

/// Manages the session history database.
pub struct SessionHistory {
    /// Path to the SQLite database file
    database_path: PathBuf,
    /// Connection to the database (lazy-loaded)
    connection: Option<Connection>,
}

impl SessionHistory {
    /// Creates a new history manager for the given data directory.
    ///
    /// # Errors
    /// - If the data directory cannot be created
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let database_path = data_dir.join("session_history.db");

        Ok(Self {
            database_path,
            connection: None,
        })
    }

    /// Opens a history manager in the default local data directory.
    ///
    /// # Errors
    /// - If the home directory cannot be determined
    pub fn open_default() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Self::new(&home.join(".local").join("share").join("resuwin"))
    }

    /// Initializes database connection and creates tables if necessary.
    fn get_connection(&mut self) -> Result<&Connection> {
        if self.connection.is_none() {
            let connection = Connection::open(&self.database_path)?;

            connection.execute(
                "CREATE TABLE IF NOT EXISTS sessions (
                    session_id TEXT PRIMARY KEY,
                    job_title TEXT NOT NULL,
                    question_count INTEGER NOT NULL,
                    submitted INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                )",
                [],
            )?;

            self.connection = Some(connection);
        }

        Ok(self.connection.as_ref().unwrap())
    }

    /// Records a freshly started session.
    ///
    /// # Errors
    /// - If database connection fails
    /// - If insertion fails
    pub fn record_session(&mut self, session: &InterviewSession) -> Result<()> {
        let connection = self.get_connection()?;
        let timestamp = Local::now().to_rfc3339();

        connection.execute(
            "INSERT OR REPLACE INTO sessions
                (session_id, job_title, question_count, submitted, created_at)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![
                session.id,
                session.job_title,
                session.questions.len() as i64,
                timestamp
            ],
        )?;

        tracing::debug!("Session {} recorded in history", session.id);
        Ok(())
    }

    /// Marks a session as successfully submitted.
    ///
    /// # Errors
    /// - If database connection fails
    /// - If the update fails
    pub fn mark_submitted(&mut self, session_id: &str) -> Result<()> {
        let connection = self.get_connection()?;
        connection.execute(
            "UPDATE sessions SET submitted = 1 WHERE session_id = ?1",
            params![session_id],
        )?;

        tracing::debug!("Session {} marked submitted", session_id);
        Ok(())
    }

    /// Retrieves all sessions ordered by most recent first.
    ///
    /// # Errors
    /// - If database connection fails
    /// - If query execution or timestamp parsing fails
    pub fn list_sessions(&mut self) -> Result<Vec<SessionRecord>> {
        let connection = self.get_connection()?;

        let mut statement = connection.prepare(
            "SELECT session_id, job_title, question_count, submitted, created_at
             FROM sessions ORDER BY created_at DESC",
        )?;

        let entries = statement
            .query_map([], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// The most recently submitted session, if any.
    ///
    /// # Errors
    /// - If database connection fails
    /// - If query execution fails
    pub fn latest_submitted(&mut self) -> Result<Option<SessionRecord>> {
        let connection = self.get_connection()?;

        let mut statement = connection.prepare(
            "SELECT session_id, job_title, question_count, submitted, created_at
             FROM sessions WHERE submitted = 1 ORDER BY created_at DESC LIMIT 1",
        )?;

        let entry = statement.query_row([], row_to_record).optional()?;

        Ok(entry)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRecord> {
    let session_id = row.get::<_, String>(0)?;
    let job_title = row.get::<_, String>(1)?;
    let question_count = row.get::<_, i64>(2)? as usize;
    let submitted = row.get::<_, i64>(3)? != 0;
    let timestamp_str = row.get::<_, String>(4)?;

    let created_at = DateTime::parse_from_rfc3339(&timestamp_str)
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|_| rusqlite::Error::InvalidParameterName("Invalid timestamp format".to_string()))?;

    Ok(SessionRecord {
        session_id,
        job_title,
        question_count,
        submitted,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Question, SessionStatus};
    use chrono::Utc;

    fn session(id: &str, questions: usize) -> InterviewSession {
        InterviewSession {
            id: id.to_string(),
            job_title: "Backend Engineer".to_string(),
            job_description: "Rust services".to_string(),
            questions: (0..questions)
                .map(|i| Question {
                    question_id: format!("q-{i}"),
                    question: format!("Question {i}"),
                })
                .collect(),
            created_at: Utc::now(),
            status: SessionStatus::Pending,
        }
    }

    #[test]
    fn records_and_lists_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = SessionHistory::new(dir.path()).unwrap();

        history.record_session(&session("sess-1", 3)).unwrap();
        history.record_session(&session("sess-2", 5)).unwrap();

        let entries = history.list_sessions().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.session_id == "sess-1"));
        assert!(entries.iter().all(|e| !e.submitted));
    }

    #[test]
    fn latest_submitted_skips_unsubmitted_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = SessionHistory::new(dir.path()).unwrap();

        history.record_session(&session("sess-1", 3)).unwrap();
        history.record_session(&session("sess-2", 3)).unwrap();
        assert!(history.latest_submitted().unwrap().is_none());

        history.mark_submitted("sess-1").unwrap();
        let latest = history.latest_submitted().unwrap().unwrap();
        assert_eq!(latest.session_id, "sess-1");
        assert!(latest.submitted);
    }

    #[test]
    fn recording_same_session_twice_is_an_upsert() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = SessionHistory::new(dir.path()).unwrap();

        history.record_session(&session("sess-1", 3)).unwrap();
        history.record_session(&session("sess-1", 3)).unwrap();

        assert_eq!(history.list_sessions().unwrap().len(), 1);
    }
}
