//! Learning-session persistence.
//! Stores keep a compact log of each answered question; the orchestrator reads
//! the most recent ones back as prompt memory.

pub mod pocketbase;
pub mod store;

pub use pocketbase::PocketBaseStore;
pub use store::InMemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{operation} failed with status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("Session store authentication failed: {0}")]
    Auth(String),
    #[error("Malformed session record: {0}")]
    Decode(String),
}

/// Tutoring calls only write `Lesson`; the other kinds exist so records
/// written by other clients of the collection decode without loss.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Lesson,
    Practice,
    Assessment,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Lesson => "lesson",
            SessionType::Practice => "practice",
            SessionType::Assessment => "assessment",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LearningSession {
    pub id: Uuid,
    pub user_id: String,
    /// `agno:{methodology}` for tutoring answers.
    pub content_id: String,
    pub session_type: SessionType,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: i64,
    /// Free-form entries, usually `{role, message}` or `{role, content}`.
    pub interactions: Vec<Value>,
    pub performance_score: Option<f64>,
    pub engagement_score: Option<f64>,
    pub difficulty_rating: Option<String>,
    pub completed: bool,
}

impl LearningSession {
    /// A completed lesson started now, with no interactions yet.
    pub fn lesson(user_id: impl Into<String>, content_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            content_id: content_id.into(),
            session_type: SessionType::Lesson,
            start_time: Utc::now(),
            end_time: None,
            duration_minutes: 0,
            interactions: Vec::new(),
            performance_score: None,
            engagement_score: None,
            difficulty_rating: None,
            completed: true,
        }
    }

    pub fn started_at(mut self, start: DateTime<Utc>) -> Self {
        self.start_time = start;
        self
    }

    /// Stamps the end time; duration is rounded down to whole minutes.
    pub fn close(&mut self, end: DateTime<Utc>) {
        self.duration_minutes = (end - self.start_time).num_minutes().max(0);
        self.end_time = Some(end);
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Newest first, at most `limit` sessions.
    async fn recent_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<LearningSession>, StoreError>;

    async fn save_session(&self, session: &LearningSession) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests;
