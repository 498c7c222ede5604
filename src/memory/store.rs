//! Process-local session store, used when no PocketBase URL is configured.

use super::{LearningSession, SessionStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    sessions: RwLock<HashMap<String, Vec<LearningSession>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn recent_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<LearningSession>, StoreError> {
        let guard = self.sessions.read().await;
        let mut sessions = guard.get(user_id).cloned().unwrap_or_default();
        // Stable sort keeps insertion order for equal timestamps; reverse after
        // so the latest save wins ties.
        sessions.sort_by_key(|s| s.start_time);
        sessions.reverse();
        sessions.truncate(limit);
        Ok(sessions)
    }

    async fn save_session(&self, session: &LearningSession) -> Result<(), StoreError> {
        let mut guard = self.sessions.write().await;
        guard
            .entry(session.user_id.clone())
            .or_default()
            .push(session.clone());
        debug!(user_id = %session.user_id, session_id = %session.id, "Session stored in memory");
        Ok(())
    }
}
