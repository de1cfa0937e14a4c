//! Session store — in-memory quiz sessions with idle expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::session::QuizSession;
use crate::error::QuizError;

/// In-memory session map. Sessions are never persisted.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, QuizSession>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        })
    }

    /// Insert a new session and return a copy of it.
    pub async fn insert(&self, session: QuizSession) -> QuizSession {
        debug!(session = %session.id, "Quiz session created");
        let copy = session.clone();
        self.sessions.write().await.insert(session.id, session);
        copy
    }

    /// Snapshot of a session.
    pub async fn get(&self, id: Uuid) -> Result<QuizSession, QuizError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(QuizError::SessionNotFound(id))
    }

    /// Run a synchronous transition against a session under the write lock.
    ///
    /// The closure's result is returned alongside a snapshot of the session
    /// taken after it ran, whether or not it succeeded.
    pub async fn update<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut QuizSession) -> Result<T, QuizError>,
    ) -> Result<(Result<T, QuizError>, QuizSession), QuizError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(QuizError::SessionNotFound(id))?;
        let result = f(session);
        Ok((result, session.clone()))
    }

    /// Remove sessions idle longer than the timeout. Returns how many went.
    pub async fn expire_idle(&self) -> usize {
        let idle = chrono::Duration::from_std(self.idle_timeout)
            .unwrap_or_else(|_| chrono::Duration::weeks(52));
        let cutoff = chrono::Utc::now() - idle;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.updated_at > cutoff);
        let expired = before - sessions.len();

        if expired > 0 {
            info!(count = expired, "Expired idle quiz sessions");
        }
        expired
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Spawn a background task that periodically drops idle sessions.
pub fn spawn_expiry_task(store: Arc<SessionStore>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            store.expire_idle().await;
        }
    })
}
