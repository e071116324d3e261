//! In-memory session store.
//!
//! Sessions live in a map behind a read-write lock. Expired sessions
//! are dropped lazily when touched, so no background sweeper runs.

use std::collections::HashMap;

use async_trait::async_trait;
use helpdesk_core::error::SessionError;
use helpdesk_core::{Session, SessionId, SessionStore, Turn};
use tokio::sync::RwLock;
use tracing::debug;

/// An ephemeral session store. Contents are lost on restart.
pub struct InMemorySessions {
    ttl_secs: u64,
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessions {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live (non-expired) sessions.
    pub async fn len(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.values().filter(|s| !s.is_expired()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessions {
    fn name(&self) -> &str {
        "memory"
    }

    async fn history(&self, id: &SessionId) -> Result<Vec<Turn>, SessionError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(session) if session.is_expired() => {
                debug!(session = %id, "Session expired, dropping");
                sessions.remove(id);
                Ok(Vec::new())
            }
            Some(session) => {
                session.refresh(self.ttl_secs);
                Ok(session.turns.clone())
            }
            None => Ok(Vec::new()),
        }
    }

    async fn append(&self, id: &SessionId, turn: Turn) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(id.clone()).or_insert_with(|| {
            debug!(session = %id, "Creating session");
            Session::new(id.clone(), self.ttl_secs)
        });
        if session.is_expired() {
            *session = Session::new(id.clone(), self.ttl_secs);
        }
        session.push(turn, self.ttl_secs);
        Ok(())
    }

    async fn touch(&self, id: &SessionId) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(id) {
            if session.is_expired() {
                sessions.remove(id);
            } else {
                session.refresh(self.ttl_secs);
            }
        }
        Ok(())
    }

    async fn clear(&self, id: &SessionId) -> Result<(), SessionError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}
