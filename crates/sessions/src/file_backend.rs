//! File-based session store — one JSON file per session.
//!
//! Sessions survive restarts. Expired sessions are deleted when read
//! or touched, never by a background sweeper.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use helpdesk_core::error::SessionError;
use helpdesk_core::{Session, SessionId, SessionStore, Turn};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// A session store persisting each session as `{dir}/{id}.json`.
pub struct FileSessions {
    dir: PathBuf,
    ttl_secs: u64,
    // Serializes read-modify-write cycles across the whole directory
    io_lock: Mutex<()>,
}

impl FileSessions {
    pub fn new(dir: impl Into<PathBuf>, ttl_secs: u64) -> Self {
        Self {
            dir: dir.into(),
            ttl_secs,
            io_lock: Mutex::new(()),
        }
    }

    fn session_path(&self, id: &SessionId) -> PathBuf {
        // Session IDs come from clients; strip anything path-like
        let safe: String = id
            .0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }

    fn load(&self, path: &Path) -> Option<Session> {
        let content = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str::<Session>(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping corrupted session file");
                None
            }
        }
    }

    fn save(&self, path: &Path, session: &Session) -> Result<(), SessionError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            SessionError::Storage(format!("Failed to create session directory: {e}"))
        })?;
        let content = serde_json::to_string(session)
            .map_err(|e| SessionError::Storage(format!("Failed to serialize session: {e}")))?;
        std::fs::write(path, content)
            .map_err(|e| SessionError::Storage(format!("Failed to write session file: {e}")))
    }

    fn remove(&self, path: &Path) {
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "Failed to delete session file");
            }
        }
    }
}

#[async_trait]
impl SessionStore for FileSessions {
    fn name(&self) -> &str {
        "file"
    }

    async fn history(&self, id: &SessionId) -> Result<Vec<Turn>, SessionError> {
        let _guard = self.io_lock.lock().await;
        let path = self.session_path(id);
        match self.load(&path) {
            Some(session) if session.is_expired() => {
                debug!(session = %id, "Session expired, deleting");
                self.remove(&path);
                Ok(Vec::new())
            }
            Some(mut session) => {
                session.refresh(self.ttl_secs);
                self.save(&path, &session)?;
                Ok(session.turns)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn append(&self, id: &SessionId, turn: Turn) -> Result<(), SessionError> {
        let _guard = self.io_lock.lock().await;
        let path = self.session_path(id);
        let mut session = match self.load(&path) {
            Some(s) if !s.is_expired() => s,
            _ => Session::new(id.clone(), self.ttl_secs),
        };
        session.push(turn, self.ttl_secs);
        self.save(&path, &session)
    }

    async fn touch(&self, id: &SessionId) -> Result<(), SessionError> {
        let _guard = self.io_lock.lock().await;
        let path = self.session_path(id);
        match self.load(&path) {
            Some(session) if session.is_expired() => {
                self.remove(&path);
                Ok(())
            }
            Some(mut session) => {
                session.refresh(self.ttl_secs);
                self.save(&path, &session)
            }
            None => Ok(()),
        }
    }

    async fn clear(&self, id: &SessionId) -> Result<(), SessionError> {
        let _guard = self.io_lock.lock().await;
        self.remove(&self.session_path(id));
        Ok(())
    }
}
