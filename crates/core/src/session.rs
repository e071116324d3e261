//! SessionStore trait — per-user turn history with expiry.
//!
//! Sessions are append-only: turns are never mutated or reordered once
//! stored. The store refreshes the time-to-live on every access and treats
//! expired sessions as absent.

use async_trait::async_trait;

use crate::error::SessionError;
use crate::turn::{SessionId, Turn};

/// The core SessionStore trait.
///
/// Implementations: in-memory (ephemeral), file-backed JSONL.
/// Appends to a given session are atomic within the backend; the
/// orchestrator additionally serializes whole turns per session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The backend name (e.g., "memory", "file").
    fn name(&self) -> &str;

    /// The ordered turn history for a session. An unknown or expired
    /// session reads as empty. Refreshes the TTL.
    async fn history(
        &self,
        id: &SessionId,
    ) -> std::result::Result<Vec<Turn>, SessionError>;

    /// Append a turn to a session, creating the session if needed.
    /// Refreshes the TTL.
    async fn append(
        &self,
        id: &SessionId,
        turn: Turn,
    ) -> std::result::Result<(), SessionError>;

    /// Refresh the TTL without reading or writing turns.
    async fn touch(&self, id: &SessionId) -> std::result::Result<(), SessionError>;

    /// Remove a session and its history.
    async fn clear(&self, id: &SessionId) -> std::result::Result<(), SessionError>;
}
