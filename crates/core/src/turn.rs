//! Turn and Session domain types.
//!
//! These are the core value objects of the conversation layer:
//! the user sends a message → the orchestrator builds a prompt → the
//! provider answers → both sides are appended to the session as Turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a turn in a conversation.
///
/// System instructions are not stored turns — they are assembled per
/// request by the prompt assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

/// A single turn in a conversation. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn
    pub role: Role,

    /// The text content
    pub content: String,

    /// Token count reported by the provider, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u32>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a new user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            token_count: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            token_count: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach a token count reported by the provider.
    pub fn with_token_count(mut self, tokens: u32) -> Self {
        self.token_count = Some(tokens);
        self
    }
}

/// A session is an ordered sequence of turns with an expiry deadline.
///
/// Owned exclusively by the session store; the orchestrator only reads
/// and appends through the `SessionStore` trait.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session ID
    pub id: SessionId,

    /// Ordered turns, strictly by append time
    pub turns: Vec<Turn>,

    /// When this session was created
    pub created_at: DateTime<Utc>,

    /// When this session expires (refreshed on access)
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a new empty session expiring `ttl_secs` from now.
    pub fn new(id: SessionId, ttl_secs: u64) -> Self {
        let now = Utc::now();
        Self {
            id,
            turns: Vec::new(),
            created_at: now,
            expires_at: now + chrono::Duration::seconds(ttl_secs as i64),
        }
    }

    /// Append a turn and refresh the expiry deadline.
    pub fn push(&mut self, turn: Turn, ttl_secs: u64) {
        self.refresh(ttl_secs);
        self.turns.push(turn);
    }

    /// Refresh the expiry deadline without appending.
    pub fn refresh(&mut self, ttl_secs: u64) {
        self.expires_at = Utc::now() + chrono::Duration::seconds(ttl_secs as i64);
    }

    /// Whether this session is past its expiry deadline.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Total token count estimate for the history (rough: 4 chars ≈ 1 token).
    pub fn estimated_tokens(&self) -> usize {
        self.turns.iter().map(|t| t.content.len() / 4).sum()
    }
}
