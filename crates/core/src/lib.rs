//! # Helpdesk Core
//!
//! Domain types, traits, and error definitions for the helpdesk
//! retrieval-augmented support chatbot. This crate has **zero framework
//! dependencies** — it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (completion API, vector index, session
//! storage) is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod knowledge;
pub mod provider;
pub mod session;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use knowledge::{KnowledgeChunk, KnowledgeStore, RetrievalQuery, RetrievalResult};
pub use provider::{
    CompletionProvider, CompletionRequest, CompletionResponse, EmbeddingRequest,
    EmbeddingResponse, PromptMessage, PromptRole, Usage,
};
pub use session::SessionStore;
pub use turn::{Role, Session, SessionId, Turn};
