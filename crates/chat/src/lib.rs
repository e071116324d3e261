//! Conversation layer for helpdesk.
//!
//! The gateway and CLI construct a [`ConversationService`] once at
//! startup and feed it user messages; everything else in this crate is
//! the machinery behind a single turn.

pub mod gate;
pub mod prompt;
pub mod prompts;
pub mod service;
pub mod token;

pub use gate::needs_retrieval;
pub use prompt::{PromptAssembler, PromptBundle};
pub use prompts::StaticPrompts;
pub use service::{ChatError, ConversationService, FALLBACK_REPLY, MAX_MESSAGE_CHARS};
pub use token::estimate_tokens;
