//! Conversation orchestrator.
//!
//! Owns one user turn end to end: validate, lock the session, gate,
//! retrieve, assemble, complete, persist, record. Retrieval and
//! session failures degrade the turn; only invalid input is an error
//! to the caller. A provider failure appends nothing and returns the
//! fallback reply so the widget always has something to show.

use std::collections::HashMap;
use std::sync::Arc;

use helpdesk_config::AppConfig;
use helpdesk_core::provider::{CompletionProvider, CompletionRequest};
use helpdesk_core::{KnowledgeStore, RetrievalQuery, RetrievalResult, SessionId, SessionStore, Turn};
use helpdesk_metrics::{MetricsRecorder, ModelPricing};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::gate::needs_retrieval;
use crate::prompt::PromptAssembler;
use crate::prompts::StaticPrompts;

/// Hard limit on a single user message.
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Returned to the user when the provider fails. Full detail goes to the log.
pub const FALLBACK_REPLY: &str =
    "Sorry, something went wrong on our side. Please try again in a moment.";

/// Input rejections. Everything else is handled inside the service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("Message too long (max {max} characters)")]
    MessageTooLong { max: usize },
}

/// Per-session async locks: at most one in-flight mutation of a given
/// session's turn sequence; different sessions proceed independently.
struct SessionLocks {
    inner: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, id: &SessionId) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.lock().await;
            Arc::clone(locks.entry(id.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Drop the map entry once no guard or waiter holds the lock, so the
    /// map does not grow one entry per client-supplied session id forever.
    async fn release(&self, id: &SessionId) {
        let mut locks = self.inner.lock().await;
        if locks.get(id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(id);
        }
    }
}

/// The conversation service wired at startup and shared by all requests.
pub struct ConversationService {
    provider: Arc<dyn CompletionProvider>,
    knowledge: Arc<dyn KnowledgeStore>,
    sessions: Arc<dyn SessionStore>,
    metrics: Arc<MetricsRecorder>,
    prompts: StaticPrompts,
    assembler: PromptAssembler,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    top_k: usize,
    score_threshold: f32,
    locks: SessionLocks,
}

impl ConversationService {
    pub fn new(
        config: &AppConfig,
        provider: Arc<dyn CompletionProvider>,
        knowledge: Arc<dyn KnowledgeStore>,
        sessions: Arc<dyn SessionStore>,
        metrics: Arc<MetricsRecorder>,
        prompts: StaticPrompts,
    ) -> Self {
        Self {
            provider,
            knowledge,
            sessions,
            metrics,
            prompts,
            assembler: PromptAssembler::new(
                config.sessions.history_window,
                config.knowledge.max_knowledge_chars,
            ),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: Some(config.max_completion_tokens),
            top_k: config.knowledge.top_k,
            score_threshold: config.knowledge.score_threshold,
            locks: SessionLocks::new(),
        }
    }

    /// Handle one user message and return the assistant's reply.
    pub async fn handle_message(
        &self,
        session_id: &SessionId,
        user_text: &str,
    ) -> Result<String, ChatError> {
        if let Err(rejection) = validate_message(user_text) {
            warn!(session = %session_id, %rejection, "Message rejected");
            self.record(self.metrics.record_rejected().await);
            return Err(rejection);
        }

        let turn_guard = self.locks.acquire(session_id).await;
        let reply = self.run_turn(session_id, user_text).await;
        drop(turn_guard);
        self.locks.release(session_id).await;

        Ok(reply)
    }

    /// One locked turn: load history, retrieve, assemble, complete, persist.
    async fn run_turn(&self, session_id: &SessionId, user_text: &str) -> String {
        // A broken session store degrades this turn to stateless
        let (history, session_ok) = match self.sessions.history(session_id).await {
            Ok(history) => (history, true),
            Err(e) => {
                warn!(session = %session_id, error = %e, "Session load failed, continuing stateless");
                (Vec::new(), false)
            }
        };

        let retrieval = self.retrieve(user_text).await;

        let bundle =
            self.assembler
                .assemble(&self.prompts, retrieval.as_ref(), &history, user_text);
        debug!(
            session = %session_id,
            messages = bundle.messages.len(),
            estimated_tokens = bundle.estimated_tokens,
            "Prompt assembled"
        );

        let request = CompletionRequest {
            model: self.model.clone(),
            messages: bundle.messages.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = match self.provider.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(session = %session_id, error = %e, "Completion failed");
                self.record(self.metrics.record_failure().await);
                return FALLBACK_REPLY.to_string();
            }
        };

        if session_ok {
            let user_turn = Turn::user(user_text);
            let assistant_turn = match &response.usage {
                Some(usage) => {
                    Turn::assistant(&response.content).with_token_count(usage.completion_tokens)
                }
                None => Turn::assistant(&response.content),
            };

            if let Err(e) = self.append_turns(session_id, user_turn, assistant_turn).await {
                warn!(session = %session_id, error = %e, "Failed to persist turns");
            }
        }

        let (conversation_tokens, cost_usd) = match &response.usage {
            Some(usage) => (
                u64::from(usage.total_tokens),
                ModelPricing::for_model(&response.model).cost(usage),
            ),
            None => (0, 0.0),
        };

        self.record(
            self.metrics
                .record_success(
                    response.latency_secs,
                    conversation_tokens,
                    bundle.context_tokens as u64,
                    cost_usd,
                )
                .await,
        );

        info!(
            session = %session_id,
            latency_secs = response.latency_secs,
            tokens = conversation_tokens,
            "Turn completed"
        );

        response.content
    }

    /// Gate, then query. Empty results and retrieval errors are both
    /// normal outcomes of a turn: counted, logged, never fatal.
    async fn retrieve(&self, user_text: &str) -> Option<RetrievalResult> {
        if !needs_retrieval(user_text) {
            debug!("Retrieval skipped by gate");
            return None;
        }

        let query = RetrievalQuery {
            text: user_text.to_string(),
            top_k: self.top_k,
            score_threshold: self.score_threshold,
        };

        match self.knowledge.query(query).await {
            Ok(result) if result.is_empty() => {
                info!(query = %user_text, "Retrieval returned no chunks");
                self.record(self.metrics.record_empty_retrieval(user_text).await);
                Some(result)
            }
            Ok(result) => Some(result),
            Err(e) => {
                warn!(error = %e, "Retrieval failed, continuing without context");
                self.record(self.metrics.record_retrieval_failure().await);
                None
            }
        }
    }

    async fn append_turns(
        &self,
        session_id: &SessionId,
        user_turn: Turn,
        assistant_turn: Turn,
    ) -> Result<(), helpdesk_core::error::SessionError> {
        self.sessions.append(session_id, user_turn).await?;
        self.sessions.append(session_id, assistant_turn).await?;
        self.sessions.touch(session_id).await
    }

    /// Metrics are observability, not control flow.
    fn record(&self, result: Result<(), helpdesk_core::error::MetricsError>) {
        if let Err(e) = result {
            warn!(error = %e, "Failed to record metrics");
        }
    }

    pub fn metrics(&self) -> &Arc<MetricsRecorder> {
        &self.metrics
    }
}

fn validate_message(user_text: &str) -> Result<(), ChatError> {
    if user_text.trim().is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    if user_text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ChatError::MessageTooLong {
            max: MAX_MESSAGE_CHARS,
        });
    }
    Ok(())
}
