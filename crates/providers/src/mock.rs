//! Scripted mock provider for tests.
//!
//! Returns queued completion responses in order and deterministic
//! embeddings derived from the input text, so orchestrator and gateway
//! tests run without network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use helpdesk_core::error::ProviderError;
use helpdesk_core::provider::{
    CompletionProvider, CompletionRequest, CompletionResponse, EmbeddingRequest,
    EmbeddingResponse, Usage,
};

/// A provider that returns pre-scripted responses in sequence.
///
/// When the script is exhausted, `complete()` returns the last scripted
/// response again. An empty script fails with `NotConfigured`.
pub struct MockProvider {
    responses: Mutex<Vec<CompletionResponse>>,
    fail_with: Mutex<Option<ProviderError>>,
    call_count: AtomicUsize,
    embed_call_count: AtomicUsize,
    embedding_dim: usize,
}

impl MockProvider {
    /// A mock scripted with the given assistant replies.
    pub fn with_replies(replies: Vec<&str>) -> Self {
        let responses = replies
            .into_iter()
            .map(|content| CompletionResponse {
                content: content.to_string(),
                usage: Some(Usage {
                    prompt_tokens: 100,
                    completion_tokens: 20,
                    total_tokens: 120,
                }),
                model: "mock-model".into(),
                latency_secs: 0.01,
            })
            .collect();

        Self {
            responses: Mutex::new(responses),
            fail_with: Mutex::new(None),
            call_count: AtomicUsize::new(0),
            embed_call_count: AtomicUsize::new(0),
            embedding_dim: 8,
        }
    }

    /// A mock whose every call fails with the given error.
    pub fn failing(error: ProviderError) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            fail_with: Mutex::new(Some(error)),
            call_count: AtomicUsize::new(0),
            embed_call_count: AtomicUsize::new(0),
            embedding_dim: 8,
        }
    }

    /// How many completion calls have been made.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// How many embedding calls have been made.
    pub fn embed_call_count(&self) -> usize {
        self.embed_call_count.load(Ordering::SeqCst)
    }

    /// Deterministic pseudo-embedding: a unit-ish vector derived from
    /// the byte content, so equal texts embed identically and different
    /// texts (usually) don't.
    fn pseudo_embedding(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.embedding_dim];
        for (i, b) in text.bytes().enumerate() {
            v[i % self.embedding_dim] += f32::from(b) / 255.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        if let Some(err) = self.fail_with.lock().map_err(poisoned)?.as_ref() {
            return Err(err.clone());
        }

        let index = self.call_count.fetch_add(1, Ordering::SeqCst);
        let responses = self.responses.lock().map_err(poisoned)?;
        if responses.is_empty() {
            return Err(ProviderError::NotConfigured(
                "mock provider has no scripted responses".into(),
            ));
        }
        let clamped = index.min(responses.len() - 1);
        Ok(responses[clamped].clone())
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError> {
        if let Some(err) = self.fail_with.lock().map_err(poisoned)?.as_ref() {
            return Err(err.clone());
        }

        self.embed_call_count.fetch_add(1, Ordering::SeqCst);

        let embeddings = request
            .inputs
            .iter()
            .map(|text| self.pseudo_embedding(text))
            .collect();

        Ok(EmbeddingResponse {
            embeddings,
            model: request.model,
            usage: None,
        })
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> ProviderError {
    ProviderError::NotConfigured("mock provider lock poisoned".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::provider::PromptMessage;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "mock-model".into(),
            messages: vec![PromptMessage::user("hi")],
            temperature: 0.7,
            max_tokens: None,
        }
    }

    #[tokio::test]
    async fn replies_in_order_then_repeats_last() {
        let mock = MockProvider::with_replies(vec!["first", "second"]);

        assert_eq!(mock.complete(request()).await.unwrap().content, "first");
        assert_eq!(mock.complete(request()).await.unwrap().content, "second");
        assert_eq!(mock.complete(request()).await.unwrap().content, "second");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn failing_mock_returns_error() {
        let mock = MockProvider::failing(ProviderError::Timeout("simulated".into()));
        assert!(mock.complete(request()).await.is_err());
    }

    #[tokio::test]
    async fn embeddings_are_deterministic() {
        let mock = MockProvider::with_replies(vec!["unused"]);
        let req = EmbeddingRequest {
            model: "mock-embed".into(),
            inputs: vec!["return policy".into(), "return policy".into()],
        };
        let resp = mock.embed(req).await.unwrap();
        assert_eq!(resp.embeddings.len(), 2);
        assert_eq!(resp.embeddings[0], resp.embeddings[1]);
        assert_eq!(mock.embed_call_count(), 1);
    }

    #[tokio::test]
    async fn different_texts_embed_differently() {
        let mock = MockProvider::with_replies(vec!["unused"]);
        let req = EmbeddingRequest {
            model: "mock-embed".into(),
            inputs: vec!["shipping times".into(), "warranty length".into()],
        };
        let resp = mock.embed(req).await.unwrap();
        assert_ne!(resp.embeddings[0], resp.embeddings[1]);
    }
}
