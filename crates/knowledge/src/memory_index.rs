//! In-memory knowledge index.
//!
//! Holds all chunks and their embeddings behind a read-write lock and
//! ranks them by cosine similarity. Contents are lost on restart, so
//! the document is re-ingested at every startup.

use std::sync::Arc;

use async_trait::async_trait;
use helpdesk_core::error::KnowledgeError;
use helpdesk_core::provider::{CompletionProvider, EmbeddingRequest};
use helpdesk_core::{KnowledgeChunk, KnowledgeStore, RetrievalQuery, RetrievalResult};
use tokio::sync::RwLock;
use tracing::debug;

use crate::similarity::rank_chunks;

/// An ephemeral in-memory vector index.
pub struct MemoryIndex {
    provider: Arc<dyn CompletionProvider>,
    embedding_model: String,
    chunks: RwLock<Vec<KnowledgeChunk>>,
}

impl MemoryIndex {
    pub fn new(provider: Arc<dyn CompletionProvider>, embedding_model: impl Into<String>) -> Self {
        Self {
            provider,
            embedding_model: embedding_model.into(),
            chunks: RwLock::new(Vec::new()),
        }
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, KnowledgeError> {
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs: vec![text.to_string()],
            })
            .await
            .map_err(|e| KnowledgeError::EmbeddingFailed(e.to_string()))?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| KnowledgeError::EmbeddingFailed("no embedding returned".into()))
    }
}

#[async_trait]
impl KnowledgeStore for MemoryIndex {
    fn name(&self) -> &str {
        "memory"
    }

    async fn query(&self, query: RetrievalQuery) -> Result<RetrievalResult, KnowledgeError> {
        let query_embedding = self.embed_query(&query.text).await?;
        let chunks = self.chunks.read().await;
        let ranked = rank_chunks(&chunks, &query_embedding, query.top_k, query.score_threshold);

        debug!(
            query = %query.text,
            matched = ranked.len(),
            indexed = chunks.len(),
            "Knowledge query"
        );

        Ok(RetrievalResult {
            query: query.text,
            chunks: ranked,
        })
    }

    async fn add(&self, chunks: Vec<KnowledgeChunk>) -> Result<(), KnowledgeError> {
        self.chunks.write().await.extend(chunks);
        Ok(())
    }

    async fn count(&self) -> Result<usize, KnowledgeError> {
        Ok(self.chunks.read().await.len())
    }

    async fn clear(&self) -> Result<(), KnowledgeError> {
        self.chunks.write().await.clear();
        Ok(())
    }
}
