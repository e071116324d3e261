//! KnowledgeStore trait — the abstraction over the vector index.
//!
//! A KnowledgeStore holds chunked reference text and returns the most
//! relevant chunks for a query. Implementations: in-memory index,
//! file-persisted index. Selected at startup via configuration and
//! never branched on at call sites.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::KnowledgeError;

/// A bounded span of source text indexed for similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Unique chunk ID (stable across queries against an unchanged index)
    pub id: String,

    /// Source document identifier
    pub document_id: String,

    /// The text content of this chunk
    pub content: String,

    /// Human-readable source label (filename, section)
    pub source: String,

    /// Embedding vector, owned by the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Relevance score attached at query time, not persisted
    #[serde(default)]
    pub score: f32,
}

/// A similarity query against the knowledge store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalQuery {
    /// The query text
    pub text: String,

    /// Maximum number of chunks to return
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum similarity for a chunk to be considered relevant.
    /// Chunks below this are excluded even if they rank within top_k.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
}

fn default_top_k() -> usize {
    3
}

fn default_score_threshold() -> f32 {
    0.3
}

impl RetrievalQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            top_k: default_top_k(),
            score_threshold: default_score_threshold(),
        }
    }
}

/// The ordered result of a retrieval. Transient: produced per request and
/// consumed immediately by the prompt assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// The query text that produced this result
    pub query: String,

    /// Chunks in descending relevance order (possibly empty)
    pub chunks: Vec<KnowledgeChunk>,
}

impl RetrievalResult {
    /// An empty result for the given query. Normal operation, not an error.
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            chunks: Vec::new(),
        }
    }

    /// Whether no chunk passed the score threshold.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// The core KnowledgeStore trait.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// The backend name (e.g., "memory", "file").
    fn name(&self) -> &str;

    /// Query for the most relevant chunks. An empty result is valid.
    async fn query(
        &self,
        query: RetrievalQuery,
    ) -> std::result::Result<RetrievalResult, KnowledgeError>;

    /// Add chunks (with embeddings) to the index.
    async fn add(
        &self,
        chunks: Vec<KnowledgeChunk>,
    ) -> std::result::Result<(), KnowledgeError>;

    /// Total number of indexed chunks.
    async fn count(&self) -> std::result::Result<usize, KnowledgeError>;

    /// Remove all chunks.
    async fn clear(&self) -> std::result::Result<(), KnowledgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieval_query_defaults() {
        let query = RetrievalQuery::new("what is the return policy?");
        assert_eq!(query.top_k, 3);
        assert!((query.score_threshold - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_result_is_empty() {
        let result = RetrievalResult::empty("no match");
        assert!(result.is_empty());
        assert_eq!(result.query, "no match");
    }

    #[test]
    fn chunk_serialization_skips_missing_embedding() {
        let chunk = KnowledgeChunk {
            id: "c1".into(),
            document_id: "kb".into(),
            content: "Returns accepted within 30 days.".into(),
            source: "policies".into(),
            embedding: None,
            score: 0.9,
        };
        let json = serde_json::to_string(&chunk).unwrap();
        assert!(!json.contains("embedding"));
        assert!(json.contains("30 days"));
    }
}
