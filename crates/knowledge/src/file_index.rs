//! File-persisted knowledge index using JSONL storage.
//!
//! Each line is one JSON-encoded chunk including its embedding. Chunks
//! load into memory on creation and flush to disk on every mutation,
//! so an already-ingested index survives restarts and ingestion can
//! skip re-embedding the document.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use helpdesk_core::error::KnowledgeError;
use helpdesk_core::provider::{CompletionProvider, EmbeddingRequest};
use helpdesk_core::{KnowledgeChunk, KnowledgeStore, RetrievalQuery, RetrievalResult};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::similarity::rank_chunks;

/// A file-backed vector index (one JSON object per line).
pub struct FileIndex {
    path: PathBuf,
    provider: Arc<dyn CompletionProvider>,
    embedding_model: String,
    chunks: RwLock<Vec<KnowledgeChunk>>,
}

impl FileIndex {
    /// Open an index at the given path, loading existing chunks.
    /// A missing file starts empty; it is created on first write.
    pub fn new(
        path: impl Into<PathBuf>,
        provider: Arc<dyn CompletionProvider>,
        embedding_model: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let chunks = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = chunks.len(), "File knowledge index loaded");
        Self {
            path,
            provider,
            embedding_model: embedding_model.into(),
            chunks: RwLock::new(chunks),
        }
    }

    fn load_from_disk(path: &PathBuf) -> Vec<KnowledgeChunk> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<KnowledgeChunk>(line) {
                Ok(chunk) => Some(chunk),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted index line");
                    None
                }
            })
            .collect()
    }

    async fn flush(&self) -> Result<(), KnowledgeError> {
        let chunks = self.chunks.read().await;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                KnowledgeError::Storage(format!("Failed to create index directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for chunk in chunks.iter() {
            let line = serde_json::to_string(chunk)
                .map_err(|e| KnowledgeError::Storage(format!("Failed to serialize chunk: {e}")))?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(&self.path, &content)
            .map_err(|e| KnowledgeError::Storage(format!("Failed to write index file: {e}")))?;

        Ok(())
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
impl KnowledgeStore for FileIndex {
    fn name(&self) -> &str {
        "file"
    }

    async fn query(&self, query: RetrievalQuery) -> Result<RetrievalResult, KnowledgeError> {
        let query_embedding = self.embed_query(&query.text).await?;
        let chunks = self.chunks.read().await;
        let ranked = rank_chunks(&chunks, &query_embedding, query.top_k, query.score_threshold);

        Ok(RetrievalResult {
            query: query.text,
            chunks: ranked,
        })
    }

    async fn add(&self, chunks: Vec<KnowledgeChunk>) -> Result<(), KnowledgeError> {
        self.chunks.write().await.extend(chunks);
        self.flush().await
    }

    async fn count(&self) -> Result<usize, KnowledgeError> {
        Ok(self.chunks.read().await.len())
    }

    async fn clear(&self) -> Result<(), KnowledgeError> {
        self.chunks.write().await.clear();
        self.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_providers::MockProvider;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn chunk(id: &str, content: &str) -> KnowledgeChunk {
        KnowledgeChunk {
            id: id.into(),
            document_id: "kb".into(),
            content: content.into(),
            source: "kb".into(),
            embedding: Some(vec![1.0, 0.0]),
            score: 0.0,
        }
    }

    fn provider() -> Arc<MockProvider> {
        Arc::new(MockProvider::with_replies(vec!["unused"]))
    }

    #[tokio::test]
    async fn add_persists_across_reload() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        drop(tmp);

        let index = FileIndex::new(path.clone(), provider(), "mock-embed");
        index
            .add(vec![chunk("c1", "Shipping takes 2-4 days")])
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Shipping takes 2-4 days"));

        let reloaded = FileIndex::new(path, provider(), "mock-embed");
        assert_eq!(reloaded.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn clear_persists() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        drop(tmp);

        let index = FileIndex::new(path.clone(), provider(), "mock-embed");
        index.add(vec![chunk("c1", "entry")]).await.unwrap();
        index.clear().await.unwrap();

        let reloaded = FileIndex::new(path, provider(), "mock-embed");
        assert_eq!(reloaded.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.jsonl");
        let index = FileIndex::new(path, provider(), "mock-embed");
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn corrupted_lines_are_skipped() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            r#"{{"id":"c1","document_id":"kb","content":"valid","source":"kb","embedding":[1.0,0.0]}}"#
        )
        .unwrap();
        writeln!(tmp, "this is not json").unwrap();
        writeln!(
            tmp,
            r#"{{"id":"c2","document_id":"kb","content":"also valid","source":"kb","embedding":[0.0,1.0]}}"#
        )
        .unwrap();

        let index = FileIndex::new(tmp.path().to_path_buf(), provider(), "mock-embed");
        assert_eq!(index.count().await.unwrap(), 2);
    }
}
