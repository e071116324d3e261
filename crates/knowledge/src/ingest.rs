//! Document ingestion: load, chunk, embed, index.
//!
//! Ingestion is idempotent against a populated index. When the backend
//! already holds chunks (a persisted index from a previous run) the
//! document is not re-chunked or re-embedded.

use std::sync::Arc;

use helpdesk_core::error::KnowledgeError;
use helpdesk_core::provider::{CompletionProvider, EmbeddingRequest};
use helpdesk_core::{KnowledgeChunk, KnowledgeStore};
use helpdesk_config::KnowledgeConfig;
use tracing::info;

use crate::chunker::Chunker;

/// Embedding requests are batched to bound payload size.
const EMBED_BATCH_SIZE: usize = 64;

/// Ingest the configured document into the store.
///
/// Returns the number of chunks in the index afterwards. Fails when
/// the document is missing, empty, or the index ends up with zero
/// chunks — the service must not start answering without knowledge.
pub async fn ingest_document(
    store: &dyn KnowledgeStore,
    provider: &Arc<dyn CompletionProvider>,
    embedding_model: &str,
    config: &KnowledgeConfig,
) -> Result<usize, KnowledgeError> {
    let existing = store.count().await?;
    if existing > 0 {
        info!(
            backend = store.name(),
            chunks = existing,
            "Knowledge index already populated, skipping ingestion"
        );
        return Ok(existing);
    }

    let text = std::fs::read_to_string(&config.document_path).map_err(|e| {
        KnowledgeError::IngestionFailed(format!(
            "Failed to read {}: {e}",
            config.document_path.display()
        ))
    })?;

    let chunker = Chunker::new(config.chunk_size, config.chunk_overlap);
    let pieces = chunker.split(&text);
    if pieces.is_empty() {
        return Err(KnowledgeError::IngestionFailed(format!(
            "Document {} produced no chunks",
            config.document_path.display()
        )));
    }

    let document_id = config
        .document_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "knowledge".to_string());

    info!(
        document = %config.document_path.display(),
        chunks = pieces.len(),
        "Embedding knowledge base"
    );

    let mut chunks = Vec::with_capacity(pieces.len());
    for (batch_index, batch) in pieces.chunks(EMBED_BATCH_SIZE).enumerate() {
        let response = provider
            .embed(EmbeddingRequest {
                model: embedding_model.to_string(),
                inputs: batch.to_vec(),
            })
            .await
            .map_err(|e| KnowledgeError::EmbeddingFailed(e.to_string()))?;

        if response.embeddings.len() != batch.len() {
            return Err(KnowledgeError::EmbeddingFailed(format!(
                "Expected {} embeddings, got {}",
                batch.len(),
                response.embeddings.len()
            )));
        }

        for (offset, (content, embedding)) in
            batch.iter().zip(response.embeddings.into_iter()).enumerate()
        {
            let ordinal = batch_index * EMBED_BATCH_SIZE + offset;
            chunks.push(KnowledgeChunk {
                id: format!("{document_id}-{ordinal:04}"),
                document_id: document_id.clone(),
                content: content.clone(),
                source: document_id.clone(),
                embedding: Some(embedding),
                score: 0.0,
            });
        }
    }

    store.add(chunks).await?;

    let count = store.count().await?;
    if count == 0 {
        return Err(KnowledgeError::Unavailable(
            "Index has 0 chunks after ingestion".into(),
        ));
    }

    info!(backend = store.name(), chunks = count, "Knowledge base ingested");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_index::MemoryIndex;
    use helpdesk_providers::MockProvider;
    use std::io::Write;

    fn config_for(path: &std::path::Path) -> KnowledgeConfig {
        KnowledgeConfig {
            document_path: path.to_path_buf(),
            ..Default::default()
        }
    }

    fn write_document(content: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "{content}").unwrap();
        tmp
    }

    #[tokio::test]
    async fn ingests_document_into_empty_index() {
        let doc = write_document(
            "Q: How long does shipping take?\nShipping takes 2-4 business days.\n---\nQ: What is the return window?\nReturns are accepted within 30 days.",
        );
        let provider: Arc<dyn CompletionProvider> =
            Arc::new(MockProvider::with_replies(vec!["unused"]));
        let index = MemoryIndex::new(provider.clone(), "mock-embed");

        let count = ingest_document(&index, &provider, "mock-embed", &config_for(doc.path()))
            .await
            .unwrap();
        assert!(count > 0);
        assert_eq!(index.count().await.unwrap(), count);
    }

    #[tokio::test]
    async fn skips_when_index_already_populated() {
        let doc = write_document("Some knowledge content.");
        let mock = Arc::new(MockProvider::with_replies(vec!["unused"]));
        let provider: Arc<dyn CompletionProvider> = mock.clone();
        let index = MemoryIndex::new(provider.clone(), "mock-embed");

        index
            .add(vec![KnowledgeChunk {
                id: "pre-0000".into(),
                document_id: "pre".into(),
                content: "existing".into(),
                source: "pre".into(),
                embedding: Some(vec![1.0]),
                score: 0.0,
            }])
            .await
            .unwrap();

        let count = ingest_document(&index, &provider, "mock-embed", &config_for(doc.path()))
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(mock.embed_call_count(), 0);
    }

    #[tokio::test]
    async fn missing_document_fails() {
        let provider: Arc<dyn CompletionProvider> =
            Arc::new(MockProvider::with_replies(vec!["unused"]));
        let index = MemoryIndex::new(provider.clone(), "mock-embed");
        let config = config_for(std::path::Path::new("/nonexistent/kb.txt"));

        let result = ingest_document(&index, &provider, "mock-embed", &config).await;
        assert!(matches!(result, Err(KnowledgeError::IngestionFailed(_))));
    }

    #[tokio::test]
    async fn empty_document_fails() {
        let doc = write_document("   \n\n  ");
        let provider: Arc<dyn CompletionProvider> =
            Arc::new(MockProvider::with_replies(vec!["unused"]));
        let index = MemoryIndex::new(provider.clone(), "mock-embed");

        let result =
            ingest_document(&index, &provider, "mock-embed", &config_for(doc.path())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn chunk_ids_are_stable_ordinals() {
        let doc = write_document("First section.\n---\nSecond section.\n---\nThird section.");
        let provider: Arc<dyn CompletionProvider> =
            Arc::new(MockProvider::with_replies(vec!["unused"]));
        let index = MemoryIndex::new(provider.clone(), "mock-embed");

        let mut config = config_for(doc.path());
        config.chunk_size = 20;
        config.chunk_overlap = 0;

        ingest_document(&index, &provider, "mock-embed", &config)
            .await
            .unwrap();

        let result = index
            .query(helpdesk_core::RetrievalQuery {
                text: "First section.".into(),
                top_k: 10,
                score_threshold: -1.0,
            })
            .await
            .unwrap();
        assert!(result.chunks.iter().all(|c| c.id.contains('-')));
    }
}
