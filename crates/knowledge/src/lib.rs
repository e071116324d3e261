//! Knowledge base for helpdesk: chunking, vector indexing, retrieval.
//!
//! The store is selected once at startup from configuration; call
//! sites only ever see the `KnowledgeStore` trait.

pub mod chunker;
pub mod file_index;
pub mod ingest;
pub mod memory_index;
pub mod similarity;

pub use chunker::Chunker;
pub use file_index::FileIndex;
pub use ingest::ingest_document;
pub use memory_index::MemoryIndex;

use std::sync::Arc;

use helpdesk_config::KnowledgeConfig;
use helpdesk_core::provider::CompletionProvider;
use helpdesk_core::KnowledgeStore;
use tracing::warn;

/// Build the configured knowledge store backend.
///
/// Unknown backend names fall back to the in-memory index.
pub fn build_from_config(
    config: &KnowledgeConfig,
    provider: Arc<dyn CompletionProvider>,
    embedding_model: &str,
) -> Arc<dyn KnowledgeStore> {
    match config.backend.as_str() {
        "file" => Arc::new(FileIndex::new(
            config.index_path.clone(),
            provider,
            embedding_model,
        )),
        "memory" => Arc::new(MemoryIndex::new(provider, embedding_model)),
        other => {
            warn!(backend = %other, "Unknown knowledge backend, using in-memory index");
            Arc::new(MemoryIndex::new(provider, embedding_model))
        }
    }
}
