//! Metrics recorder — cumulative counters with JSON persistence.
//!
//! The record loads once at startup and flushes to disk on every
//! mutation. A file that fails to parse is moved aside with a
//! timestamped suffix instead of being overwritten, so operator data
//! is never silently destroyed.

use std::path::{Path, PathBuf};

use chrono::Utc;
use helpdesk_core::error::MetricsError;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::model::{MetricsRecord, MetricsSummary};

/// Records request outcomes and persists them as a JSON document.
pub struct MetricsRecorder {
    path: Option<PathBuf>,
    record: RwLock<MetricsRecord>,
}

impl MetricsRecorder {
    /// A recorder persisting to the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let record = Self::load_or_default(&path);
        Self {
            path: Some(path),
            record: RwLock::new(record),
        }
    }

    /// A recorder that only counts in memory (metrics disabled).
    pub fn ephemeral() -> Self {
        Self {
            path: None,
            record: RwLock::new(MetricsRecord::default()),
        }
    }

    fn load_or_default(path: &Path) -> MetricsRecord {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return MetricsRecord::default(),
        };

        match serde_json::from_str::<MetricsRecord>(&content) {
            Ok(record) => {
                info!(path = %path.display(), requests = record.total_requests, "Metrics loaded");
                record
            }
            Err(e) => {
                let backup = path.with_extension(format!(
                    "corrupt-{}.json",
                    Utc::now().format("%Y%m%d%H%M%S")
                ));
                warn!(
                    path = %path.display(),
                    backup = %backup.display(),
                    error = %e,
                    "Metrics file corrupted, moving aside and starting fresh"
                );
                if let Err(e) = std::fs::rename(path, &backup) {
                    warn!(error = %e, "Failed to back up corrupted metrics file");
                }
                MetricsRecord::default()
            }
        }
    }

    async fn flush(&self) -> Result<(), MetricsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let record = self.record.read().await;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MetricsError::Persistence(format!("Failed to create metrics directory: {e}"))
            })?;
        }

        let content = serde_json::to_string_pretty(&*record)
            .map_err(|e| MetricsError::Serialization(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| MetricsError::Persistence(format!("Failed to write metrics file: {e}")))
    }

    /// Record a request answered by the provider.
    pub async fn record_success(
        &self,
        response_time_secs: f64,
        conversation_tokens: u64,
        context_tokens: u64,
        cost_usd: f64,
    ) -> Result<(), MetricsError> {
        {
            let mut record = self.record.write().await;
            record.total_requests += 1;
            record.successful_requests += 1;
            record.total_response_time_secs += response_time_secs;
            record.total_conversation_tokens += conversation_tokens;
            record.total_context_tokens += context_tokens;
            record.total_cost_usd += cost_usd;
            record.last_updated = Utc::now();
        }
        self.flush().await
    }

    /// Record a request rejected before reaching the provider.
    pub async fn record_rejected(&self) -> Result<(), MetricsError> {
        {
            let mut record = self.record.write().await;
            record.total_requests += 1;
            record.rejected_requests += 1;
            record.last_updated = Utc::now();
        }
        self.flush().await
    }

    /// Record a request that reached the provider and failed.
    pub async fn record_failure(&self) -> Result<(), MetricsError> {
        {
            let mut record = self.record.write().await;
            record.total_requests += 1;
            record.failed_requests += 1;
            record.last_updated = Utc::now();
        }
        self.flush().await
    }

    /// Record a gated query whose retrieval returned no chunk.
    pub async fn record_empty_retrieval(&self, query: &str) -> Result<(), MetricsError> {
        {
            let mut record = self.record.write().await;
            record.push_empty_retrieval_query(query.to_string());
            record.last_updated = Utc::now();
        }
        self.flush().await
    }

    /// Record a retrieval error (the request itself continued without context).
    pub async fn record_retrieval_failure(&self) -> Result<(), MetricsError> {
        {
            let mut record = self.record.write().await;
            record.retrieval_failure_count += 1;
            record.last_updated = Utc::now();
        }
        self.flush().await
    }

    /// Current derived summary.
    pub async fn summary(&self) -> MetricsSummary {
        MetricsSummary::from(&*self.record.read().await)
    }

    /// Snapshot of the raw record (for the CLI metrics command).
    pub async fn snapshot(&self) -> MetricsRecord {
        self.record.read().await.clone()
    }
}
