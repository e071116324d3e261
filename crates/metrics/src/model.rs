//! Persisted metrics record and the derived summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Queries with empty retrieval are kept for knowledge-base curation,
/// capped so the record cannot grow without bound.
pub const MAX_EMPTY_RETRIEVAL_QUERIES: usize = 1000;

/// A gated query that retrieved nothing — a gap in the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmptyRetrievalQuery {
    pub query: String,
    pub timestamp: DateTime<Utc>,
}

/// Cumulative counters persisted as a single JSON document.
///
/// Every field defaults, so records written by older builds load
/// cleanly and gain the new fields on the next write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsRecord {
    #[serde(default)]
    pub total_requests: u64,

    #[serde(default)]
    pub successful_requests: u64,

    /// Requests rejected before reaching the provider (empty or oversized input)
    #[serde(default)]
    pub rejected_requests: u64,

    /// Requests that reached the provider and failed
    #[serde(default)]
    pub failed_requests: u64,

    #[serde(default)]
    pub total_response_time_secs: f64,

    /// Tokens reported by the provider across all successful requests
    #[serde(default)]
    pub total_conversation_tokens: u64,

    /// Estimated tokens of assembled prompt context
    #[serde(default)]
    pub total_context_tokens: u64,

    #[serde(default)]
    pub total_cost_usd: f64,

    /// Gated queries for which retrieval returned no chunk
    #[serde(default)]
    pub empty_retrieval_count: u64,

    /// Retrieval attempts that errored (the request itself continued)
    #[serde(default)]
    pub retrieval_failure_count: u64,

    /// The actual queries behind `empty_retrieval_count`, oldest first
    #[serde(default)]
    pub empty_retrieval_queries: Vec<EmptyRetrievalQuery>,

    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

impl Default for MetricsRecord {
    fn default() -> Self {
        Self {
            total_requests: 0,
            successful_requests: 0,
            rejected_requests: 0,
            failed_requests: 0,
            total_response_time_secs: 0.0,
            total_conversation_tokens: 0,
            total_context_tokens: 0,
            total_cost_usd: 0.0,
            empty_retrieval_count: 0,
            retrieval_failure_count: 0,
            empty_retrieval_queries: Vec::new(),
            last_updated: Utc::now(),
        }
    }
}

impl MetricsRecord {
    pub fn push_empty_retrieval_query(&mut self, query: String) {
        self.empty_retrieval_count += 1;
        self.empty_retrieval_queries.push(EmptyRetrievalQuery {
            query,
            timestamp: Utc::now(),
        });
        if self.empty_retrieval_queries.len() > MAX_EMPTY_RETRIEVAL_QUERIES {
            let excess = self.empty_retrieval_queries.len() - MAX_EMPTY_RETRIEVAL_QUERIES;
            self.empty_retrieval_queries.drain(..excess);
        }
    }
}

/// Derived averages served by `GET /metrics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub rejected_requests: u64,
    pub failed_requests: u64,
    pub success_rate: f64,
    pub avg_response_time_secs: f64,
    pub avg_tokens_per_conversation: f64,
    pub avg_context_tokens: f64,
    pub avg_cost_per_conversation: f64,
    pub total_conversation_tokens: u64,
    pub total_context_tokens: u64,
    pub total_cost_usd: f64,
    pub empty_retrieval_count: u64,
    pub retrieval_failure_count: u64,
    pub last_updated: DateTime<Utc>,
}

impl From<&MetricsRecord> for MetricsSummary {
    fn from(record: &MetricsRecord) -> Self {
        let success_rate = if record.total_requests > 0 {
            record.successful_requests as f64 / record.total_requests as f64
        } else {
            0.0
        };
        let per_success = |total: f64| {
            if record.successful_requests > 0 {
                total / record.successful_requests as f64
            } else {
                0.0
            }
        };
        let avg_response_time_secs = per_success(record.total_response_time_secs);
        let avg_tokens_per_conversation = per_success(record.total_conversation_tokens as f64);
        let avg_context_tokens = per_success(record.total_context_tokens as f64);
        let avg_cost_per_conversation = per_success(record.total_cost_usd);

        Self {
            total_requests: record.total_requests,
            successful_requests: record.successful_requests,
            rejected_requests: record.rejected_requests,
            failed_requests: record.failed_requests,
            success_rate,
            avg_response_time_secs,
            avg_tokens_per_conversation,
            avg_context_tokens,
            avg_cost_per_conversation,
            total_conversation_tokens: record.total_conversation_tokens,
            total_context_tokens: record.total_context_tokens,
            total_cost_usd: record.total_cost_usd,
            empty_retrieval_count: record.empty_retrieval_count,
            retrieval_failure_count: record.retrieval_failure_count,
            last_updated: record.last_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_with_missing_fields_loads_with_defaults() {
        // A record written before cost tracking existed
        let old = r#"{"total_requests": 42, "successful_requests": 40}"#;
        let record: MetricsRecord = serde_json::from_str(old).unwrap();
        assert_eq!(record.total_requests, 42);
        assert_eq!(record.total_cost_usd, 0.0);
        assert!(record.empty_retrieval_queries.is_empty());
    }

    #[test]
    fn empty_retrieval_queries_are_capped() {
        let mut record = MetricsRecord::default();
        for i in 0..(MAX_EMPTY_RETRIEVAL_QUERIES + 10) {
            record.push_empty_retrieval_query(format!("query {i}"));
        }
        assert_eq!(record.empty_retrieval_queries.len(), MAX_EMPTY_RETRIEVAL_QUERIES);
        // Oldest entries were dropped
        assert_eq!(record.empty_retrieval_queries[0].query, "query 10");
        assert_eq!(
            record.empty_retrieval_count,
            (MAX_EMPTY_RETRIEVAL_QUERIES + 10) as u64
        );
    }

    #[test]
    fn summary_rates_handle_zero_requests() {
        let summary = MetricsSummary::from(&MetricsRecord::default());
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.avg_response_time_secs, 0.0);
        assert_eq!(summary.avg_tokens_per_conversation, 0.0);
        assert_eq!(summary.avg_context_tokens, 0.0);
        assert_eq!(summary.avg_cost_per_conversation, 0.0);
    }

    #[test]
    fn summary_averages() {
        let record = MetricsRecord {
            total_requests: 10,
            successful_requests: 8,
            total_response_time_secs: 16.0,
            total_conversation_tokens: 800,
            total_context_tokens: 4000,
            total_cost_usd: 0.04,
            ..Default::default()
        };
        let summary = MetricsSummary::from(&record);
        assert!((summary.success_rate - 0.8).abs() < 1e-9);
        assert!((summary.avg_response_time_secs - 2.0).abs() < 1e-9);
        assert!((summary.avg_tokens_per_conversation - 100.0).abs() < 1e-9);
        assert!((summary.avg_context_tokens - 500.0).abs() < 1e-9);
        assert!((summary.avg_cost_per_conversation - 0.005).abs() < 1e-9);
    }
}
