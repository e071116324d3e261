//! Usage metrics and cost accounting for helpdesk.
//!
//! One JSON document on disk, updated after every request. Nothing
//! here is on the hot path's failure surface: the orchestrator treats
//! metrics errors as log-and-continue.

pub mod model;
pub mod pricing;
pub mod recorder;

pub use model::{EmptyRetrievalQuery, MetricsRecord, MetricsSummary, MAX_EMPTY_RETRIEVAL_QUERIES};
pub use pricing::ModelPricing;
pub use recorder::MetricsRecorder;

use helpdesk_config::MetricsConfig;

/// Build a recorder from configuration. Disabled metrics still count
/// in memory so `GET /metrics` keeps working, they just don't persist.
pub fn build_from_config(config: &MetricsConfig) -> MetricsRecorder {
    if config.enabled {
        MetricsRecorder::new(&config.path)
    } else {
        MetricsRecorder::ephemeral()
    }
}
