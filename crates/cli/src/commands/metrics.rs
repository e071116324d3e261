//! `helpdesk metrics` — Show current usage metrics.

use helpdesk_config::AppConfig;
use helpdesk_metrics::MetricsRecorder;

pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let recorder = MetricsRecorder::new(&config.metrics.path);
    let summary = recorder.summary().await;

    println!("{}", serde_json::to_string_pretty(&summary)?);

    let record = recorder.snapshot().await;
    if !record.empty_retrieval_queries.is_empty() {
        eprintln!();
        eprintln!("Recent queries with no knowledge match:");
        for entry in record.empty_retrieval_queries.iter().rev().take(10) {
            eprintln!("  [{}] {}", entry.timestamp.format("%Y-%m-%d %H:%M"), entry.query);
        }
    }

    Ok(())
}
