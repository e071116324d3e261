pub mod chat;
pub mod ingest;
pub mod metrics;
pub mod serve;
