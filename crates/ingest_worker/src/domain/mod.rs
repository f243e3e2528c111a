mod alerts;
mod ingest_service;

pub use alerts::evaluate_thresholds;
pub use ingest_service::TelemetryIngestService;
