use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};
use tracing::error;

/// Metric name prefix for all enrichment metrics
const PREFIX: &str = "enrichment";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Enrichment request metrics
    pub static ref ENRICH_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_requests_total"),
            "Enrichment requests by match outcome"
        ),
        &["outcome"]
    ).expect("Failed to create requests_total metric");

    pub static ref ENRICH_FAILURES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_failures_total"),
            "Enrichment requests aborted by a missing cost input"
        ),
        &["kind"]
    ).expect("Failed to create failures_total metric");

    // Dataset metrics
    pub static ref REFERENCE_VARIANTS_TOTAL: Gauge = Gauge::new(
        format!("{PREFIX}_reference_variants_total"),
        "Variants in the active reference snapshot"
    ).expect("Failed to create reference_variants_total metric");

    pub static ref REFERENCE_SNAPSHOT_VERSION: Gauge = Gauge::new(
        format!("{PREFIX}_reference_snapshot_version"),
        "Version of the active reference snapshot"
    ).expect("Failed to create reference_snapshot_version metric");

    pub static ref EVIDENCE_RECORDS_TOTAL: Gauge = Gauge::new(
        format!("{PREFIX}_evidence_records_total"),
        "Records in the active evidence store"
    ).expect("Failed to create evidence_records_total metric");
}

/// Register all metrics with the registry. Call once at startup.
pub fn init_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ENRICH_REQUESTS_TOTAL.clone()),
        Box::new(ENRICH_FAILURES_TOTAL.clone()),
        Box::new(REFERENCE_VARIANTS_TOTAL.clone()),
        Box::new(REFERENCE_SNAPSHOT_VERSION.clone()),
        Box::new(EVIDENCE_RECORDS_TOTAL.clone()),
    ];
    for collector in collectors {
        // Double registration only happens in tests, ignore it.
        let _ = REGISTRY.register(collector);
    }
}

pub fn record_enrich_outcome(outcome: &str) {
    ENRICH_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_enrich_failure(kind: &str) {
    ENRICH_FAILURES_TOTAL.with_label_values(&[kind]).inc();
}

pub fn set_dataset_metrics(variants: usize, snapshot_version: u64, evidence_records: usize) {
    REFERENCE_VARIANTS_TOTAL.set(variants as f64);
    REFERENCE_SNAPSHOT_VERSION.set(snapshot_version as f64);
    EVIDENCE_RECORDS_TOTAL.set(evidence_records as f64);
}

/// Text-format scrape endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    match encoder.encode(&REGISTRY.gather(), &mut buffer) {
        Ok(()) => (StatusCode::OK, buffer).into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_counter_records() {
        init_metrics();
        record_enrich_outcome("auto");
        record_enrich_outcome("rejected");

        let metrics = REGISTRY.gather();
        assert!(metrics
            .iter()
            .any(|m| m.get_name() == "enrichment_requests_total"));
    }

    #[test]
    fn dataset_gauges_record() {
        init_metrics();
        set_dataset_metrics(120_000, 3, 5_400);
        assert_eq!(REFERENCE_VARIANTS_TOTAL.get(), 120_000.0);
        assert_eq!(REFERENCE_SNAPSHOT_VERSION.get(), 3.0);
        assert_eq!(EVIDENCE_RECORDS_TOTAL.get(), 5_400.0);
    }
}
