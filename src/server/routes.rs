//! Enrichment API routes. Thin glue: deserialize, call the core, serialize.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::error;

use crate::enrich::EnrichError;
use crate::listing::ListingInput;
use crate::matcher::CacheStats;

use super::metrics;
use super::state::{GuardedRefresher, ServerState};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub snapshot_version: u64,
    pub variants: usize,
    pub brands: usize,
    pub evidence_records: usize,
    pub fuel_types: usize,
    pub match_cache: CacheStats,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn stats(State(state): State<ServerState>) -> impl IntoResponse {
    let snapshot = state.snapshots.current();
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        snapshot_version: snapshot.version,
        variants: snapshot.index.variants_count(),
        brands: snapshot.index.brands_count(),
        evidence_records: state.evidence.current().records_count(),
        fuel_types: state.prices.current().len(),
        match_cache: state.enricher.cache_stats(),
    };
    Json(stats)
}

async fn enrich(State(state): State<ServerState>, Json(input): Json<ListingInput>) -> Response {
    match state.enricher.enrich(&input) {
        Ok(record) => {
            metrics::record_enrich_outcome(record.match_summary.outcome_label());
            Json(record).into_response()
        }
        Err(EnrichError::Cost(err)) => {
            // A silently zeroed cost would be worse than this request
            // failing, so it fails.
            metrics::record_enrich_failure("missing_cost_input");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

async fn refresh(State(refresher): State<GuardedRefresher>) -> Response {
    match refresher.refresh_all() {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            error!("Manual refresh failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

pub fn make_routes() -> Router<ServerState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/enrich", post(enrich))
        .route("/api/stats", get(stats))
        .route("/api/admin/refresh", post(refresh))
        .route("/metrics", get(metrics::metrics_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(format_uptime(Duration::from_secs(3661)), "0d 01:01:01");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 01:01:01");
    }
}
