// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`:
//
//   GET  /health           status, uptime, run counters
//   GET  /score            latest CycleReport (404 before the first run)
//   GET  /pi-cycle?limit=N Pi Cycle chart, last N points (default from config)
//   GET  /history          every recorded score, oldest first
//   POST /refresh          evaluate now and return the new report
//
// CORS is permissive; the service exposes read-only data plus a refresh.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::api::ApiError;
use crate::app_state::{AppState, RunStats};
use crate::engine::CycleReport;
use crate::indicators::PiCycleState;
use crate::types::ScoreRecord;

// =============================================================================
// Router construction
// =============================================================================

/// Build the REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/score", get(score))
        .route("/api/v1/pi-cycle", get(pi_cycle))
        .route("/api/v1/history", get(history))
        .route("/api/v1/refresh", post(refresh))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(flatten)]
    stats: RunStats,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        stats: state.stats(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Score
// =============================================================================

async fn score(State(state): State<Arc<AppState>>) -> Result<Json<CycleReport>, ApiError> {
    state
        .latest_report()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("no evaluation has completed yet".into()))
}

async fn refresh(State(state): State<Arc<AppState>>) -> Result<Json<CycleReport>, ApiError> {
    info!("evaluation requested via API");
    Ok(Json(state.run_evaluation().await?))
}

// =============================================================================
// Pi Cycle chart
// =============================================================================

#[derive(Deserialize)]
struct ChartQuery {
    limit: Option<usize>,
}

async fn pi_cycle(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
) -> Json<Vec<PiCycleState>> {
    let limit = query.limit.unwrap_or(state.config.chart_points);
    Json(state.pi_cycle_chart(limit))
}

// =============================================================================
// History
// =============================================================================

async fn history(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ScoreRecord>>, ApiError> {
    Ok(Json(state.history.records()?))
}
