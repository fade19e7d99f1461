//! Membership sync control routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use cryptomind_sync::PollerStatus;
use tracing::info;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/membership-sync/status", get(get_status))
        .route("/membership-sync/start", post(start_polling))
        .route("/membership-sync/stop", post(stop_polling))
        .route("/membership-sync/run", post(run_pass))
}

/// GET /api/membership-sync/status
async fn get_status(State(state): State<Arc<AppState>>) -> Json<PollerStatus> {
    Json(state.poller.status())
}

/// POST /api/membership-sync/start
async fn start_polling(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let started = state.poller.start();
    Json(serde_json::json!({
        "started": started,
        "running": state.poller.is_running(),
    }))
}

/// POST /api/membership-sync/stop
async fn stop_polling(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stopped = state.poller.stop();
    Json(serde_json::json!({
        "stopped": stopped,
        "running": state.poller.is_running(),
    }))
}

/// POST /api/membership-sync/run: one pass, awaited.
async fn run_pass(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    info!("Manual membership sync requested");
    match state.poller.run_now().await {
        Some(results) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "admins": results.len(),
                "results": results,
            })),
        ),
        None => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "A membership sync pass is already in progress" })),
        ),
    }
}
