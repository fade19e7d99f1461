//! Admin registration and per-admin member/commission views.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use cryptomind_store::MemberStore;
use serde::Deserialize;
use tracing::info;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admins", get(list_admins).post(upsert_admin))
        .route("/admins/{user_id}/members", get(list_members))
        .route("/admins/{user_id}/commissions", get(list_commissions))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertAdminBody {
    user_id: String,
    #[serde(default)]
    company_id: Option<String>,
}

fn error_response(status: StatusCode, message: impl ToString) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({ "error": message.to_string() })))
}

/// GET /api/admins
async fn list_admins(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.get_all_admins() {
        Ok(admins) => (
            StatusCode::OK,
            Json(serde_json::json!({ "admins": admins, "total": admins.len() })),
        ),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// POST /api/admins: create or update an admin.
async fn upsert_admin(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpsertAdminBody>,
) -> impl IntoResponse {
    let user_id = body.user_id.trim();
    if user_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "userId is required");
    }
    let company_id = body
        .company_id
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    match state.store.upsert_admin(user_id, company_id) {
        Ok(admin) => {
            info!("Registered admin {} (company: {:?})", admin.user_id, admin.company_id);
            (StatusCode::OK, Json(serde_json::json!(admin)))
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// GET /api/admins/:user_id/members
async fn list_members(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_stored_members_by_admin(&user_id) {
        Ok(members) => (
            StatusCode::OK,
            Json(serde_json::json!({ "members": members, "total": members.len() })),
        ),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// GET /api/admins/:user_id/commissions
async fn list_commissions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.store.list_commission_payments_by_admin(&user_id) {
        Ok(payments) => {
            let total: i64 = payments.iter().map(|p| p.commission_amount).sum();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "payments": payments,
                    "count": payments.len(),
                    "totalCommission": total,
                })),
            )
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}
