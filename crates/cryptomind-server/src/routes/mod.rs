//! HTTP route handlers.

pub mod admins;
pub mod sync;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(sync::routes())
        .merge(admins::routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use cryptomind_core::{CryptoMindConfig, MembershipStatus};
    use cryptomind_store::{MemberRecord, MemberStore, SqliteStore};
    use cryptomind_whop::MembershipSource;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn config(dir: &TempDir) -> CryptoMindConfig {
        CryptoMindConfig::from_lookup(dir.path(), |_| None).unwrap()
    }

    fn test_state(source: Option<Arc<dyn MembershipSource>>) -> (Arc<AppState>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let state = Arc::new(AppState::new(&config(&dir), store, source));
        (state, dir)
    }

    async fn call(state: &Arc<AppState>, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = build_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_status_shape() {
        let (state, _dir) = test_state(None);
        let (status, body) = call(&state, "GET", "/api/membership-sync/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["running"], false);
        assert_eq!(body["passInProgress"], false);
        assert_eq!(body["intervalMs"], 300_000);
        assert!(body["lastPass"].is_null());
    }

    #[tokio::test]
    async fn test_start_stop_cycle() {
        let (state, _dir) = test_state(None);

        let (_, body) = call(&state, "POST", "/api/membership-sync/start", None).await;
        assert_eq!(body["started"], true);
        let (_, body) = call(&state, "POST", "/api/membership-sync/start", None).await;
        assert_eq!(body["started"], false);

        let (_, body) = call(&state, "POST", "/api/membership-sync/stop", None).await;
        assert_eq!(body["stopped"], true);
        assert_eq!(body["running"], false);
        let (_, body) = call(&state, "POST", "/api/membership-sync/stop", None).await;
        assert_eq!(body["stopped"], false);
    }

    #[tokio::test]
    async fn test_admin_registration_and_manual_run() {
        let (state, _dir) = test_state(None);

        let (status, body) = call(
            &state,
            "POST",
            "/api/admins",
            Some(serde_json::json!({ "userId": "admin_a", "companyId": "biz_a" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userId"], "admin_a");
        assert_eq!(body["companyId"], "biz_a");

        let (_, body) = call(&state, "GET", "/api/admins", None).await;
        assert_eq!(body["total"], 1);

        // Integration disabled: the pass still runs and reports it per admin.
        let (status, body) = call(&state, "POST", "/api/membership-sync/run", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["admins"], 1);
        assert_eq!(
            body["results"]["admin_a"]["errors"][0],
            "Whop integration not configured"
        );

        let (_, body) = call(&state, "GET", "/api/membership-sync/status", None).await;
        assert_eq!(body["lastPass"]["trigger"], "manual");
    }

    #[tokio::test]
    async fn test_rejects_blank_admin() {
        let (state, _dir) = test_state(None);
        let (status, body) = call(
            &state,
            "POST",
            "/api/admins",
            Some(serde_json::json!({ "userId": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_members_and_commissions_views() {
        let (state, _dir) = test_state(None);
        let record = MemberRecord {
            id: "member_1".into(),
            membership_id: "mem_1".into(),
            user_id: "user_1".into(),
            username: "alice".into(),
            name: None,
            profile_picture_url: None,
            admin_user_id: "admin_a".into(),
            company_id: "biz_a".into(),
            product_id: "prod_1".into(),
            product_title: "CryptoMind Pro".into(),
            plan_id: "plan_1".into(),
            status: MembershipStatus::Active,
            raw_status: None,
            renewal_period_start: None,
            renewal_period_end: None,
            cancel_at_period_end: false,
            canceled_at: None,
            cancellation_reason: None,
            commission_processed: false,
        };
        state.store.upsert_stored_member(&record).unwrap();

        let (_, body) = call(&state, "GET", "/api/admins/admin_a/members", None).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["members"][0]["membershipId"], "mem_1");
        assert_eq!(body["members"][0]["status"], "active");

        let (_, body) = call(&state, "GET", "/api/admins/admin_b/members", None).await;
        assert_eq!(body["total"], 0);

        let (_, body) = call(&state, "GET", "/api/admins/admin_a/commissions", None).await;
        assert_eq!(body["count"], 0);
        assert_eq!(body["totalCommission"], 0);
    }

    #[tokio::test]
    async fn test_enabled_source_is_wired() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.whop.api_key = Some("sk_test".into());
        config.whop.owner_company_id = Some("biz_owner".into());
        let source = crate::state::whop_source(&config.whop).unwrap();
        assert!(source.is_some());

        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let state = AppState::new(&config, store, source);
        assert!(state.fleet.reconciler().is_enabled());
        assert!(!state.poller.is_running());
    }

    #[test]
    fn test_disabled_without_api_key() {
        let dir = TempDir::new().unwrap();
        assert!(crate::state::whop_source(&config(&dir).whop).unwrap().is_none());
    }
}
