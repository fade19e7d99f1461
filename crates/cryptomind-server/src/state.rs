//! Shared application state.

use std::sync::Arc;

use cryptomind_core::{CryptoMindConfig, Result, WhopSettings};
use cryptomind_store::{MemberStore, SqliteStore};
use cryptomind_sync::{FleetSync, MembershipReconciler, SyncPoller};
use cryptomind_whop::{MembershipSource, WhopClient};
use tracing::{info, warn};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub store: Arc<SqliteStore>,
    pub fleet: Arc<FleetSync>,
    pub poller: SyncPoller,
}

impl AppState {
    pub fn new(
        config: &CryptoMindConfig,
        store: Arc<SqliteStore>,
        source: Option<Arc<dyn MembershipSource>>,
    ) -> Self {
        let member_store: Arc<dyn MemberStore> = store.clone();
        let reconciler = MembershipReconciler::new(
            source,
            member_store.clone(),
            &config.whop,
            config.sync.page_size,
        );
        let fleet = Arc::new(FleetSync::new(
            member_store,
            reconciler,
            config.sync.commission_amount,
        ));
        let poller = SyncPoller::new(fleet.clone(), config.sync.interval());

        Self {
            store,
            fleet,
            poller,
        }
    }
}

/// The Whop client, or `None` when no API key is configured.
pub fn whop_source(settings: &WhopSettings) -> Result<Option<Arc<dyn MembershipSource>>> {
    if !settings.is_enabled() {
        warn!("WHOP_API_KEY not set; membership sync is disabled");
        return Ok(None);
    }
    if settings.owner_company_id.is_none() {
        warn!("WHOP_COMPANY_ID not set; sync passes will report it");
    }
    let client = WhopClient::new(settings)?;
    info!("Whop integration enabled ({})", settings.api_base);
    Ok(Some(Arc::new(client)))
}
