//! Fleet-wide sync over every registered admin.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use cryptomind_store::MemberStore;
use futures::FutureExt;
use tracing::{error, info};

use crate::reconciler::MembershipReconciler;
use crate::types::{FleetResults, SyncResult};

/// Runs the reconciler for each admin that has a company id.
pub struct FleetSync {
    store: Arc<dyn MemberStore>,
    reconciler: MembershipReconciler,
    commission_amount: i64,
}

impl FleetSync {
    pub fn new(
        store: Arc<dyn MemberStore>,
        reconciler: MembershipReconciler,
        commission_amount: i64,
    ) -> Self {
        Self {
            store,
            reconciler,
            commission_amount,
        }
    }

    pub fn reconciler(&self) -> &MembershipReconciler {
        &self.reconciler
    }

    /// Sync every admin in turn. Admins without a company id are skipped, and
    /// a failed admin listing yields an empty map.
    pub async fn sync_all(&self) -> FleetResults {
        let mut results = FleetResults::new();

        let admins = match self.store.get_all_admins() {
            Ok(admins) => admins,
            Err(e) => {
                error!("Error syncing all admin memberships: {}", e);
                return results;
            }
        };
        info!("Starting sync for {} admins", admins.len());

        for admin in admins {
            let company_id = admin
                .company_id
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty());
            let Some(company_id) = company_id else {
                info!("Skipping admin {} - no company ID", admin.user_id);
                continue;
            };

            let pass = self
                .reconciler
                .sync_admin(company_id, &admin.user_id, self.commission_amount);
            let result = match AssertUnwindSafe(pass).catch_unwind().await {
                Ok(result) => result,
                Err(panic) => {
                    let msg = format!(
                        "Sync for admin {} panicked: {}",
                        admin.user_id,
                        panic_message(panic.as_ref())
                    );
                    error!("{}", msg);
                    SyncResult::with_error(msg)
                }
            };
            results.insert(admin.user_id, result);
        }

        results
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
