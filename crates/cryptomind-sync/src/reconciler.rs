//! Per-admin membership reconciliation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cryptomind_core::{Result, WhopSettings};
use cryptomind_store::{MemberRecord, MemberStore, StoredMember};
use cryptomind_whop::{Membership, MembershipSource};
use futures::TryStreamExt;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::commission::CommissionProcessor;
use crate::types::{CommissionOutcome, SyncResult};

const UNKNOWN: &str = "unknown";
const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Pulls the owner company's memberships and refreshes one admin's tracked
/// members from them.
pub struct MembershipReconciler {
    source: Option<Arc<dyn MembershipSource>>,
    store: Arc<dyn MemberStore>,
    commissions: CommissionProcessor,
    owner_company_id: Option<String>,
    fallback_plan_id: Option<String>,
    page_size: u32,
}

impl MembershipReconciler {
    /// `source` is `None` when the Whop integration is disabled.
    pub fn new(
        source: Option<Arc<dyn MembershipSource>>,
        store: Arc<dyn MemberStore>,
        whop: &WhopSettings,
        page_size: u32,
    ) -> Self {
        Self {
            source,
            commissions: CommissionProcessor::new(store.clone()),
            store,
            owner_company_id: whop.owner_company_id.clone(),
            fallback_plan_id: whop.fallback_plan_id.clone(),
            page_size,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.source.is_some()
    }

    /// Sync the members tracked by `admin_user_id`.
    ///
    /// Errors are collected in the result instead of being returned.
    pub async fn sync_admin(
        &self,
        admin_company_id: &str,
        admin_user_id: &str,
        commission_amount: i64,
    ) -> SyncResult {
        let Some(source) = self.source.as_deref() else {
            return SyncResult::with_error("Whop integration not configured");
        };
        let Some(owner_company_id) = self.owner_company_id.as_deref() else {
            return SyncResult::with_error("WHOP_COMPANY_ID not configured");
        };

        info!(
            "Starting sync for admin {} (company: {}), owner company {}",
            admin_user_id, admin_company_id, owner_company_id
        );

        let mut result = SyncResult::default();
        let (stored, memberships) =
            match self.load(source, owner_company_id, admin_user_id).await {
                Ok(loaded) => loaded,
                Err(e) => {
                    let msg = format!("Error syncing memberships: {}", e);
                    error!("{}", msg);
                    result.errors.push(msg);
                    return result;
                }
            };

        let known_users: HashSet<&str> = stored.iter().map(|m| m.user_id.as_str()).collect();
        let known_memberships: HashMap<&str, &StoredMember> = stored
            .iter()
            .map(|m| (m.membership_id.as_str(), m))
            .collect();

        let tracked: Vec<&Membership> = memberships
            .iter()
            .filter(|m| {
                known_memberships.contains_key(m.id.as_str())
                    || m.user_id
                        .as_deref()
                        .is_some_and(|u| known_users.contains(u))
            })
            .collect();
        info!(
            "Found {} of {} memberships for admin {}",
            tracked.len(),
            memberships.len(),
            admin_user_id
        );

        for membership in tracked {
            let existing = known_memberships.get(membership.id.as_str()).copied();
            if let Err(e) = self
                .sync_membership(
                    source,
                    membership,
                    existing,
                    admin_company_id,
                    admin_user_id,
                    commission_amount,
                    &mut result,
                )
                .await
            {
                let msg = format!("Error processing membership {}: {}", membership.id, e);
                error!("{}", msg);
                result.errors.push(msg);
            }
        }

        info!(
            "Sync complete for admin {}: {} synced, {} new, {} updated, {} commissions",
            admin_user_id,
            result.synced,
            result.new_members,
            result.updated_members,
            result.commissions_processed
        );
        result
    }

    async fn load(
        &self,
        source: &dyn MembershipSource,
        owner_company_id: &str,
        admin_user_id: &str,
    ) -> Result<(Vec<StoredMember>, Vec<Membership>)> {
        let stored = self.store.get_stored_members_by_admin(admin_user_id)?;
        debug!("Admin {} has {} stored members", admin_user_id, stored.len());

        let memberships: Vec<Membership> = source
            .list_memberships(owner_company_id, self.page_size)
            .try_collect()
            .await?;
        debug!(
            "Fetched {} memberships from owner company {}",
            memberships.len(),
            owner_company_id
        );
        Ok((stored, memberships))
    }

    #[allow(clippy::too_many_arguments)]
    async fn sync_membership(
        &self,
        source: &dyn MembershipSource,
        membership: &Membership,
        existing: Option<&StoredMember>,
        admin_company_id: &str,
        admin_user_id: &str,
        commission_amount: i64,
        result: &mut SyncResult,
    ) -> Result<()> {
        let mut username = membership.username.clone();
        let mut name = membership.user_name.clone();
        let mut profile_picture_url = None;

        if let Some(user_id) = membership.user_id.as_deref() {
            match source.retrieve_user(user_id).await {
                Ok(details) => {
                    username = details.username.or(username);
                    name = details.name.or(name);
                    profile_picture_url = details.profile_picture_url;
                }
                Err(e) => warn!("Could not fetch user details for {}: {}", user_id, e),
            }
        }

        let record = MemberRecord {
            id: format!("member_{}", Uuid::new_v4()),
            membership_id: membership.id.clone(),
            user_id: membership.user_id.clone().unwrap_or_else(|| UNKNOWN.into()),
            username: username.unwrap_or_else(|| UNKNOWN.into()),
            name,
            profile_picture_url,
            admin_user_id: admin_user_id.to_string(),
            company_id: admin_company_id.to_string(),
            product_id: membership.product_id.clone().unwrap_or_else(|| UNKNOWN.into()),
            product_title: membership
                .product_title
                .clone()
                .unwrap_or_else(|| UNKNOWN_PRODUCT.into()),
            plan_id: membership
                .plan_id
                .clone()
                .or_else(|| self.fallback_plan_id.clone())
                .unwrap_or_else(|| UNKNOWN.into()),
            status: membership.status,
            raw_status: membership.raw_status.clone(),
            renewal_period_start: membership.renewal_period_start,
            renewal_period_end: membership.renewal_period_end,
            cancel_at_period_end: membership.cancel_at_period_end,
            canceled_at: membership.canceled_at,
            cancellation_reason: membership.cancellation_reason.clone(),
            commission_processed: existing.is_some_and(|m| m.commission_processed),
        };

        let outcome = self.store.upsert_stored_member(&record)?;
        result.synced += 1;

        if !outcome.is_new {
            result.updated_members += 1;
            return Ok(());
        }

        result.new_members += 1;
        info!("New member detected: {} ({})", record.username, membership.id);

        if membership.status.earns_commission() {
            let outcome = self.commissions.process(
                &membership.id,
                admin_user_id,
                membership.user_id.as_deref(),
                commission_amount,
            );
            if outcome.is_processed() {
                result.commissions_processed += 1;
            } else if let CommissionOutcome::Failed(e) = outcome {
                warn!("Commission for {} not credited: {}", membership.id, e);
            }
        }
        Ok(())
    }
}
