//! Fakes shared by the sync tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cryptomind_core::{Error, MembershipStatus, Result, WhopSettings};
use cryptomind_store::*;
use cryptomind_whop::{Membership, MembershipSource, MembershipStream, UserDetails};
use parking_lot::{Mutex, RwLock};
use tokio::sync::Semaphore;

pub const OWNER_COMPANY: &str = "biz_owner";

pub fn whop_settings() -> WhopSettings {
    WhopSettings {
        api_key: Some("sk_test".into()),
        owner_company_id: Some(OWNER_COMPANY.into()),
        fallback_plan_id: None,
        api_base: "http://whop.invalid".into(),
    }
}

/// In-memory membership source.
#[derive(Default)]
pub struct FakeSource {
    memberships: RwLock<Vec<Membership>>,
    users: RwLock<HashMap<String, UserDetails>>,
    failing_users: RwLock<HashSet<String>>,
    list_error: RwLock<Option<String>>,
    gate: Option<Arc<Semaphore>>,
    pub list_calls: AtomicUsize,
    pub requested_companies: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new(memberships: Vec<Membership>) -> Self {
        Self {
            memberships: RwLock::new(memberships),
            ..Default::default()
        }
    }

    /// Listing blocks until the gate has a permit.
    pub fn gated(memberships: Vec<Membership>, gate: Arc<Semaphore>) -> Self {
        Self {
            memberships: RwLock::new(memberships),
            gate: Some(gate),
            ..Default::default()
        }
    }

    pub fn add_user(&self, user_id: &str, details: UserDetails) {
        self.users.write().insert(user_id.to_string(), details);
    }

    pub fn fail_user(&self, user_id: &str) {
        self.failing_users.write().insert(user_id.to_string());
    }

    pub fn fail_listing(&self, message: &str) {
        *self.list_error.write() = Some(message.to_string());
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MembershipSource for FakeSource {
    fn list_memberships<'a>(&'a self, company_id: &str, _page_size: u32) -> MembershipStream<'a> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_companies.lock().push(company_id.to_string());
        let items = self.memberships.read().clone();
        let error = self.list_error.read().clone();
        let gate = self.gate.clone();

        Box::pin(async_stream::stream! {
            if let Some(gate) = gate {
                let _permit = gate.acquire().await;
            }
            for m in items {
                yield Ok(m);
            }
            if let Some(message) = error {
                yield Err(Error::Http(message));
            }
        })
    }

    async fn retrieve_user(&self, user_id: &str) -> Result<UserDetails> {
        if self.failing_users.read().contains(user_id) {
            return Err(Error::Http(format!("user {} lookup failed", user_id)));
        }
        self.users
            .read()
            .get(user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(user_id.to_string()))
    }
}

/// Store wrapper that injects failures.
pub struct FlakyStore {
    pub inner: Arc<SqliteStore>,
    pub fail_upsert: RwLock<HashSet<String>>,
    pub fail_mark: RwLock<bool>,
    pub fail_record: RwLock<bool>,
    pub fail_admin_listing: RwLock<bool>,
    /// Admins returned instead of the inner store's rows.
    pub admin_listing: RwLock<Option<Vec<AdminAccount>>>,
    pub panic_for_admin: RwLock<Option<String>>,
}

impl FlakyStore {
    pub fn new(inner: Arc<SqliteStore>) -> Self {
        Self {
            inner,
            fail_upsert: RwLock::new(HashSet::new()),
            fail_mark: RwLock::new(false),
            fail_record: RwLock::new(false),
            fail_admin_listing: RwLock::new(false),
            admin_listing: RwLock::new(None),
            panic_for_admin: RwLock::new(None),
        }
    }
}

impl MemberStore for FlakyStore {
    fn get_stored_members_by_admin(&self, admin_user_id: &str) -> Result<Vec<StoredMember>> {
        if self.panic_for_admin.read().as_deref() == Some(admin_user_id) {
            panic!("store exploded for {}", admin_user_id);
        }
        self.inner.get_stored_members_by_admin(admin_user_id)
    }

    fn upsert_stored_member(&self, record: &MemberRecord) -> Result<UpsertOutcome> {
        if self.fail_upsert.read().contains(&record.membership_id) {
            return Err(Error::Database("disk I/O error".into()));
        }
        self.inner.upsert_stored_member(record)
    }

    fn get_stored_member_by_membership_id(
        &self,
        membership_id: &str,
    ) -> Result<Option<StoredMember>> {
        self.inner.get_stored_member_by_membership_id(membership_id)
    }

    fn has_processed_payment(&self, payment_id: &str, admin_user_id: &str) -> Result<bool> {
        self.inner.has_processed_payment(payment_id, admin_user_id)
    }

    fn record_commission_payment(
        &self,
        payment: &NewCommissionPayment,
    ) -> Result<CommissionPayment> {
        if *self.fail_record.read() {
            return Err(Error::Database("ledger unavailable".into()));
        }
        self.inner.record_commission_payment(payment)
    }

    fn mark_member_commission_processed(&self, membership_id: &str) -> Result<bool> {
        if *self.fail_mark.read() {
            return Err(Error::Database("connection reset".into()));
        }
        self.inner.mark_member_commission_processed(membership_id)
    }

    fn get_all_admins(&self) -> Result<Vec<AdminAccount>> {
        if *self.fail_admin_listing.read() {
            return Err(Error::Database("admins table locked".into()));
        }
        if let Some(admins) = self.admin_listing.read().clone() {
            return Ok(admins);
        }
        self.inner.get_all_admins()
    }
}

pub fn memory_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().unwrap())
}

/// Track a membership for an admin, as an earlier sync or checkout would have.
pub fn seed_member(
    store: &SqliteStore,
    admin: &str,
    membership_id: &str,
    user_id: &str,
    status: MembershipStatus,
    commission_processed: bool,
) {
    store
        .upsert_stored_member(&MemberRecord {
            id: format!("member_{}", membership_id),
            membership_id: membership_id.to_string(),
            user_id: user_id.to_string(),
            username: user_id.to_string(),
            name: None,
            profile_picture_url: None,
            admin_user_id: admin.to_string(),
            company_id: format!("biz_{}", admin),
            product_id: "prod_1".into(),
            product_title: "CryptoMind Pro".into(),
            plan_id: "plan_1".into(),
            status,
            raw_status: None,
            renewal_period_start: None,
            renewal_period_end: None,
            cancel_at_period_end: false,
            canceled_at: None,
            cancellation_reason: None,
            commission_processed,
        })
        .unwrap();
}

pub fn membership(id: &str, user_id: &str, status: MembershipStatus) -> Membership {
    Membership::new(id, status).with_user(user_id, format!("{}_name", user_id))
}
