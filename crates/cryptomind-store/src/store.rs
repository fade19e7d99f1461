//! The persistence contract the sync core depends on.

use cryptomind_core::Result;

use crate::types::*;

/// Member persistence consumed by the reconciler and commission processor.
///
/// Calls are short and synchronous; implementations guard their own state.
pub trait MemberStore: Send + Sync {
    /// All members tracked for an admin.
    fn get_stored_members_by_admin(&self, admin_user_id: &str) -> Result<Vec<StoredMember>>;

    /// Insert or refresh a member keyed by membership id.
    ///
    /// `commission_processed` never moves from true back to false.
    fn upsert_stored_member(&self, record: &MemberRecord) -> Result<UpsertOutcome>;

    fn get_stored_member_by_membership_id(&self, membership_id: &str)
        -> Result<Option<StoredMember>>;

    /// Whether `payment_id` was already recorded for the admin.
    fn has_processed_payment(&self, payment_id: &str, admin_user_id: &str) -> Result<bool>;

    /// Append a payment. Fails with `Error::DuplicatePayment` if the
    /// (payment id, admin) pair exists.
    fn record_commission_payment(&self, payment: &NewCommissionPayment)
        -> Result<CommissionPayment>;

    /// Set the member's commission flag. Returns false if no such member.
    fn mark_member_commission_processed(&self, membership_id: &str) -> Result<bool>;

    fn get_all_admins(&self) -> Result<Vec<AdminAccount>>;
}
