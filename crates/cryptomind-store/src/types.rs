//! Data types for stored members, commission payments, and admins.

use chrono::{DateTime, Utc};
use cryptomind_core::MembershipStatus;
use serde::{Deserialize, Serialize};

/// Prefix of the idempotency key recorded for a membership's commission.
pub const PAYMENT_ID_PREFIX: &str = "membership_";

/// Idempotency key for the one-time commission of a membership.
pub fn payment_id_for(membership_id: &str) -> String {
    format!("{}{}", PAYMENT_ID_PREFIX, membership_id)
}

/// Member fields written by a sync pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    /// Synthetic record id, only used when the row is first created.
    pub id: String,
    pub membership_id: String,
    pub user_id: String,
    pub username: String,
    pub name: Option<String>,
    pub profile_picture_url: Option<String>,
    pub admin_user_id: String,
    pub company_id: String,
    pub product_id: String,
    pub product_title: String,
    pub plan_id: String,
    pub status: MembershipStatus,
    /// Status as received from Whop; stored in place of `status` when set.
    pub raw_status: Option<String>,
    pub renewal_period_start: Option<DateTime<Utc>>,
    pub renewal_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub commission_processed: bool,
}

impl MemberRecord {
    /// The status string written to the store.
    pub fn stored_status(&self) -> String {
        self.raw_status
            .as_deref()
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.status.as_str().to_string())
    }
}

/// A stored member row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMember {
    pub id: String,
    pub membership_id: String,
    pub user_id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
    pub admin_user_id: String,
    pub company_id: String,
    pub product_id: String,
    pub product_title: String,
    pub plan_id: String,
    pub status: MembershipStatus,
    /// Stored status string; differs from `status` for values this build
    /// does not recognize.
    pub raw_status: String,
    pub renewal_period_start: Option<DateTime<Utc>>,
    pub renewal_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub commission_processed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertOutcome {
    pub is_new: bool,
}

/// A commission payment to be recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommissionPayment {
    pub id: String,
    pub payment_id: String,
    pub admin_user_id: String,
    pub amount: i64,
    pub commission_amount: i64,
    pub customer_user_id: Option<String>,
    pub customer_email: Option<String>,
}

/// A recorded commission payment. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionPayment {
    pub id: String,
    pub payment_id: String,
    pub admin_user_id: String,
    pub amount: i64,
    pub commission_amount: i64,
    pub customer_user_id: Option<String>,
    pub customer_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An admin account whose members are synced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccount {
    pub user_id: String,
    pub company_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
