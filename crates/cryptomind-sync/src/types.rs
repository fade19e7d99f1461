//! Sync result types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Summary of one admin's sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub synced: usize,
    pub new_members: usize,
    pub updated_members: usize,
    pub commissions_processed: usize,
    /// In the order they happened.
    pub errors: Vec<String>,
}

impl SyncResult {
    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
            ..Default::default()
        }
    }
}

/// Per-admin results of a fleet pass, keyed by admin user id.
pub type FleetResults = BTreeMap<String, SyncResult>;

/// What the commission processor did for one membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome", content = "detail")]
pub enum CommissionOutcome {
    /// A new payment was recorded and the member flagged.
    Recorded,
    /// The member was already flagged.
    AlreadyProcessed,
    /// The payment already existed; only the member flag was repaired.
    AlreadyRecorded,
    Failed(String),
}

impl CommissionOutcome {
    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Recorded)
    }
}

/// What started a fleet pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PassTrigger {
    Scheduled,
    Manual,
}

/// The most recent completed fleet pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    pub trigger: PassTrigger,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub results: FleetResults,
}

/// Poller state for status reporting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollerStatus {
    pub running: bool,
    pub pass_in_progress: bool,
    pub interval_ms: u64,
    pub last_pass: Option<PassReport>,
}
