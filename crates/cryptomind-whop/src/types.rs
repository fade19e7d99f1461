//! Whop record types.
//!
//! `Raw*` structs mirror the API payloads and accept anything loosely typed;
//! [`Membership`] and [`UserDetails`] are what the rest of the workspace sees.

use chrono::{DateTime, TimeZone, Utc};
use cryptomind_core::{Error, MembershipStatus, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::profile::extract_profile_picture_url;

// ---------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------

/// One page of a cursor-paginated listing. Records stay untyped until
/// [`parse_membership`] validates them one at a time.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPage<T = Value> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub page_info: Option<RawPageInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPageInfo {
    #[serde(default)]
    pub end_cursor: Option<String>,
    #[serde(default)]
    pub has_next_page: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMembership {
    pub id: Option<String>,
    pub status: Option<String>,
    pub user: Option<RawUserRef>,
    pub product: Option<RawProductRef>,
    pub plan: Option<RawPlanRef>,
    pub renewal_period_start: Option<Value>,
    pub renewal_period_end: Option<Value>,
    pub cancel_at_period_end: Option<Value>,
    pub canceled_at: Option<Value>,
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawUserRef {
    pub id: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawProductRef {
    pub id: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPlanRef {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawUser {
    pub id: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub profile_picture: Option<Value>,
}

// ---------------------------------------------------------------
// Validated shapes
// ---------------------------------------------------------------

/// A membership under the owner company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub id: String,
    pub status: MembershipStatus,
    /// Status string as sent by Whop, lowercased.
    pub raw_status: Option<String>,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub user_name: Option<String>,
    pub product_id: Option<String>,
    pub product_title: Option<String>,
    pub plan_id: Option<String>,
    pub renewal_period_start: Option<DateTime<Utc>>,
    pub renewal_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
}

impl Membership {
    /// Minimal membership, mostly for fakes and tests.
    pub fn new(id: impl Into<String>, status: MembershipStatus) -> Self {
        Self {
            id: id.into(),
            status,
            raw_status: None,
            user_id: None,
            username: None,
            user_name: None,
            product_id: None,
            product_title: None,
            plan_id: None,
            renewal_period_start: None,
            renewal_period_end: None,
            cancel_at_period_end: false,
            canceled_at: None,
            cancellation_reason: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>, username: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.username = Some(username.into());
        self
    }
}

impl TryFrom<RawMembership> for Membership {
    type Error = Error;

    fn try_from(raw: RawMembership) -> Result<Self> {
        let id = non_empty(raw.id)
            .ok_or_else(|| Error::InvalidRecord("membership without id".into()))?;
        let user = raw.user.unwrap_or_default();
        let product = raw.product.unwrap_or_default();

        Ok(Self {
            id,
            status: raw
                .status
                .as_deref()
                .map(MembershipStatus::parse)
                .unwrap_or(MembershipStatus::Unknown),
            raw_status: non_empty(raw.status).map(|s| s.trim().to_ascii_lowercase()),
            user_id: non_empty(user.id),
            username: non_empty(user.username),
            user_name: non_empty(user.name),
            product_id: non_empty(product.id),
            product_title: non_empty(product.title),
            plan_id: raw.plan.and_then(|p| non_empty(p.id)),
            renewal_period_start: raw.renewal_period_start.as_ref().and_then(parse_timestamp),
            renewal_period_end: raw.renewal_period_end.as_ref().and_then(parse_timestamp),
            cancel_at_period_end: raw
                .cancel_at_period_end
                .as_ref()
                .and_then(Value::as_bool)
                .unwrap_or(false),
            canceled_at: raw.canceled_at.as_ref().and_then(parse_timestamp),
            cancellation_reason: non_empty(raw.cancellation_reason),
        })
    }
}

/// Validate one listing record.
///
/// A record whose fields have the wrong JSON types, or that has no id, is an
/// [`Error::InvalidRecord`] naming the id when one can be found.
pub fn parse_membership(value: Value) -> Result<Membership> {
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("<no id>")
        .to_string();
    let raw: RawMembership = serde_json::from_value(value)
        .map_err(|e| Error::InvalidRecord(format!("membership {}: {}", id, e)))?;
    Membership::try_from(raw)
}

/// Full user details from the user lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDetails {
    pub id: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    /// Already normalized by [`extract_profile_picture_url`].
    pub profile_picture_url: Option<String>,
}

impl From<RawUser> for UserDetails {
    fn from(raw: RawUser) -> Self {
        Self {
            id: non_empty(raw.id),
            username: non_empty(raw.username),
            name: non_empty(raw.name),
            profile_picture_url: raw
                .profile_picture
                .as_ref()
                .and_then(extract_profile_picture_url),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Accept RFC 3339 strings or Unix seconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_membership_from_full_payload() {
        let raw: RawMembership = serde_json::from_value(json!({
            "id": "mem_123",
            "status": "trialing",
            "user": { "id": "user_1", "username": "satoshi", "name": "Satoshi" },
            "product": { "id": "prod_1", "title": "CryptoMind Pro" },
            "plan": { "id": "plan_9" },
            "renewal_period_start": "2024-05-01T00:00:00Z",
            "renewal_period_end": 1717200000,
            "cancel_at_period_end": true,
            "canceled_at": null,
            "cancellation_reason": null,
            "extra_field": { "ignored": true }
        }))
        .unwrap();

        let m = Membership::try_from(raw).unwrap();
        assert_eq!(m.id, "mem_123");
        assert_eq!(m.status, MembershipStatus::Trialing);
        assert_eq!(m.user_id.as_deref(), Some("user_1"));
        assert_eq!(m.username.as_deref(), Some("satoshi"));
        assert_eq!(m.product_title.as_deref(), Some("CryptoMind Pro"));
        assert_eq!(m.plan_id.as_deref(), Some("plan_9"));
        assert_eq!(
            m.renewal_period_start.unwrap().to_rfc3339(),
            "2024-05-01T00:00:00+00:00"
        );
        assert_eq!(m.renewal_period_end.unwrap().timestamp(), 1717200000);
        assert!(m.cancel_at_period_end);
        assert!(m.canceled_at.is_none());
    }

    #[test]
    fn test_membership_sparse_payload() {
        let raw: RawMembership =
            serde_json::from_value(json!({ "id": "mem_1", "status": "paused", "user": null })).unwrap();
        let m = Membership::try_from(raw).unwrap();
        assert_eq!(m.status, MembershipStatus::Unknown);
        assert_eq!(m.raw_status.as_deref(), Some("paused"));
        assert!(m.user_id.is_none());
        assert!(m.product_id.is_none());
        assert!(!m.cancel_at_period_end);
    }

    #[test]
    fn test_membership_without_id_rejected() {
        let raw: RawMembership = serde_json::from_value(json!({ "status": "active" })).unwrap();
        assert!(matches!(Membership::try_from(raw), Err(Error::InvalidRecord(_))));

        let raw: RawMembership = serde_json::from_value(json!({ "id": "" })).unwrap();
        assert!(Membership::try_from(raw).is_err());
    }

    #[test]
    fn test_loose_field_types_tolerated() {
        let raw: RawMembership = serde_json::from_value(json!({
            "id": "mem_1",
            "cancel_at_period_end": "yes",
            "renewal_period_start": { "seconds": 1 },
            "canceled_at": "not a date"
        }))
        .unwrap();
        let m = Membership::try_from(raw).unwrap();
        assert!(!m.cancel_at_period_end);
        assert!(m.renewal_period_start.is_none());
        assert!(m.canceled_at.is_none());
    }

    #[test]
    fn test_user_details_normalizes_picture() {
        let raw: RawUser = serde_json::from_value(json!({
            "id": "user_1",
            "username": "satoshi",
            "name": "",
            "profile_picture": { "url": "https://cdn.example.com/plain/https://real.example.com/pic.png" }
        }))
        .unwrap();
        let user = UserDetails::from(raw);
        assert_eq!(user.username.as_deref(), Some("satoshi"));
        assert!(user.name.is_none());
        assert_eq!(
            user.profile_picture_url.as_deref(),
            Some("https://real.example.com/pic.png")
        );
    }

    #[test]
    fn test_page_defaults() {
        let page: RawPage = serde_json::from_value(json!({})).unwrap();
        assert!(page.data.is_empty());
        assert!(page.page_info.is_none());
    }

    #[test]
    fn test_mistyped_record_fails_alone() {
        let page: RawPage = serde_json::from_value(json!({
            "data": [
                { "id": "mem_good", "status": "Active" },
                { "id": "mem_bad", "status": "active", "cancellation_reason": { "code": 3 } },
                { "id": "mem_bad_user", "user": { "id": 42 } }
            ]
        }))
        .unwrap();

        let parsed: Vec<Result<Membership>> = page.data.into_iter().map(parse_membership).collect();
        let good = parsed[0].as_ref().unwrap();
        assert_eq!(good.id, "mem_good");
        assert_eq!(good.raw_status.as_deref(), Some("active"));

        match &parsed[1] {
            Err(Error::InvalidRecord(msg)) => assert!(msg.contains("mem_bad")),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(parsed[2].is_err());
    }
}
