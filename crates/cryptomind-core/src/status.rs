//! Membership status as reported by Whop.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a remote membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Trialing,
    Active,
    PastDue,
    Completed,
    Canceled,
    Expired,
    Unresolved,
    Drafted,
    /// Any value this build does not recognize.
    #[serde(other)]
    Unknown,
}

impl MembershipStatus {
    pub const ALL: [MembershipStatus; 9] = [
        Self::Trialing,
        Self::Active,
        Self::PastDue,
        Self::Completed,
        Self::Canceled,
        Self::Expired,
        Self::Unresolved,
        Self::Drafted,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trialing => "trialing",
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::Expired => "expired",
            Self::Unresolved => "unresolved",
            Self::Drafted => "drafted",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a wire value. Unrecognized values map to `Unknown`.
    pub fn parse(value: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(value.trim()))
            .unwrap_or(Self::Unknown)
    }

    /// Whether a newly discovered membership in this state pays a commission.
    pub fn earns_commission(&self) -> bool {
        matches!(self, Self::Active | Self::Trialing | Self::Completed)
    }
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_and_unknown() {
        assert_eq!(MembershipStatus::parse("active"), MembershipStatus::Active);
        assert_eq!(MembershipStatus::parse("PAST_DUE"), MembershipStatus::PastDue);
        assert_eq!(MembershipStatus::parse("paused"), MembershipStatus::Unknown);
        for status in MembershipStatus::ALL {
            assert_eq!(MembershipStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn test_earns_commission() {
        let earning: Vec<_> = MembershipStatus::ALL
            .into_iter()
            .filter(|s| s.earns_commission())
            .collect();
        assert_eq!(
            earning,
            vec![
                MembershipStatus::Trialing,
                MembershipStatus::Active,
                MembershipStatus::Completed
            ]
        );
    }

    #[test]
    fn test_serde_other() {
        let s: MembershipStatus = serde_json::from_str("\"canceled\"").unwrap();
        assert_eq!(s, MembershipStatus::Canceled);
        let s: MembershipStatus = serde_json::from_str("\"something_new\"").unwrap();
        assert_eq!(s, MembershipStatus::Unknown);
    }
}
