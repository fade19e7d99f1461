//! Membership sync: reconciles stored members against Whop and pays
//! one-time commissions.
//!
//! [`MembershipReconciler`] handles one admin, [`CommissionProcessor`] keeps
//! payouts at-most-once, [`FleetSync`] walks every admin, and [`SyncPoller`]
//! runs the fleet pass on a timer.

pub mod commission;
pub mod fleet;
pub mod poller;
pub mod reconciler;
pub mod types;

#[cfg(test)]
mod testing;

pub use commission::CommissionProcessor;
pub use fleet::FleetSync;
pub use poller::SyncPoller;
pub use reconciler::MembershipReconciler;
pub use types::*;
