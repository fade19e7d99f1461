//! One-time commission crediting for new members.

use std::sync::Arc;

use cryptomind_core::{Error, Result};
use cryptomind_store::{payment_id_for, MemberStore, NewCommissionPayment};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::types::CommissionOutcome;

/// Credits an admin once per membership.
///
/// Safe to replay: the member flag and the `(payment_id, admin)` key are both
/// checked before anything is written, and a crash between recording the
/// payment and setting the flag is repaired on the next call.
pub struct CommissionProcessor {
    store: Arc<dyn MemberStore>,
}

impl CommissionProcessor {
    pub fn new(store: Arc<dyn MemberStore>) -> Self {
        Self { store }
    }

    /// Credit `admin_user_id` for `membership_id`. Never fails; errors are
    /// logged and returned as [`CommissionOutcome::Failed`].
    pub fn process(
        &self,
        membership_id: &str,
        admin_user_id: &str,
        customer_user_id: Option<&str>,
        amount: i64,
    ) -> CommissionOutcome {
        match self.try_process(membership_id, admin_user_id, customer_user_id, amount) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    "Error processing commission for {}: {}",
                    membership_id, e
                );
                CommissionOutcome::Failed(e.to_string())
            }
        }
    }

    fn try_process(
        &self,
        membership_id: &str,
        admin_user_id: &str,
        customer_user_id: Option<&str>,
        amount: i64,
    ) -> Result<CommissionOutcome> {
        if let Some(member) = self.store.get_stored_member_by_membership_id(membership_id)? {
            if member.commission_processed {
                debug!("Commission already processed for {}", membership_id);
                return Ok(CommissionOutcome::AlreadyProcessed);
            }
        }

        let payment_id = payment_id_for(membership_id);
        if self.store.has_processed_payment(&payment_id, admin_user_id)? {
            info!("Commission already recorded for {}", membership_id);
            self.store.mark_member_commission_processed(membership_id)?;
            return Ok(CommissionOutcome::AlreadyRecorded);
        }

        let payment = NewCommissionPayment {
            id: format!("comm_{}", Uuid::new_v4()),
            payment_id,
            admin_user_id: admin_user_id.to_string(),
            amount,
            commission_amount: amount,
            customer_user_id: customer_user_id.map(str::to_string),
            customer_email: None,
        };

        match self.store.record_commission_payment(&payment) {
            Ok(_) => {}
            // Lost a race with another writer; the payment exists, so repair the flag.
            Err(Error::DuplicatePayment(_)) => {
                self.store.mark_member_commission_processed(membership_id)?;
                return Ok(CommissionOutcome::AlreadyRecorded);
            }
            Err(e) => return Err(e),
        }

        self.store.mark_member_commission_processed(membership_id)?;
        info!(
            "Commission of {} added for admin {} from membership {}",
            amount, admin_user_id, membership_id
        );
        Ok(CommissionOutcome::Recorded)
    }
}
