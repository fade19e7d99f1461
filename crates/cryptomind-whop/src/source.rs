//! The remote membership seam.

use std::pin::Pin;

use async_trait::async_trait;
use cryptomind_core::Result;
use futures::Stream;

use crate::types::{Membership, UserDetails};

/// Boxed stream of memberships. Paging happens behind it.
pub type MembershipStream<'a> = Pin<Box<dyn Stream<Item = Result<Membership>> + Send + 'a>>;

/// Where memberships and user details come from.
#[async_trait]
pub trait MembershipSource: Send + Sync {
    /// Every membership of `company_id`, fetched `page_size` at a time.
    ///
    /// An `Err` item ends the listing.
    fn list_memberships<'a>(&'a self, company_id: &str, page_size: u32) -> MembershipStream<'a>;

    /// Full details for one user.
    async fn retrieve_user(&self, user_id: &str) -> Result<UserDetails>;
}
