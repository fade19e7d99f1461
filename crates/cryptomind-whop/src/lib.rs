//! Whop membership source.
//!
//! Defines the [`MembershipSource`] seam the sync core consumes, the strict
//! conversion from loosely-typed Whop payloads into [`Membership`] and
//! [`UserDetails`], and [`WhopClient`], the REST implementation.

pub mod client;
pub mod profile;
pub mod source;
pub mod types;

pub use client::WhopClient;
pub use profile::extract_profile_picture_url;
pub use source::{MembershipSource, MembershipStream};
pub use types::*;
