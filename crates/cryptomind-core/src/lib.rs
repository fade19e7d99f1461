//! CryptoMind core types: configuration, membership statuses, and the error type.

pub mod config;
pub mod error;
pub mod status;

pub use config::{CryptoMindConfig, DataPaths, SyncSettings, WhopSettings};
pub use error::{Error, Result};
pub use status::MembershipStatus;
