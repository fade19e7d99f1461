//! CryptoMind store: persistence for synced members and commission payments.

pub mod schema;
pub mod sqlite;
pub mod store;
pub mod types;

pub use sqlite::SqliteStore;
pub use store::MemberStore;
pub use types::*;
