//! Database module - MySQL implementations using SQLx
//!
//! - Connection pool management
//! - Idempotent schema creation
//! - Store implementations for attempts, the issuance ledger and identities

pub mod connection;
pub mod mysql;
pub mod schema;

// Re-export commonly used types
pub use connection::{DatabasePool, PoolStatistics};
pub use mysql::{MySqlIdentityStore, MySqlOtpStore};
pub use schema::ensure_schema;
