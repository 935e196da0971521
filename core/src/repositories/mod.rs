//! Persistence contracts and in-memory implementations.
//!
//! The MySQL implementations live in `otp_infra`; the in-memory ones here
//! back the test suites and local runs without a database.

pub mod identity;
pub mod otp;

pub use identity::{IdentityStore, IdentityUpsert, InMemoryIdentityStore};
pub use otp::{InMemoryOtpStore, IssuanceLedger, LedgerOutcome, OtpStore};
