//! Code verification and session establishment
//!
//! Checks run in a fixed order (not found, already used, expired,
//! mismatch) so the reported rejection is deterministic. A mismatch never
//! mutates the stored attempt.

mod config;
mod service;
mod types;


pub use config::VerificationConfig;
pub use service::VerificationService;
pub use types::VerifiedSession;
