//! Code issuance: validate, rate limit, persist, dispatch
//!
//! A code is always persisted before it is sent, and a failed send never
//! rolls the code back. The caller learns about dispatch problems through
//! [`Dispatch::Failed`], not through an error.

mod config;
mod service;
mod types;

#[cfg(test)]
mod tests;

pub use config::IssuanceConfig;
pub use service::IssuanceService;
pub use types::{Dispatch, IssueOutcome};
