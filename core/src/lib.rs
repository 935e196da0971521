//! # OTP Core
//!
//! Domain layer for phone number authentication with one-time passcodes.
//! This crate contains the verification attempt and identity entities, the
//! store contracts with in-memory implementations, and the issuance and
//! verification services. Database and SMS provider implementations live in
//! `otp_infra`.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
