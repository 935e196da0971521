//! Shared configuration and utilities for the OTP authentication service
//!
//! This crate provides functionality used across all server modules:
//! - Configuration types and environment loading
//! - Phone number helpers (E.164 validation, log masking)

pub mod config;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, DatabaseConfig, Environment, OtpConfig, RateLimitConfig, ServerConfig,
    SessionConfig, SmsConfig, SmsProvider,
};
pub use utils::phone;
