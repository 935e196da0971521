//! Error taxonomy for OTP issuance and verification
//!
//! Every fallible operation in the crate returns [`OtpError`]. Variants fall
//! into three groups:
//!
//! - validation and business-rule rejections the caller may show to the
//!   user ([`OtpError::is_rejection`]),
//! - transient failures the caller may retry ([`OtpError::is_transient`]),
//! - startup configuration errors.

use thiserror::Error;

/// Result type alias for OTP operations
pub type OtpResult<T> = Result<T, OtpError>;

/// Errors produced by the OTP flow
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OtpError {
    /// Phone number is not in E.164 shape. Carries the masked input.
    #[error("Invalid phone number format: {phone}")]
    InvalidPhoneNumber { phone: String },

    /// Too many codes were issued for this phone number recently
    #[error("Too many code requests, retry in {retry_after_seconds} seconds")]
    Throttled { retry_after_seconds: u64 },

    /// Persistent store failed or is unavailable
    #[error("Storage error: {message}")]
    StorageError { message: String },

    /// No verification attempt exists for the phone number
    #[error("No verification attempt found")]
    NotFound,

    /// The most recent attempt was already redeemed
    #[error("Verification code already used")]
    AlreadyUsed,

    /// The most recent attempt is past its expiry
    #[error("Verification code expired")]
    Expired,

    /// The submitted code does not match the stored one
    #[error("Verification code does not match")]
    Mismatch,

    /// SMS dispatch failed; an already persisted code stays valid
    #[error("SMS gateway error: {message}")]
    GatewayError { message: String },

    /// The operation did not finish within its budget
    #[error("{operation} timed out after {after_ms} ms")]
    Timeout {
        operation: &'static str,
        after_ms: u64,
    },

    /// The session establisher could not produce a session
    #[error("Session error: {message}")]
    SessionError { message: String },

    /// Invalid startup configuration
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl OtpError {
    /// Convenience constructor for store failures
    pub fn storage(message: impl Into<String>) -> Self {
        OtpError::StorageError {
            message: message.into(),
        }
    }

    /// Convenience constructor for gateway failures
    pub fn gateway(message: impl Into<String>) -> Self {
        OtpError::GatewayError {
            message: message.into(),
        }
    }

    /// User-facing rejections: safe to report, not worth retrying as-is
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            OtpError::InvalidPhoneNumber { .. }
                | OtpError::Throttled { .. }
                | OtpError::NotFound
                | OtpError::AlreadyUsed
                | OtpError::Expired
                | OtpError::Mismatch
        )
    }

    /// Failures of a dependency; the caller may retry later
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            OtpError::StorageError { .. }
                | OtpError::GatewayError { .. }
                | OtpError::Timeout { .. }
                | OtpError::SessionError { .. }
        )
    }

    /// Rejections a verify call reports with one generic message
    pub fn is_code_rejection(&self) -> bool {
        matches!(
            self,
            OtpError::NotFound | OtpError::AlreadyUsed | OtpError::Expired | OtpError::Mismatch
        )
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            OtpError::InvalidPhoneNumber { .. } => "INVALID_PHONE_NUMBER",
            OtpError::Throttled { .. } => "THROTTLED",
            OtpError::StorageError { .. } => "STORAGE_ERROR",
            OtpError::NotFound => "NOT_FOUND",
            OtpError::AlreadyUsed => "ALREADY_USED",
            OtpError::Expired => "EXPIRED",
            OtpError::Mismatch => "MISMATCH",
            OtpError::GatewayError { .. } => "GATEWAY_ERROR",
            OtpError::Timeout { .. } => "TIMEOUT",
            OtpError::SessionError { .. } => "SESSION_ERROR",
            OtpError::Config { .. } => "CONFIG_ERROR",
        }
    }
}
