//! # Infrastructure Layer
//!
//! Concrete implementations of the `otp_core` contracts:
//! - **Database**: MySQL stores for verification attempts, the issuance
//!   ledger and identities, using SQLx
//! - **SMS**: Brevo and Twilio REST gateways, a console gateway for
//!   development and a failover combinator

use otp_core::errors::OtpError;
use otp_shared::config::AppConfig;

/// Database module - MySQL implementations using SQLx
pub mod database;

/// SMS gateway module - external SMS providers
pub mod sms;

/// Load the application configuration from the environment
///
/// Reads a `.env` file first when one is present, then validates the
/// result.
pub fn load_config() -> Result<AppConfig, InfrastructureError> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().map_err(InfrastructureError::Config)?;
    config.validate().map_err(InfrastructureError::Config)?;
    Ok(config)
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection or query error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// SMS provider rejected or failed a request
    #[error("SMS service error: {0}")]
    Sms(String),
}

impl From<InfrastructureError> for OtpError {
    fn from(error: InfrastructureError) -> Self {
        match error {
            InfrastructureError::Database(e) => OtpError::storage(e.to_string()),
            InfrastructureError::Http(e) => OtpError::gateway(e.to_string()),
            InfrastructureError::Sms(message) => OtpError::gateway(message),
            InfrastructureError::Config(message) => OtpError::Config { message },
        }
    }
}
