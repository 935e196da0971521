//! Mapping from `OtpError` to HTTP responses
//!
//! Code rejections (no attempt, already used, expired, mismatch) share one
//! 401 body so callers cannot tell them apart. Dependency failures share one
//! 503 body; their detail is only logged.

use actix_web::{http::header, http::StatusCode, HttpResponse};
use otp_core::errors::OtpError;

use crate::dto::ErrorResponse;

pub const INVALID_PHONE_MESSAGE: &str = "Invalid phone number format";
pub const PHONE_REQUIRED_MESSAGE: &str = "Phone number is required";
pub const FIELDS_REQUIRED_MESSAGE: &str = "Phone number and code are required";
pub const INVALID_CODE_MESSAGE: &str = "Invalid or expired code";
pub const THROTTLED_MESSAGE: &str = "Too many requests. Please try again later.";
pub const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable. Please try again.";
pub const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Convert a service error into the response the client sees
pub fn handle_otp_error(error: &OtpError) -> HttpResponse {
    match error {
        OtpError::InvalidPhoneNumber { .. } => {
            ErrorResponse::new(INVALID_PHONE_MESSAGE).to_response(StatusCode::BAD_REQUEST)
        }
        OtpError::Throttled { retry_after_seconds } => HttpResponse::TooManyRequests()
            .insert_header((header::RETRY_AFTER, retry_after_seconds.to_string()))
            .json(ErrorResponse::new(THROTTLED_MESSAGE)),
        OtpError::NotFound | OtpError::AlreadyUsed | OtpError::Expired | OtpError::Mismatch => {
            ErrorResponse::new(INVALID_CODE_MESSAGE).to_response(StatusCode::UNAUTHORIZED)
        }
        OtpError::StorageError { .. }
        | OtpError::GatewayError { .. }
        | OtpError::Timeout { .. }
        | OtpError::SessionError { .. } => {
            log::error!("Request failed on a dependency [{}]: {}", error.code(), error);
            ErrorResponse::new(UNAVAILABLE_MESSAGE).to_response(StatusCode::SERVICE_UNAVAILABLE)
        }
        OtpError::Config { .. } => {
            log::error!("Request failed on configuration: {}", error);
            ErrorResponse::new(INTERNAL_MESSAGE).to_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
