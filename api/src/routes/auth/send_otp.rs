use actix_web::{http::StatusCode, web, HttpResponse};
use validator::Validate;

use otp_core::repositories::{IdentityStore, IssuanceLedger, OtpStore};
use otp_shared::phone::mask_phone;

use crate::dto::{ErrorResponse, SendOtpRequest, SendOtpResponse};
use crate::handlers::error::{handle_otp_error, PHONE_REQUIRED_MESSAGE};

use super::AppState;

/// Handler for POST /api/v1/auth/send-otp
///
/// # Request Body
///
/// ```json
/// { "phoneNumber": "+573001234567" }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// { "success": true }
/// ```
/// In development the code is echoed as `"otp"`.
///
/// A failed SMS dispatch still answers 200: the code is stored and can be
/// redeemed, and the client may request a new one.
///
/// ## Errors
/// - 400 Bad Request: missing or malformed phone number
/// - 429 Too Many Requests: issuance limit reached, with `Retry-After`
/// - 503 Service Unavailable: store unavailable or timeout
pub async fn send_otp<S, I>(
    state: web::Data<AppState<S, I>>,
    request: web::Json<SendOtpRequest>,
) -> HttpResponse
where
    S: OtpStore + IssuanceLedger + 'static,
    I: IdentityStore + 'static,
{
    if request.validate().is_err() {
        return ErrorResponse::new(PHONE_REQUIRED_MESSAGE).to_response(StatusCode::BAD_REQUEST);
    }

    log::info!(
        "Processing send_otp request for phone: {}",
        mask_phone(request.phone_number.trim())
    );

    match state.issuance.issue(&request.phone_number).await {
        Ok(outcome) => {
            if !outcome.dispatch.is_sent() {
                log::warn!(
                    "Code for {} stored but SMS dispatch failed",
                    mask_phone(&outcome.phone_number)
                );
            }

            HttpResponse::Ok().json(SendOtpResponse {
                success: true,
                otp: outcome.dev_code,
            })
        }
        Err(error) => {
            log::warn!(
                "send_otp rejected for phone: {} [{}]",
                mask_phone(request.phone_number.trim()),
                error.code()
            );
            handle_otp_error(&error)
        }
    }
}
