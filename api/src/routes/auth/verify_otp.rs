use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{http::StatusCode, web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use otp_core::domain::entities::SessionToken;
use otp_core::repositories::{IdentityStore, IssuanceLedger, OtpStore};
use otp_shared::config::SessionConfig;
use otp_shared::phone::mask_phone;

use crate::dto::{ErrorResponse, VerifyOtpRequest, VerifyOtpResponse};
use crate::handlers::error::{handle_otp_error, FIELDS_REQUIRED_MESSAGE};

use super::AppState;

/// Build the HttpOnly session cookie for a freshly issued session
fn session_cookie(config: &SessionConfig, session: &SessionToken) -> Cookie<'static> {
    Cookie::build(config.cookie_name.clone(), session.token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(CookieDuration::seconds(session.max_age_seconds(Utc::now())))
        .finish()
}

/// Handler for POST /api/v1/auth/verify-otp
///
/// # Request Body
///
/// ```json
/// { "phoneNumber": "+573001234567", "code": "042137" }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// { "success": true, "redirectTo": "/dashboard" }
/// ```
/// plus a `Set-Cookie` header carrying the session token.
///
/// ## Errors
/// - 400 Bad Request: missing fields or malformed phone number
/// - 401 Unauthorized: wrong, expired, used or unknown code (one message)
/// - 503 Service Unavailable: store or session failure, timeout
pub async fn verify_otp<S, I>(
    state: web::Data<AppState<S, I>>,
    request: web::Json<VerifyOtpRequest>,
) -> HttpResponse
where
    S: OtpStore + IssuanceLedger + 'static,
    I: IdentityStore + 'static,
{
    if request.validate().is_err() {
        return ErrorResponse::new(FIELDS_REQUIRED_MESSAGE).to_response(StatusCode::BAD_REQUEST);
    }

    match state
        .verification
        .verify(&request.phone_number, &request.code)
        .await
    {
        Ok(verified) => {
            log::info!(
                "Phone {} verified (identity {}, new: {})",
                mask_phone(&verified.identity.phone_number),
                verified.identity.id,
                verified.new_identity
            );

            HttpResponse::Ok()
                .cookie(session_cookie(&state.session, &verified.session))
                .json(VerifyOtpResponse {
                    success: true,
                    redirect_to: state.session.redirect_to.clone(),
                })
        }
        Err(error) => handle_otp_error(&error),
    }
}
