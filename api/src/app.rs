//! Application factory
//!
//! Builds the Actix-web application around an [`AppState`]. The binary and
//! the HTTP tests share this so both see the same routes and middleware.

use actix_cors::Cors;
use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    error::InternalError,
    middleware::Logger,
    web, App, Error, HttpResponse,
};

use otp_core::repositories::{IdentityStore, IssuanceLedger, OtpStore};

use crate::dto::ErrorResponse;
use crate::routes::auth::{send_otp, verify_otp, AppState};

const SERVICE_NAME: &str = "otp-auth-api";

/// Register the routes on an app or scope
pub fn configure<S, I>(cfg: &mut web::ServiceConfig)
where
    S: OtpStore + IssuanceLedger + 'static,
    I: IdentityStore + 'static,
{
    cfg.route("/health", web::get().to(health_check)).service(
        web::scope("/api/v1/auth")
            .route("/send-otp", web::post().to(send_otp::<S, I>))
            .route("/verify-otp", web::post().to(verify_otp::<S, I>)),
    );
}

/// Malformed JSON bodies answer 400 with the usual error shape
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("Rejected request body: {}", err);
        let response = HttpResponse::BadRequest().json(ErrorResponse::new("Invalid request body"));
        InternalError::from_response(err, response).into()
    })
}

/// Create and configure the application with all dependencies
pub fn create_app<S, I>(
    app_state: web::Data<AppState<S, I>>,
    cors: Cors,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
>
where
    S: OtpStore + IssuanceLedger + 'static,
    I: IdentityStore + 'static,
{
    App::new()
        .app_data(app_state)
        .app_data(json_config())
        .wrap(cors)
        .wrap(Logger::default())
        .configure(configure::<S, I>)
        .default_service(web::route().to(not_found))
}

/// Health check endpoint handler
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new("The requested resource was not found"))
}
