//! CORS middleware configuration for cross-origin requests.
//!
//! Development accepts any origin so local frontends and tools work without
//! setup. Production only accepts the origins listed in `ALLOWED_ORIGINS`.
//! Both allow credentials so the session cookie set by verify-otp is kept
//! by the browser.

use actix_cors::Cors;
use actix_web::http::{header, Method};

use otp_shared::config::{Environment, ServerConfig};

/// Creates a CORS middleware instance for the given environment
pub fn create_cors(server: &ServerConfig, environment: Environment) -> Cors {
    if environment.is_production() {
        create_production_cors(server)
    } else {
        create_development_cors(server)
    }
}

fn base_cors(server: &ServerConfig) -> Cors {
    Cors::default()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE, header::ORIGIN])
        .expose_headers(vec![header::RETRY_AFTER])
        .max_age(server.cors_max_age)
        .supports_credentials()
}

fn create_development_cors(server: &ServerConfig) -> Cors {
    log::info!("Configuring CORS for development environment");

    base_cors(server).allow_any_origin()
}

fn create_production_cors(server: &ServerConfig) -> Cors {
    log::info!("Configuring CORS for production environment");

    if server.allowed_origins.is_empty() {
        log::warn!("ALLOWED_ORIGINS is empty; cross-origin requests will be rejected");
    }

    server
        .allowed_origins
        .iter()
        .fold(base_cors(server), |cors, origin| {
            log::info!("Adding allowed origin: {}", origin);
            cors.allowed_origin(origin)
        })
}
