use std::sync::Arc;

use actix_web::{web, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use log::info;

use otp_api::middleware::create_cors;
use otp_api::{create_app, AppState};
use otp_core::services::{JwtSessionEstablisher, RetentionConfig, RetentionSweeper, SessionEstablisher};
use otp_infra::database::{ensure_schema, DatabasePool, MySqlIdentityStore, MySqlOtpStore};
use otp_infra::sms::create_sms_gateway;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger; library crates log through tracing's `log` bridge
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = otp_infra::load_config().context("invalid configuration")?;
    info!("Starting OTP auth API ({})", config.environment);

    let pool = DatabasePool::new(config.database.clone())
        .await
        .context("failed to connect to the database")?;
    if !pool.health_check().await.context("database health check failed")? {
        anyhow::bail!("database health check returned an unexpected value");
    }
    ensure_schema(pool.get_pool()).await.context("failed to create tables")?;
    info!("Database ready: {}", pool.get_statistics());

    let store = Arc::new(MySqlOtpStore::new(pool.get_pool().clone()));
    let identities = Arc::new(MySqlIdentityStore::new(pool.get_pool().clone()));
    let gateway = create_sms_gateway(&config.sms, config.otp.ttl_minutes())
        .context("failed to create SMS gateway")?;
    let sessions: Arc<dyn SessionEstablisher> =
        Arc::new(JwtSessionEstablisher::new(config.session.clone()));

    let state = web::Data::new(AppState::new(
        store.clone(),
        identities,
        gateway,
        sessions,
        &config,
    )?);

    Arc::new(RetentionSweeper::new(
        store,
        RetentionConfig::new(&config.otp, &config.rate_limit),
    ))
    .start_background_task();

    let bind_address = config.server.bind_address();
    info!("Server will bind to: {}", bind_address);

    let server_config = config.server.clone();
    let environment = config.environment;

    HttpServer::new(move || create_app(state.clone(), create_cors(&server_config, environment)))
        .bind(&bind_address)?
        .run()
        .await?;

    pool.close().await;
    Ok(())
}
