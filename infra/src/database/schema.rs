//! Idempotent schema creation

use sqlx::MySqlPool;

use crate::InfrastructureError;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS otp_verifications (
        id CHAR(36) PRIMARY KEY,
        phone_number VARCHAR(16) NOT NULL,
        otp_code VARCHAR(10) NOT NULL,
        issued_at DATETIME(3) NOT NULL,
        expires_at DATETIME(3) NOT NULL,
        consumed BOOLEAN NOT NULL DEFAULT FALSE,
        INDEX idx_otp_phone_issued (phone_number, issued_at)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS otp_issuance_log (
        id BIGINT AUTO_INCREMENT PRIMARY KEY,
        phone_number VARCHAR(16) NOT NULL,
        issued_at DATETIME(3) NOT NULL,
        INDEX idx_issuance_phone_issued (phone_number, issued_at)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS otp_rate_limit_locks (
        phone_number VARCHAR(16) PRIMARY KEY
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS identities (
        id CHAR(36) PRIMARY KEY,
        phone_number VARCHAR(16) NOT NULL UNIQUE,
        created_at DATETIME(3) NOT NULL,
        last_verified_at DATETIME(3) NOT NULL
    )
    "#,
];

/// Create every table the stores need, leaving existing ones alone
pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), InfrastructureError> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("Database schema is up to date");
    Ok(())
}
