//! MySQL implementation of the identity store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use otp_core::domain::entities::Identity;
use otp_core::errors::{OtpError, OtpResult};
use otp_core::repositories::{IdentityStore, IdentityUpsert};

/// MySQL-backed identities keyed by phone number
#[derive(Clone)]
pub struct MySqlIdentityStore {
    pool: MySqlPool,
}

impl MySqlIdentityStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_identity(row: &sqlx::mysql::MySqlRow) -> OtpResult<Identity> {
        let id: String = row
            .try_get("id")
            .map_err(|e| OtpError::storage(format!("Failed to get id: {}", e)))?;

        Ok(Identity {
            id: Uuid::parse_str(&id)
                .map_err(|e| OtpError::storage(format!("Invalid identity UUID: {}", e)))?,
            phone_number: row
                .try_get("phone_number")
                .map_err(|e| OtpError::storage(format!("Failed to get phone_number: {}", e)))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| OtpError::storage(format!("Failed to get created_at: {}", e)))?,
            last_verified_at: row
                .try_get::<DateTime<Utc>, _>("last_verified_at")
                .map_err(|e| OtpError::storage(format!("Failed to get last_verified_at: {}", e)))?,
        })
    }
}

#[async_trait]
impl IdentityStore for MySqlIdentityStore {
    async fn upsert_verified(
        &self,
        phone_number: &str,
        verified_at: DateTime<Utc>,
    ) -> OtpResult<IdentityUpsert> {
        let candidate = Identity::new(phone_number, verified_at);

        let query = r#"
            INSERT INTO identities (id, phone_number, created_at, last_verified_at)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE last_verified_at = VALUES(last_verified_at)
        "#;

        sqlx::query(query)
            .bind(candidate.id.to_string())
            .bind(phone_number)
            .bind(verified_at)
            .bind(verified_at)
            .execute(&self.pool)
            .await
            .map_err(|e| OtpError::storage(format!("Failed to upsert identity: {}", e)))?;

        let identity = self
            .find_by_phone(phone_number)
            .await?
            .ok_or_else(|| OtpError::storage("Identity missing after upsert"))?;

        // our generated id only sticks when the row was new
        let created = identity.id == candidate.id;
        Ok(IdentityUpsert { identity, created })
    }

    async fn find_by_phone(&self, phone_number: &str) -> OtpResult<Option<Identity>> {
        let query = r#"
            SELECT id, phone_number, created_at, last_verified_at
            FROM identities
            WHERE phone_number = ?
        "#;

        let row = sqlx::query(query)
            .bind(phone_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| OtpError::storage(format!("Failed to find identity: {}", e)))?;

        row.as_ref().map(Self::row_to_identity).transpose()
    }
}
