//! MySQL implementation of the OTP store and issuance ledger.
//!
//! Per-phone serialization uses a row in `otp_rate_limit_locks` that is
//! upserted inside a transaction, which leaves the transaction holding an
//! exclusive lock on it. Both the rate limiter's count-then-record and the
//! invalidate-then-insert of a new attempt run under that lock, so
//! concurrent requests for one phone number queue up while other numbers
//! proceed. Lock rows whose ledger records have all been purged are removed
//! by the retention sweep.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySql, MySqlPool, Row, Transaction};
use uuid::Uuid;

use otp_core::domain::entities::VerificationAttempt;
use otp_core::errors::{OtpError, OtpResult};
use otp_core::repositories::{IssuanceLedger, LedgerOutcome, OtpStore};

/// MySQL-backed verification attempts and issuance ledger
#[derive(Clone)]
pub struct MySqlOtpStore {
    pool: MySqlPool,
}

impl MySqlOtpStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> OtpResult<Transaction<'static, MySql>> {
        self.pool.begin().await.map_err(db_error("begin transaction"))
    }

    /// Take the per-phone lock for the rest of the transaction
    ///
    /// A single upsert both creates a missing row and locks an existing one,
    /// so a row deleted by the sweep in between cannot be observed.
    async fn lock_phone(tx: &mut Transaction<'static, MySql>, phone_number: &str) -> OtpResult<()> {
        sqlx::query(
            "INSERT INTO otp_rate_limit_locks (phone_number) VALUES (?) \
             ON DUPLICATE KEY UPDATE phone_number = VALUES(phone_number)",
        )
        .bind(phone_number)
        .execute(&mut **tx)
        .await
        .map_err(db_error("acquire phone lock"))?;

        Ok(())
    }

    fn row_to_attempt(row: &sqlx::mysql::MySqlRow) -> OtpResult<VerificationAttempt> {
        let id: String = row.try_get("id").map_err(db_error("read id"))?;

        Ok(VerificationAttempt {
            id: Uuid::parse_str(&id)
                .map_err(|e| OtpError::storage(format!("Invalid attempt UUID: {}", e)))?,
            phone_number: row.try_get("phone_number").map_err(db_error("read phone_number"))?,
            code: row.try_get("otp_code").map_err(db_error("read otp_code"))?,
            issued_at: row.try_get::<DateTime<Utc>, _>("issued_at").map_err(db_error("read issued_at"))?,
            expires_at: row.try_get::<DateTime<Utc>, _>("expires_at").map_err(db_error("read expires_at"))?,
            consumed: row.try_get("consumed").map_err(db_error("read consumed"))?,
        })
    }
}

/// Map a SQLx error to `StorageError`, naming the failed step
fn db_error(step: &'static str) -> impl Fn(sqlx::Error) -> OtpError {
    move |e| OtpError::storage(format!("Failed to {}: {}", step, e))
}

const DELETE_OUTSTANDING: &str = "DELETE FROM otp_verifications WHERE phone_number = ? AND consumed = FALSE";

const INSERT_ATTEMPT: &str = r#"
    INSERT INTO otp_verifications (id, phone_number, otp_code, issued_at, expires_at, consumed)
    VALUES (?, ?, ?, ?, ?, ?)
"#;

#[async_trait]
impl OtpStore for MySqlOtpStore {
    async fn invalidate_outstanding(&self, phone_number: &str) -> OtpResult<u64> {
        let result = sqlx::query(DELETE_OUTSTANDING)
            .bind(phone_number)
            .execute(&self.pool)
            .await
            .map_err(db_error("invalidate outstanding attempts"))?;
        Ok(result.rows_affected())
    }

    async fn insert(&self, attempt: &VerificationAttempt) -> OtpResult<()> {
        sqlx::query(INSERT_ATTEMPT)
            .bind(attempt.id.to_string())
            .bind(&attempt.phone_number)
            .bind(&attempt.code)
            .bind(attempt.issued_at)
            .bind(attempt.expires_at)
            .bind(attempt.consumed)
            .execute(&self.pool)
            .await
            .map_err(db_error("insert attempt"))?;
        Ok(())
    }

    async fn replace_outstanding(&self, attempt: &VerificationAttempt) -> OtpResult<u64> {
        let mut tx = self.begin().await?;
        Self::lock_phone(&mut tx, &attempt.phone_number).await?;

        let removed = sqlx::query(DELETE_OUTSTANDING)
            .bind(&attempt.phone_number)
            .execute(&mut *tx)
            .await
            .map_err(db_error("invalidate outstanding attempts"))?
            .rows_affected();

        sqlx::query(INSERT_ATTEMPT)
            .bind(attempt.id.to_string())
            .bind(&attempt.phone_number)
            .bind(&attempt.code)
            .bind(attempt.issued_at)
            .bind(attempt.expires_at)
            .bind(attempt.consumed)
            .execute(&mut *tx)
            .await
            .map_err(db_error("insert attempt"))?;

        tx.commit().await.map_err(db_error("commit attempt"))?;
        Ok(removed)
    }

    async fn find_latest(&self, phone_number: &str) -> OtpResult<Option<VerificationAttempt>> {
        let query = r#"
            SELECT id, phone_number, otp_code, issued_at, expires_at, consumed
            FROM otp_verifications
            WHERE phone_number = ?
            ORDER BY issued_at DESC
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(phone_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetch latest attempt"))?;

        row.as_ref().map(Self::row_to_attempt).transpose()
    }

    async fn consume(&self, id: Uuid) -> OtpResult<bool> {
        let result = sqlx::query("UPDATE otp_verifications SET consumed = TRUE WHERE id = ? AND consumed = FALSE")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error("consume attempt"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn release(&self, id: Uuid) -> OtpResult<bool> {
        let result = sqlx::query("UPDATE otp_verifications SET consumed = FALSE WHERE id = ? AND consumed = TRUE")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error("release attempt"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> OtpResult<u64> {
        let result = sqlx::query("DELETE FROM otp_verifications WHERE expires_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(db_error("purge expired attempts"))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl IssuanceLedger for MySqlOtpStore {
    async fn record_if_below(
        &self,
        phone_number: &str,
        now: DateTime<Utc>,
        window_start: DateTime<Utc>,
        limit: u32,
    ) -> OtpResult<LedgerOutcome> {
        let mut tx = self.begin().await?;
        Self::lock_phone(&mut tx, phone_number).await?;

        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS issued, MIN(issued_at) AS oldest
            FROM otp_issuance_log
            WHERE phone_number = ? AND issued_at > ?
            "#,
        )
        .bind(phone_number)
        .bind(window_start)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("count issuance records"))?;

        let issued: i64 = row.try_get("issued").map_err(db_error("read issuance count"))?;
        let oldest: Option<DateTime<Utc>> = row.try_get("oldest").map_err(db_error("read oldest issuance"))?;
        let count = u32::try_from(issued).unwrap_or(u32::MAX);

        if count >= limit {
            // nothing written; roll back to release the lock
            tx.rollback().await.map_err(db_error("release phone lock"))?;
            return Ok(LedgerOutcome::LimitReached { count, oldest });
        }

        sqlx::query("INSERT INTO otp_issuance_log (phone_number, issued_at) VALUES (?, ?)")
            .bind(phone_number)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_error("record issuance"))?;

        tx.commit().await.map_err(db_error("commit issuance"))?;
        Ok(LedgerOutcome::Recorded { count: count + 1 })
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> OtpResult<u64> {
        let result = sqlx::query("DELETE FROM otp_issuance_log WHERE issued_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(db_error("purge issuance records"))?;

        // Phones with no ledger rows left no longer need a lock row
        let locks = sqlx::query(
            r#"
            DELETE FROM otp_rate_limit_locks
            WHERE NOT EXISTS (
                SELECT 1 FROM otp_issuance_log
                WHERE otp_issuance_log.phone_number = otp_rate_limit_locks.phone_number
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_error("purge phone locks"))?;

        tracing::debug!(
            locks_removed = locks.rows_affected(),
            "Purged idle phone lock rows"
        );
        Ok(result.rows_affected())
    }
}
