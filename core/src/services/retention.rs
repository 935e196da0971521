//! Retention sweep for spent verification attempts and old ledger rows
//!
//! Runs only deletes bounded by timestamps well in the past, so it never
//! races with an outstanding attempt or a record still inside the rate
//! limit window.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

use otp_shared::config::{OtpConfig, RateLimitConfig};

use crate::repositories::{IssuanceLedger, OtpStore};

/// Configuration for the retention sweeper
#[derive(Debug, Clone)]
pub struct RetentionConfig {
    /// Keep expired attempts this long before deleting them
    pub retention_seconds: u64,
    /// Rate limit window; ledger rows inside it are never removed
    pub window_seconds: u64,
    /// How often the background task runs (0 disables it)
    pub interval_seconds: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self::new(&OtpConfig::default(), &RateLimitConfig::default())
    }
}

impl RetentionConfig {
    pub fn new(otp: &OtpConfig, rate_limit: &RateLimitConfig) -> Self {
        Self {
            retention_seconds: otp.retention_seconds,
            window_seconds: rate_limit.window_seconds,
            interval_seconds: otp.sweep_interval_seconds,
        }
    }
}

/// Periodically deletes expired attempts and stale issuance records
pub struct RetentionSweeper<S: OtpStore + IssuanceLedger + 'static> {
    store: Arc<S>,
    config: RetentionConfig,
}

impl<S: OtpStore + IssuanceLedger + 'static> RetentionSweeper<S> {
    pub fn new(store: Arc<S>, config: RetentionConfig) -> Self {
        Self { store, config }
    }

    /// Run a single sweep
    ///
    /// Failures of one step are collected in the result and do not stop
    /// the other step.
    pub async fn run_sweep(&self) -> SweepResult {
        let now = Utc::now();
        let mut result = SweepResult::default();

        let attempt_cutoff = now - seconds(self.config.retention_seconds);
        match self.store.purge_expired(attempt_cutoff).await {
            Ok(count) => result.attempts_deleted = count,
            Err(e) => {
                error!(error = %e, event = "retention_sweep_failed", "Failed to purge expired attempts");
                result.errors.push(format!("Attempt purge error: {}", e));
            }
        }

        let ledger_cutoff =
            now - seconds(self.config.retention_seconds.max(self.config.window_seconds));
        match self.store.purge_before(ledger_cutoff).await {
            Ok(count) => result.ledger_entries_deleted = count,
            Err(e) => {
                error!(error = %e, event = "retention_sweep_failed", "Failed to purge issuance ledger");
                result.errors.push(format!("Ledger purge error: {}", e));
            }
        }

        info!(
            attempts_deleted = result.attempts_deleted,
            ledger_entries_deleted = result.ledger_entries_deleted,
            event = "retention_sweep",
            "Retention sweep completed"
        );

        result
    }

    /// Spawn the periodic sweep on the current tokio runtime
    pub fn start_background_task(self: Arc<Self>) {
        if self.config.interval_seconds == 0 {
            warn!("Retention sweep is disabled");
            return;
        }

        let period = std::time::Duration::from_secs(self.config.interval_seconds);

        tokio::spawn(async move {
            info!(
                "Retention sweeper started - will run every {} seconds",
                self.config.interval_seconds
            );

            let mut timer = tokio::time::interval(period);
            loop {
                timer.tick().await;
                let result = self.run_sweep().await;
                if !result.is_success() {
                    warn!("Retention sweep completed with errors: {:?}", result.errors);
                }
            }
        });
    }
}

fn seconds(value: u64) -> Duration {
    Duration::seconds(value.min(u32::MAX as u64) as i64)
}

/// Result of a sweep
#[derive(Debug, Default)]
pub struct SweepResult {
    /// Expired attempts removed
    pub attempts_deleted: u64,
    /// Issuance records removed
    pub ledger_entries_deleted: u64,
    /// Errors encountered along the way
    pub errors: Vec<String>,
}

impl SweepResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn total_deleted(&self) -> u64 {
        self.attempts_deleted + self.ledger_entries_deleted
    }
}
