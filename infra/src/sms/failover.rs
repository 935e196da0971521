//! Failover SMS gateway
//!
//! Sends through a primary gateway and falls back to a backup one when the
//! primary fails. After a primary failure the primary is skipped until
//! `failover_timeout` has passed, then tried again.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use otp_core::errors::{OtpError, OtpResult};
use otp_core::services::sms::{DeliveryStatus, DispatchReceipt, SmsGateway};

/// Default time before a failed primary is tried again
pub const DEFAULT_FAILOVER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
struct FailoverState {
    /// When the primary last failed, if it has not recovered since
    last_primary_failure: Option<Instant>,
    /// Consecutive primary failures
    primary_failure_count: u32,
}

/// Gateway that falls back from a primary to a backup provider
pub struct FailoverSmsGateway {
    primary: Arc<dyn SmsGateway>,
    backup: Arc<dyn SmsGateway>,
    state: RwLock<FailoverState>,
    failover_timeout: Duration,
}

impl FailoverSmsGateway {
    pub fn new(primary: Arc<dyn SmsGateway>, backup: Arc<dyn SmsGateway>, failover_timeout: Duration) -> Self {
        info!(
            "Initializing failover SMS gateway with {} (primary) and {} (backup)",
            primary.provider_name(),
            backup.provider_name()
        );

        Self {
            primary,
            backup,
            state: RwLock::new(FailoverState::default()),
            failover_timeout,
        }
    }

    async fn should_try_primary(&self) -> bool {
        match self.state.read().await.last_primary_failure {
            Some(failed_at) => failed_at.elapsed() >= self.failover_timeout,
            None => true,
        }
    }

    async fn record_primary_failure(&self) {
        let mut state = self.state.write().await;
        state.primary_failure_count += 1;
        state.last_primary_failure = Some(Instant::now());
        warn!(
            failures = state.primary_failure_count,
            "Primary SMS gateway ({}) failed, switching to backup ({})",
            self.primary.provider_name(),
            self.backup.provider_name()
        );
    }

    async fn record_primary_success(&self) {
        let mut state = self.state.write().await;
        if state.last_primary_failure.is_some() {
            info!("Primary SMS gateway ({}) recovered", self.primary.provider_name());
        }
        *state = FailoverState::default();
    }
}

#[async_trait]
impl SmsGateway for FailoverSmsGateway {
    async fn send(&self, phone_number: &str, code: &str) -> OtpResult<DispatchReceipt> {
        let mut primary_error = None;

        if self.should_try_primary().await {
            match self.primary.send(phone_number, code).await {
                Ok(receipt) => {
                    self.record_primary_success().await;
                    return Ok(receipt);
                }
                Err(e) => {
                    self.record_primary_failure().await;
                    primary_error = Some(e);
                }
            }
        }

        match self.backup.send(phone_number, code).await {
            Ok(receipt) => Ok(receipt),
            Err(backup_error) => {
                error!(
                    "Backup SMS gateway ({}) also failed: {}",
                    self.backup.provider_name(),
                    backup_error
                );
                let primary = primary_error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "skipped".to_string());
                Err(OtpError::gateway(format!(
                    "all SMS gateways failed. {}: {}; {}: {}",
                    self.primary.provider_name(),
                    primary,
                    self.backup.provider_name(),
                    backup_error
                )))
            }
        }
    }

    /// Ask the primary first; the backup answers when the primary does not
    /// know the message
    async fn delivery_status(&self, message_id: &str) -> OtpResult<DeliveryStatus> {
        match self.primary.delivery_status(message_id).await {
            Ok(DeliveryStatus::Unknown) | Err(_) => self.backup.delivery_status(message_id).await,
            known => known,
        }
    }

    fn provider_name(&self) -> &str {
        "failover"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use otp_core::services::sms::MockSmsGateway;

    fn failover(primary: &MockSmsGateway, backup: &MockSmsGateway, timeout: Duration) -> FailoverSmsGateway {
        FailoverSmsGateway::new(Arc::new(primary.clone()), Arc::new(backup.clone()), timeout)
    }

    #[tokio::test]
    async fn test_uses_primary_when_healthy() {
        let primary = MockSmsGateway::new();
        let backup = MockSmsGateway::new();
        let gateway = failover(&primary, &backup, DEFAULT_FAILOVER_TIMEOUT);

        gateway.send("+573001234567", "123456").await.unwrap();

        assert_eq!(primary.sent().len(), 1);
        assert!(backup.sent().is_empty());
    }

    #[tokio::test]
    async fn test_falls_back_and_skips_primary_during_timeout() {
        let primary = MockSmsGateway::failing();
        let backup = MockSmsGateway::new();
        let gateway = failover(&primary, &backup, DEFAULT_FAILOVER_TIMEOUT);

        gateway.send("+573001234567", "111111").await.unwrap();
        primary.set_should_fail(false);
        gateway.send("+573001234567", "222222").await.unwrap();

        assert!(primary.sent().is_empty());
        assert_eq!(backup.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_primary_retried_after_timeout() {
        let primary = MockSmsGateway::failing();
        let backup = MockSmsGateway::new();
        let gateway = failover(&primary, &backup, Duration::ZERO);

        gateway.send("+573001234567", "111111").await.unwrap();
        primary.set_should_fail(false);
        gateway.send("+573001234567", "222222").await.unwrap();

        assert_eq!(primary.last_code_for("+573001234567").as_deref(), Some("222222"));
    }

    #[tokio::test]
    async fn test_both_failing_is_gateway_error() {
        let gateway = failover(
            &MockSmsGateway::failing(),
            &MockSmsGateway::failing(),
            DEFAULT_FAILOVER_TIMEOUT,
        );

        assert!(matches!(
            gateway.send("+573001234567", "123456").await,
            Err(OtpError::GatewayError { .. })
        ));
    }

    #[tokio::test]
    async fn test_status_falls_through_to_backup() {
        let primary = MockSmsGateway::new();
        let backup = MockSmsGateway::new().with_statuses(vec![DeliveryStatus::Delivered]);
        let gateway = failover(&primary, &backup, DEFAULT_FAILOVER_TIMEOUT);

        assert_eq!(
            gateway.delivery_status("SM123").await.unwrap(),
            DeliveryStatus::Delivered
        );
    }
}
