//! Bounded delivery status polling with exponential backoff

use std::time::Duration;

use super::traits::{DeliveryStatus, SmsGateway};

/// How often and how patiently to poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Total number of status requests
    pub max_attempts: u32,
    /// Delay before the second request; doubled after each further one
    pub initial_delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
        }
    }
}

/// Poll a gateway until the message settles or the attempts run out
///
/// Returns the first settled status, or the last status observed when the
/// budget is exhausted. A gateway reporting `Unknown` does not track
/// status, so polling stops right away. Errors are logged and count as an
/// attempt. The loop always terminates after `policy.max_attempts` calls.
pub async fn poll_delivery_status<G>(gateway: &G, message_id: &str, policy: PollPolicy) -> DeliveryStatus
where
    G: SmsGateway + ?Sized,
{
    let mut last = DeliveryStatus::Unknown;
    let mut delay = policy.initial_delay;

    for attempt in 1..=policy.max_attempts {
        match gateway.delivery_status(message_id).await {
            Ok(DeliveryStatus::Unknown) => return DeliveryStatus::Unknown,
            Ok(status) if status.is_settled() => {
                tracing::debug!(
                    message_id = message_id,
                    attempt = attempt,
                    status = ?status,
                    "Delivery status settled"
                );
                return status;
            }
            Ok(status) => last = status,
            Err(e) => {
                tracing::warn!(
                    message_id = message_id,
                    attempt = attempt,
                    error = %e,
                    "Delivery status poll failed"
                );
            }
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(delay).await;
            delay *= 2;
        }
    }

    last
}
