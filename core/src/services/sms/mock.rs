//! Scriptable SMS gateway for tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::errors::{OtpError, OtpResult};

use super::traits::{DeliveryStatus, DispatchReceipt, SmsGateway};

/// Gateway that records messages instead of sending them
///
/// Clones share recorded messages and scripted behavior.
#[derive(Clone, Default)]
pub struct MockSmsGateway {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    statuses: Arc<Mutex<VecDeque<DeliveryStatus>>>,
    status_calls: Arc<AtomicU32>,
    should_fail: Arc<AtomicBool>,
    delay: Option<Duration>,
}

impl MockSmsGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway whose sends always fail
    pub fn failing() -> Self {
        let gateway = Self::new();
        gateway.set_should_fail(true);
        gateway
    }

    /// Sleep this long inside every send
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Statuses returned by successive `delivery_status` calls; `Unknown`
    /// once exhausted
    pub fn with_statuses(self, statuses: Vec<DeliveryStatus>) -> Self {
        if let Ok(mut queue) = self.statuses.lock() {
            queue.extend(statuses);
        }
        self
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Messages accepted so far as `(phone, code)` pairs
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Most recent code sent to `phone_number`
    pub fn last_code_for(&self, phone_number: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|(phone, _)| phone == phone_number)
            .map(|(_, code)| code)
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SmsGateway for MockSmsGateway {
    async fn send(&self, phone_number: &str, code: &str) -> OtpResult<DispatchReceipt> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(OtpError::gateway("mock gateway configured to fail"));
        }

        self.sent
            .lock()
            .map_err(|_| OtpError::gateway("mock gateway state poisoned"))?
            .push((phone_number.to_string(), code.to_string()));

        Ok(DispatchReceipt {
            message_id: format!("mock-{}", Uuid::new_v4()),
            provider: self.provider_name().to_string(),
        })
    }

    async fn delivery_status(&self, _message_id: &str) -> OtpResult<DeliveryStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .statuses
            .lock()
            .map_err(|_| OtpError::gateway("mock gateway state poisoned"))?
            .pop_front();
        Ok(next.unwrap_or(DeliveryStatus::Unknown))
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
