//! In-memory identity store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::Identity;
use crate::errors::{OtpError, OtpResult};

use super::trait_::{IdentityStore, IdentityUpsert};

/// Identity store keyed by phone number
#[derive(Clone, Default)]
pub struct InMemoryIdentityStore {
    identities: Arc<RwLock<HashMap<String, Identity>>>,
    should_fail: Arc<AtomicBool>,
}

impl InMemoryIdentityStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already knows `identity`
    pub fn with_identity(identity: Identity) -> Self {
        let mut map = HashMap::new();
        map.insert(identity.phone_number.clone(), identity);
        Self {
            identities: Arc::new(RwLock::new(map)),
            should_fail: Arc::default(),
        }
    }

    /// Make every subsequent operation fail with `StorageError`
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Number of stored identities
    pub async fn len(&self) -> usize {
        self.identities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_available(&self) -> OtpResult<()> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(OtpError::storage("in-memory identity store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn upsert_verified(
        &self,
        phone_number: &str,
        verified_at: DateTime<Utc>,
    ) -> OtpResult<IdentityUpsert> {
        self.check_available()?;
        let mut identities = self.identities.write().await;

        match identities.get_mut(phone_number) {
            Some(identity) => {
                identity.record_verification(verified_at);
                Ok(IdentityUpsert {
                    identity: identity.clone(),
                    created: false,
                })
            }
            None => {
                let identity = Identity::new(phone_number, verified_at);
                identities.insert(phone_number.to_string(), identity.clone());
                Ok(IdentityUpsert {
                    identity,
                    created: true,
                })
            }
        }
    }

    async fn find_by_phone(&self, phone_number: &str) -> OtpResult<Option<Identity>> {
        self.check_available()?;
        Ok(self.identities.read().await.get(phone_number).cloned())
    }
}
