//! End-to-end issue and verify flows over the in-memory stores

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};

use otp_core::repositories::{IdentityStore, InMemoryIdentityStore, InMemoryOtpStore, OtpStore};
use otp_core::services::{
    IssuanceConfig, IssuanceService, JwtSessionEstablisher, LedgerRateLimiter, MockSmsGateway,
    VerificationConfig, VerificationService,
};
use otp_core::OtpError;
use otp_shared::config::{RateLimitConfig, SessionConfig};

const PHONE: &str = "+573001234567";

struct Harness {
    store: InMemoryOtpStore,
    identities: InMemoryIdentityStore,
    gateway: MockSmsGateway,
    sessions: Arc<JwtSessionEstablisher>,
    issuance: IssuanceService<InMemoryOtpStore, LedgerRateLimiter<InMemoryOtpStore>, MockSmsGateway>,
    verification: VerificationService<InMemoryOtpStore, InMemoryIdentityStore, JwtSessionEstablisher>,
}

impl Harness {
    fn new() -> Self {
        Self::with_gateway(MockSmsGateway::new())
    }

    fn with_gateway(gateway: MockSmsGateway) -> Self {
        let store = InMemoryOtpStore::new();
        let identities = InMemoryIdentityStore::new();
        let sessions = Arc::new(JwtSessionEstablisher::new(SessionConfig::default()));
        let limiter = LedgerRateLimiter::new(Arc::new(store.clone()), RateLimitConfig::default());

        let issuance = IssuanceService::new(
            Arc::new(store.clone()),
            Arc::new(limiter),
            Arc::new(gateway.clone()),
            IssuanceConfig::default(),
        )
        .expect("valid issuance config");
        let verification = VerificationService::new(
            Arc::new(store.clone()),
            Arc::new(identities.clone()),
            sessions.clone(),
            VerificationConfig::default(),
        );

        Self {
            store,
            identities,
            gateway,
            sessions,
            issuance,
            verification,
        }
    }

    fn code_for(&self, phone: &str) -> String {
        self.gateway.last_code_for(phone).expect("a code was sent")
    }
}

#[tokio::test]
async fn test_issue_then_verify_creates_identity_and_session() {
    let h = Harness::new();

    h.issuance.issue(PHONE).await.unwrap();

    let attempts = h.store.attempts_for(PHONE).await;
    assert_eq!(attempts.len(), 1);
    let attempt = &attempts[0];
    assert!(!attempt.consumed);
    assert_eq!(attempt.code.len(), 6);
    assert!(attempt.code.chars().all(|c| c.is_ascii_digit()));
    let ahead = attempt.expires_at - Utc::now();
    assert!(ahead > ChronoDuration::minutes(4) && ahead <= ChronoDuration::minutes(10));

    let verified = h.verification.verify(PHONE, &h.code_for(PHONE)).await.unwrap();

    assert!(verified.new_identity);
    let identity = h.identities.find_by_phone(PHONE).await.unwrap().unwrap();
    assert_eq!(identity.phone_number, PHONE);
    assert_eq!(identity.id, verified.identity.id);

    let claims = h.sessions.validate(&verified.session.token).unwrap();
    assert_eq!(claims.sub, identity.id.to_string());
}

#[tokio::test]
async fn test_issue_verify_holds_for_many_numbers() {
    let h = Harness::new();
    let phones = ["+12", "+14155552671", "+442071838750", "+861012345678901", "+573001234567"];

    for phone in phones {
        h.issuance.issue(phone).await.unwrap();
        let verified = h.verification.verify(phone, &h.code_for(phone)).await;
        assert!(verified.is_ok(), "{} failed: {:?}", phone, verified);
    }
    assert_eq!(h.identities.len().await, phones.len());
}

#[tokio::test]
async fn test_wrong_code_then_right_code() {
    let h = Harness::new();
    h.issuance.issue(PHONE).await.unwrap();
    let code = h.code_for(PHONE);
    let wrong = if code == "000000" { "111111" } else { "000000" };

    assert_eq!(h.verification.verify(PHONE, wrong).await.unwrap_err(), OtpError::Mismatch);
    assert!(!h.store.find_latest(PHONE).await.unwrap().unwrap().consumed);
    assert!(h.verification.verify(PHONE, &code).await.is_ok());
}

#[tokio::test]
async fn test_code_is_single_use() {
    let h = Harness::new();
    h.issuance.issue(PHONE).await.unwrap();
    let code = h.code_for(PHONE);

    assert!(h.verification.verify(PHONE, &code).await.is_ok());
    assert_eq!(h.verification.verify(PHONE, &code).await.unwrap_err(), OtpError::AlreadyUsed);
}

#[tokio::test]
async fn test_expired_code_is_rejected() {
    let h = Harness::new();
    h.issuance.issue(PHONE).await.unwrap();
    let code = h.code_for(PHONE);
    h.store.backdate(PHONE, ChronoDuration::minutes(5) + ChronoDuration::seconds(1)).await;

    assert_eq!(h.verification.verify(PHONE, &code).await.unwrap_err(), OtpError::Expired);
    assert!(h.identities.is_empty().await);
}

#[tokio::test]
async fn test_reissue_invalidates_old_code() {
    let h = Harness::new();
    h.issuance.issue(PHONE).await.unwrap();
    let old_code = h.code_for(PHONE);
    h.issuance.issue(PHONE).await.unwrap();
    let new_code = h.code_for(PHONE);

    if old_code != new_code {
        assert!(h.verification.verify(PHONE, &old_code).await.is_err());
    }
    assert!(h.verification.verify(PHONE, &new_code).await.is_ok());
}

#[tokio::test]
async fn test_sixth_issue_in_window_is_throttled() {
    let h = Harness::new();

    for _ in 0..5 {
        h.issuance.issue(PHONE).await.unwrap();
    }
    assert!(matches!(
        h.issuance.issue(PHONE).await,
        Err(OtpError::Throttled { .. })
    ));

    // the throttle does not affect the code already outstanding
    assert!(h.verification.verify(PHONE, &h.code_for(PHONE)).await.is_ok());
}

#[tokio::test]
async fn test_failed_dispatch_code_is_still_redeemable() {
    let h = Harness::with_gateway(MockSmsGateway::failing());

    let outcome = h.issuance.issue(PHONE).await.unwrap();
    assert!(!outcome.dispatch.is_sent());

    let code = h.store.find_latest(PHONE).await.unwrap().unwrap().code;
    assert!(h.verification.verify(PHONE, &code).await.is_ok());
}

#[tokio::test]
async fn test_concurrent_verifies_produce_one_session() {
    let h = Arc::new(Harness::new());
    h.issuance.issue(PHONE).await.unwrap();
    let code = h.code_for(PHONE);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let h = h.clone();
        let code = code.clone();
        handles.push(tokio::spawn(async move { h.verification.verify(PHONE, &code).await }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}
