use chrono::{Duration, Utc};

use crate::domain::entities::Identity;

#[test]
fn test_new_identity_timestamps() {
    let now = Utc::now();
    let identity = Identity::new("+573001234567", now);

    assert_eq!(identity.phone_number, "+573001234567");
    assert_eq!(identity.created_at, now);
    assert_eq!(identity.last_verified_at, now);
}

#[test]
fn test_record_verification_keeps_created_at() {
    let first = Utc::now();
    let mut identity = Identity::new("+573001234567", first);
    let id = identity.id;

    let later = first + Duration::minutes(30);
    identity.record_verification(later);

    assert_eq!(identity.id, id);
    assert_eq!(identity.created_at, first);
    assert_eq!(identity.last_verified_at, later);
}
