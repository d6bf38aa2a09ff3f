//! Tests for the atomic account transaction, run directly against a
//! real SQLite connection. Every failure path must leave the database
//! exactly as it found it.

mod common;

use evermore::db::queries::{create_account_from_payment, ProvisionTxError};

use common::*;

#[test]
fn success_creates_profile_wedding_and_completion_marker() {
    let pool = test_pool();
    let mut conn = pool.get().unwrap();
    let signup = create_test_signup(&conn, "cs_test_1", "alice-bob");

    let account =
        create_account_from_payment(&mut conn, "user-123", &signup.id, Some("cus_42")).unwrap();

    assert_eq!(account.user_id, "user-123");
    assert_eq!(account.slug, "alice-bob");
    assert_eq!(account.display_name, "Alice & Bob");
    assert!(account.wedding_id.starts_with("ev_wed_"));
    assert_eq!(account.guest_code.len(), 8);

    let profile = queries::get_profile_by_id(&conn, "user-123").unwrap().unwrap();
    assert_eq!(profile.email, "alice@example.com");
    assert_eq!(profile.subscription_status, "active");
    assert_eq!(profile.stripe_customer_id.as_deref(), Some("cus_42"));

    let wedding = queries::get_wedding_by_slug(&conn, "alice-bob").unwrap().unwrap();
    assert_eq!(wedding.id, account.wedding_id);
    assert_eq!(wedding.owner_id, "user-123");
    assert_eq!(wedding.theme_id, "classic");
    assert_eq!(wedding.guest_code, account.guest_code);

    let signup = queries::get_pending_signup_by_session(&conn, "cs_test_1")
        .unwrap()
        .unwrap();
    assert!(signup.completed_at.is_some());
}

#[test]
fn missing_customer_id_is_allowed() {
    let pool = test_pool();
    let mut conn = pool.get().unwrap();
    let signup = create_test_signup(&conn, "cs_test_1", "alice-bob");

    create_account_from_payment(&mut conn, "user-123", &signup.id, None).unwrap();

    let profile = queries::get_profile_by_id(&conn, "user-123").unwrap().unwrap();
    assert!(profile.stripe_customer_id.is_none());
}

#[test]
fn second_run_reports_already_completed() {
    let pool = test_pool();
    let mut conn = pool.get().unwrap();
    let signup = create_test_signup(&conn, "cs_test_1", "alice-bob");

    create_account_from_payment(&mut conn, "user-123", &signup.id, None).unwrap();
    let err = create_account_from_payment(&mut conn, "user-456", &signup.id, None).unwrap_err();

    match err {
        ProvisionTxError::AlreadyCompleted { slug } => assert_eq!(slug, "alice-bob"),
        other => panic!("expected AlreadyCompleted, got {:?}", other),
    }
    // The second caller created nothing
    assert_eq!(queries::count_profiles(&conn).unwrap(), 1);
    assert_eq!(queries::count_weddings(&conn).unwrap(), 1);
}

#[test]
fn unknown_signup_reports_not_found() {
    let pool = test_pool();
    let mut conn = pool.get().unwrap();

    let err =
        create_account_from_payment(&mut conn, "user-123", "ev_ps_missing", None).unwrap_err();

    assert!(matches!(err, ProvisionTxError::SignupNotFound));
}

#[test]
fn slug_conflict_rolls_back_the_whole_transaction() {
    let pool = test_pool();
    let mut conn = pool.get().unwrap();
    let first = create_test_signup(&conn, "cs_test_1", "alice-bob");
    create_account_from_payment(&mut conn, "user-123", &first.id, None).unwrap();

    // A different couple paid for the same slug
    let second = {
        let input = CreatePendingSignup {
            email: "carol@example.com".to_string(),
            partner_one: "Carol".to_string(),
            partner_two: "Dan".to_string(),
            slug: "alice-bob".to_string(),
            theme_id: "modern".to_string(),
            wedding_date: None,
        };
        let signup = queries::create_pending_signup(&conn, &input).unwrap();
        queries::set_pending_signup_session(&conn, &signup.id, "cs_test_2").unwrap();
        signup
    };

    let err = create_account_from_payment(&mut conn, "user-456", &second.id, None).unwrap_err();
    assert!(matches!(err, ProvisionTxError::SlugConflict));

    // All-or-nothing: the second profile is gone and the signup is
    // still claimable once the conflict is resolved.
    assert!(queries::get_profile_by_id(&conn, "user-456").unwrap().is_none());
    assert_eq!(queries::count_weddings(&conn).unwrap(), 1);
    let signup = queries::get_pending_signup_by_session(&conn, "cs_test_2")
        .unwrap()
        .unwrap();
    assert!(signup.completed_at.is_none());
}

#[test]
fn duplicate_email_reports_integrity_and_rolls_back() {
    let pool = test_pool();
    let mut conn = pool.get().unwrap();
    let first = create_test_signup(&conn, "cs_test_1", "alice-bob");
    create_account_from_payment(&mut conn, "user-123", &first.id, None).unwrap();

    // Same email, different slug: the profiles UNIQUE(email) fires
    let second = {
        let input = CreatePendingSignup {
            email: "alice@example.com".to_string(),
            partner_one: "Alice".to_string(),
            partner_two: "Bob".to_string(),
            slug: "alice-and-bob".to_string(),
            theme_id: "classic".to_string(),
            wedding_date: None,
        };
        let signup = queries::create_pending_signup(&conn, &input).unwrap();
        queries::set_pending_signup_session(&conn, &signup.id, "cs_test_2").unwrap();
        signup
    };

    let err = create_account_from_payment(&mut conn, "user-456", &second.id, None).unwrap_err();
    match err {
        ProvisionTxError::Integrity(detail) => assert!(detail.contains("email"), "{detail}"),
        other => panic!("expected Integrity, got {:?}", other),
    }
    assert_eq!(queries::count_profiles(&conn).unwrap(), 1);
    let signup = queries::get_pending_signup_by_session(&conn, "cs_test_2")
        .unwrap()
        .unwrap();
    assert!(signup.completed_at.is_none());
}

#[test]
fn guest_codes_use_the_unambiguous_alphabet() {
    for _ in 0..50 {
        let code = queries::generate_guest_code();
        assert_eq!(code.len(), 8);
        assert!(code
            .chars()
            .all(|c| "ABCDEFGHJKMNPQRSTUVWXYZ23456789".contains(c)));
    }
}
