//! Registration, login, token refresh and password reset over the in-memory store

mod common;

use chrono::{Duration, Utc};
use common::{Harness, TEST_PASSWORD};
use freelacrm_shared::auth::password::{hash_password, is_password_hash};
use freelacrm_shared::error::ServiceError;
use freelacrm_shared::models::user::{UserPlan, UserStatus};
use freelacrm_shared::store::UserStore;

#[tokio::test]
async fn test_register_then_login_issues_token_for_user() {
    let h = Harness::new();
    let user = h.user("ada@example.com").await;

    assert_eq!(user.plan, UserPlan::Free);
    assert_eq!(user.status, UserStatus::Active);
    assert!(is_password_hash(&user.password_hash));

    let (logged_in, token) = h
        .services
        .sessions
        .login("ada@example.com", TEST_PASSWORD)
        .await
        .unwrap();
    assert_eq!(logged_in.id, user.id);

    let claims = h.codec.verify(&token).unwrap();
    assert_eq!(claims.sub, user.id);
}

#[tokio::test]
async fn test_password_shaped_like_a_hash_is_still_hashed() {
    let h = Harness::new();
    let typed = hash_password("someone else").unwrap();

    let user = h
        .services
        .sessions
        .register("Ada Lovelace", "ada@example.com", &typed)
        .await
        .unwrap();
    assert_ne!(user.password_hash, typed);

    assert!(h
        .services
        .sessions
        .login("ada@example.com", &typed)
        .await
        .is_ok());

    h.services
        .password_reset
        .request_reset("ada@example.com")
        .await
        .unwrap();
    let token = h.mailer.last_token_for("ada@example.com").unwrap();
    let replacement = hash_password("yet another").unwrap();
    h.services
        .password_reset
        .reset_password(&token, &replacement)
        .await
        .unwrap();

    assert!(h
        .services
        .sessions
        .login("ada@example.com", &replacement)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_register_rejects_duplicate_email_case_insensitively() {
    let h = Harness::new();
    h.user("ada@example.com").await;

    let result = h
        .services
        .sessions
        .register("Other", "  ADA@Example.com ", "secret123")
        .await;
    assert!(matches!(result, Err(ServiceError::EmailInUse)));
}

#[tokio::test]
async fn test_login_wrong_password_is_invalid_password() {
    let h = Harness::new();
    h.user("ada@example.com").await;

    let result = h
        .services
        .sessions
        .login("ada@example.com", "wrong password")
        .await;
    assert!(matches!(result, Err(ServiceError::InvalidPassword)));
}

#[tokio::test]
async fn test_login_unknown_email_is_user_not_found() {
    let h = Harness::new();

    let result = h
        .services
        .sessions
        .login("nobody@example.com", TEST_PASSWORD)
        .await;
    assert!(matches!(result, Err(ServiceError::UserNotFound)));
}

#[tokio::test]
async fn test_login_blocked_user_is_deactivated() {
    let h = Harness::new();
    let user = h.user("ada@example.com").await;
    h.set_status(&user, UserStatus::Blocked).await;

    let result = h
        .services
        .sessions
        .login("ada@example.com", TEST_PASSWORD)
        .await;
    assert!(matches!(result, Err(ServiceError::UserDeactivated)));
}

#[tokio::test]
async fn test_token_accepted_until_ttl_and_rejected_after() {
    let h = Harness::new();
    let user = h.user("ada@example.com").await;
    let issued = Utc::now();

    let (_, token) = h
        .services
        .sessions
        .login_at("ada@example.com", TEST_PASSWORD, issued)
        .await
        .unwrap();

    let at_expiry = issued + h.codec.ttl();
    assert!(h.codec.verify_at(&token, at_expiry).is_ok());

    let refreshed = h
        .services
        .sessions
        .refresh_token_at(&token, at_expiry)
        .await
        .unwrap();
    assert_eq!(h.codec.verify_at(&refreshed, at_expiry).unwrap().sub, user.id);

    let after = at_expiry + Duration::seconds(1);
    let result = h.services.sessions.refresh_token_at(&token, after).await;
    assert!(matches!(result, Err(ServiceError::InvalidToken)));
}

#[tokio::test]
async fn test_refresh_for_deactivated_user_fails() {
    let h = Harness::new();
    let user = h.user("ada@example.com").await;
    let (_, token) = h
        .services
        .sessions
        .login("ada@example.com", TEST_PASSWORD)
        .await
        .unwrap();

    h.set_status(&user, UserStatus::Inactive).await;

    let result = h.services.sessions.refresh_token(&token).await;
    assert!(matches!(result, Err(ServiceError::UserDeactivated)));
}

#[tokio::test]
async fn test_refresh_rejects_garbage_token() {
    let h = Harness::new();
    let result = h.services.sessions.refresh_token("not-a-token").await;
    assert!(matches!(result, Err(ServiceError::InvalidToken)));
}

#[tokio::test]
async fn test_password_reset_flow() {
    let h = Harness::new();
    let user = h.user("ada@example.com").await;

    h.services
        .password_reset
        .request_reset("ada@example.com")
        .await
        .unwrap();
    let token = h.mailer.last_token_for("ada@example.com").unwrap();

    // Only the digest is stored
    let stored = h.store.find_user(user.id).await.unwrap().unwrap();
    assert_ne!(stored.reset_token_digest.as_deref(), Some(token.as_str()));

    let validated = h.services.password_reset.validate_token(&token).await.unwrap();
    assert_eq!(validated.id, user.id);

    h.services
        .password_reset
        .reset_password(&token, "brand new secret")
        .await
        .unwrap();

    let old = h
        .services
        .sessions
        .login("ada@example.com", TEST_PASSWORD)
        .await;
    assert!(matches!(old, Err(ServiceError::InvalidPassword)));
    assert!(h
        .services
        .sessions
        .login("ada@example.com", "brand new secret")
        .await
        .is_ok());

    let stored = h.store.find_user(user.id).await.unwrap().unwrap();
    assert!(is_password_hash(&stored.password_hash));
    assert!(stored.reset_token_digest.is_none());
    assert!(stored.reset_token_expires_at.is_none());
}

#[tokio::test]
async fn test_reset_token_cannot_be_used_twice() {
    let h = Harness::new();
    h.user("ada@example.com").await;

    h.services
        .password_reset
        .request_reset("ada@example.com")
        .await
        .unwrap();
    let token = h.mailer.last_token_for("ada@example.com").unwrap();

    h.services
        .password_reset
        .reset_password(&token, "first new secret")
        .await
        .unwrap();

    let second = h
        .services
        .password_reset
        .reset_password(&token, "second new secret")
        .await;
    assert!(matches!(second, Err(ServiceError::InvalidToken)));
}

#[tokio::test]
async fn test_reset_token_expires_after_one_hour() {
    let h = Harness::new();
    h.user("ada@example.com").await;
    let requested = Utc::now();

    h.services
        .password_reset
        .request_reset_at("ada@example.com", requested)
        .await
        .unwrap();
    let token = h.mailer.last_token_for("ada@example.com").unwrap();

    let at_expiry = requested + Duration::hours(1);
    assert!(h
        .services
        .password_reset
        .validate_token_at(&token, at_expiry)
        .await
        .is_ok());

    let late = at_expiry + Duration::seconds(1);
    let result = h.services.password_reset.validate_token_at(&token, late).await;
    assert!(matches!(result, Err(ServiceError::InvalidToken)));
}

#[tokio::test]
async fn test_new_reset_request_replaces_previous_token() {
    let h = Harness::new();
    h.user("ada@example.com").await;

    h.services.password_reset.request_reset("ada@example.com").await.unwrap();
    let first = h.mailer.last_token_for("ada@example.com").unwrap();
    h.services.password_reset.request_reset("ada@example.com").await.unwrap();
    let second = h.mailer.last_token_for("ada@example.com").unwrap();

    assert_eq!(h.mailer.sent_count(), 2);
    assert_ne!(first, second);
    assert!(matches!(
        h.services.password_reset.validate_token(&first).await,
        Err(ServiceError::InvalidToken)
    ));
    assert!(h.services.password_reset.validate_token(&second).await.is_ok());
}

#[tokio::test]
async fn test_reset_request_for_unknown_email() {
    let h = Harness::new();
    let result = h
        .services
        .password_reset
        .request_reset("ghost@example.com")
        .await;
    assert!(matches!(result, Err(ServiceError::UserNotFound)));
    assert_eq!(h.mailer.sent_count(), 0);
}
