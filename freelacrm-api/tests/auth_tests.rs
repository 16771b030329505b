//! HTTP tests for registration, login, refresh, profile and password reset

mod common;

use axum::http::{Method, StatusCode};
use common::{TestContext, TEST_PASSWORD};
use serde_json::json;

#[tokio::test]
async fn test_health_is_public() {
    let ctx = TestContext::new();

    for uri in ["/health", "/api/v1/health"] {
        let (status, body) = ctx.send(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["store"], "connected");
    }
}

#[tokio::test]
async fn test_register_hides_secrets() {
    let ctx = TestContext::new();

    let (status, user) = ctx
        .post(
            "/api/v1/auth/register",
            None,
            json!({ "name": "Ada Lovelace", "email": "ada@example.com", "password": TEST_PASSWORD }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "ada@example.com");
    assert_eq!(user["plan"], "free");
    assert_eq!(user["status"], "active");
    assert!(user.get("password_hash").is_none());
    assert!(user.get("reset_token_digest").is_none());
}

#[tokio::test]
async fn test_register_validation_and_conflict() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .post(
            "/api/v1/auth/register",
            None,
            json!({ "name": "Al", "email": "nope", "password": "123" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"].as_array().unwrap().len(), 3);

    ctx.signup("ada@example.com").await;
    let (status, body) = ctx
        .post(
            "/api/v1/auth/register",
            None,
            json!({ "name": "Other Ada", "email": "ADA@example.com", "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new();
    ctx.signup("ada@example.com").await;

    let (wrong_status, wrong_body) = ctx
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "email": "ada@example.com", "password": "not the password" }),
        )
        .await;
    let (unknown_status, unknown_body) = ctx
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "email": "ghost@example.com", "password": "not the password" }),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(Method::GET, "/api/v1/clients", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx.get("/api/v1/user/profile", "garbage").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_and_refresh() {
    let ctx = TestContext::new();
    let (user_id, token) = ctx.signup("ada@example.com").await;

    let (status, profile) = ctx.get("/api/v1/user/profile", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["user"]["id"], user_id.as_str());
    assert_eq!(profile["usage"]["plan"], "free");
    assert_eq!(profile["usage"]["clients"]["limit"], 5);

    let (status, refreshed) = ctx
        .send(Method::POST, "/api/v1/auth/refresh", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["token_type"], "Bearer");
    assert_eq!(refreshed["expires_in"], 24 * 3600);

    let new_token = refreshed["token"].as_str().unwrap();
    let (status, _) = ctx.get("/api/v1/user/profile", new_token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .send(Method::POST, "/api/v1/auth/refresh", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_reset_over_http() {
    let ctx = TestContext::new();
    ctx.signup("ada@example.com").await;

    let (status, _) = ctx
        .post(
            "/api/v1/auth/password/forgot",
            None,
            json!({ "email": "ghost@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .post(
            "/api/v1/auth/password/forgot",
            None,
            json!({ "email": "ada@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = ctx.mailer.last_token().unwrap();

    let (status, _) = ctx
        .post("/api/v1/auth/password/validate", None, json!({ "token": token }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .post(
            "/api/v1/auth/password/reset",
            None,
            json!({ "token": token, "password": "new-secret" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Consumed
    let (status, _) = ctx
        .post(
            "/api/v1/auth/password/reset",
            None,
            json!({ "token": token, "password": "another-secret" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "email": "ada@example.com", "password": "new-secret" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_security_headers_follow_production_flag() {
    let dev = TestContext::new();
    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(dev.app.clone(), request).await.unwrap();
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().get("strict-transport-security").is_none());

    let prod = TestContext::with_env(&[("PRODUCTION", "true")]);
    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(prod.app.clone(), request).await.unwrap();
    assert!(response.headers().get("strict-transport-security").is_some());
}
