/// Authentication endpoints
///
/// - `POST /api/v1/auth/register`: create an account
/// - `POST /api/v1/auth/login`: exchange credentials for a session token
/// - `POST /api/v1/auth/refresh`: exchange a valid bearer token for a fresh one
/// - `POST /api/v1/auth/password/forgot`: mail a reset token
/// - `POST /api/v1/auth/password/validate`: check a reset token
/// - `POST /api/v1/auth/password/reset`: set a new password with a reset token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::extract::ValidJson,
};
use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use freelacrm_shared::{
    auth::middleware::bearer_token, error::ServiceError, models::user::User,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

const BAD_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 100, message = "Name must be between 3 and 100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Session token response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,

    pub token_type: &'static str,

    /// Lifetime in seconds
    pub expires_in: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ValidateResetRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,

    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// Register a new user
///
/// ```text
/// POST /api/v1/auth/register
///
/// { "name": "Ada Lovelace", "email": "ada@example.com", "password": "secret1" }
/// ```
///
/// Responds `201` with the created user. Fails with `400` on validation
/// errors and `409` if the email is taken.
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state
        .services
        .sessions
        .register(&req.name, &req.email, &req.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Login
///
/// Unknown emails and wrong passwords both answer `401` with the same
/// message. Deactivated accounts answer `403`.
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let (user, token) = state
        .services
        .sessions
        .login(&req.email, &req.password)
        .await
        .map_err(|e| match e {
            ServiceError::UserNotFound | ServiceError::InvalidPassword => {
                ApiError::Unauthorized(BAD_CREDENTIALS.to_string())
            }
            other => other.into(),
        })?;

    Ok(Json(TokenResponse {
        token,
        token_type: "Bearer",
        expires_in: state.codec().ttl().num_seconds(),
        user: Some(user),
    }))
}

/// Refresh the session token carried in the `Authorization` header
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<TokenResponse>> {
    let token = bearer_token(&headers)?;
    let token = state
        .services
        .sessions
        .refresh_token(token)
        .await
        .map_err(|e| match e {
            ServiceError::UserNotFound => ApiError::Unauthorized("Invalid token".to_string()),
            other => other.into(),
        })?;

    Ok(Json(TokenResponse {
        token,
        token_type: "Bearer",
        expires_in: state.codec().ttl().num_seconds(),
        user: None,
    }))
}

/// Start a password reset
///
/// Answers `404` when no account uses the email.
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state.services.password_reset.request_reset(&req.email).await?;

    Ok(MessageResponse::new(
        "Password reset instructions have been sent to your email",
    ))
}

/// Check that a reset token is known and unexpired
pub async fn validate_reset_token(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<ValidateResetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .services
        .password_reset
        .validate_token(&req.token)
        .await?;

    Ok(MessageResponse::new("Token is valid"))
}

/// Set a new password with a reset token; the token is consumed
pub async fn reset_password(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .services
        .password_reset
        .reset_password(&req.token, &req.password)
        .await?;

    Ok(MessageResponse::new("Password has been reset"))
}
