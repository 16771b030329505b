/// Bearer-token authentication for Axum
///
/// Extracts the `Authorization: Bearer <token>` header, verifies the token with
/// the [`TokenCodec`], and produces an [`AuthContext`] for the authenticated
/// user. The API crate runs this in a `from_fn_with_state` middleware and
/// inserts the context into request extensions.
///
/// # Example
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use chrono::Duration;
/// use freelacrm_shared::auth::jwt::TokenCodec;
/// use freelacrm_shared::auth::middleware::authenticate;
/// use uuid::Uuid;
///
/// let codec = TokenCodec::new("your-secret-key-at-least-32-bytes!", Duration::hours(24));
/// let user_id = Uuid::new_v4();
/// let token = codec.issue(user_id).unwrap();
///
/// let mut headers = HeaderMap::new();
/// headers.insert(
///     header::AUTHORIZATION,
///     HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
/// );
///
/// let auth = authenticate(&codec, &headers).unwrap();
/// assert_eq!(auth.user_id, user_id);
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{JwtError, TokenCodec};

/// Authentication context added to request extensions
///
/// Handlers extract it with `Extension<AuthContext>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID (the token subject)
    pub user_id: Uuid,
}

/// Error type for bearer authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header is not a bearer credential
    #[error("{0}")]
    InvalidFormat(String),

    /// Token verification failed
    #[error("{0}")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
            _ => AuthError::InvalidToken("Invalid token".to_string()),
        }
    }
}

/// Returns the raw bearer token from the `Authorization` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    if token.is_empty() {
        return Err(AuthError::InvalidFormat("Empty bearer token".to_string()));
    }

    Ok(token)
}

/// Verifies the bearer token in `headers`
pub fn authenticate(codec: &TokenCodec, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    let claims = codec.verify(token)?;

    Ok(AuthContext {
        user_id: claims.sub,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret-key-at-least-32-bytes-long", Duration::hours(24))
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_non_bearer_scheme() {
        assert!(matches!(
            bearer_token(&headers_with("Basic dXNlcjpwYXNz")),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            bearer_token(&headers_with("Bearer ")),
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_authenticate() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let token = codec.issue(user_id).unwrap();

        let auth = authenticate(&codec, &headers_with(&format!("Bearer {token}"))).unwrap();
        assert_eq!(auth.user_id, user_id);
    }

    #[test]
    fn test_authenticate_expired_token() {
        let codec = codec();
        let token = codec
            .issue_at(Uuid::new_v4(), Utc::now() - Duration::hours(25))
            .unwrap();

        let err = authenticate(&codec, &headers_with(&format!("Bearer {token}"))).unwrap_err();
        assert_eq!(err.to_string(), "Token expired");
    }

    #[test]
    fn test_authenticate_garbage_token() {
        let err = authenticate(&codec(), &headers_with("Bearer garbage")).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }
}
