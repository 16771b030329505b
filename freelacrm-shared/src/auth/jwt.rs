/// Session token codec
///
/// Session tokens are compact JWTs signed with HS256 (HMAC-SHA256). They carry
/// the user ID as subject and are entirely self-contained: the server keeps no
/// session state, so a token stays valid until it expires.
///
/// # Security
///
/// - **Algorithm**: HS256 only; tokens signed with anything else are rejected
/// - **Expiration**: configurable TTL (24 hours by default), zero leeway
/// - **Validation**: signature, issuer, not-before and expiration
/// - **Secret**: at least 32 bytes, enforced by the API configuration
///
/// # Expiry Boundary
///
/// A token whose `exp` is `T` is accepted at `T` and rejected at any instant
/// strictly after `T`. [`TokenCodec::verify_at`] takes the clock reading
/// explicitly so the boundary can be exercised deterministically.
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use freelacrm_shared::auth::jwt::TokenCodec;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let codec = TokenCodec::new("your-secret-key-at-least-32-bytes!", Duration::hours(24));
/// let user_id = Uuid::new_v4();
///
/// let token = codec.issue(user_id)?;
/// let claims = codec.verify(&token)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim stamped on every token
pub const ISSUER: &str = "freelacrm";

/// Default session lifetime
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, algorithm, format or claim check failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - Always "freelacrm"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Creates claims for `user_id` issued at `now` and expiring `ttl` later
    pub fn issued_at(user_id: Uuid, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Whether the token is expired at `now` (strictly after `exp`)
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }

    /// Expiration as a timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Signs and verifies session tokens with a shared secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Lifetime of issued tokens
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `user_id` expiring one TTL from now
    pub fn issue(&self, user_id: Uuid) -> Result<String, JwtError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issues a token for `user_id` as if the clock read `now`
    pub fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String, JwtError> {
        let claims = Claims::issued_at(user_id, now, self.ttl);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Verifies a token against the current time
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies a token as if the clock read `now`
    ///
    /// # Errors
    ///
    /// - `JwtError::Expired` if `now` is strictly after the token's expiry
    /// - `JwtError::InvalidIssuer` if the issuer is not [`ISSUER`]
    /// - `JwtError::ValidationError` for a bad signature, a non-HS256 header,
    ///   a malformed token, or a token used before its not-before time
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;
        // Time-based claims are checked below against the injected clock
        validation.validate_exp = false;
        validation.validate_nbf = false;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
                    expected: ISSUER.to_string(),
                },
                _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
            })?;

        let claims = token_data.claims;
        if claims.is_expired_at(now) {
            return Err(JwtError::Expired);
        }
        if now.timestamp() < claims.nbf {
            return Err(JwtError::ValidationError("Token is not valid yet".to_string()));
        }

        Ok(claims)
    }
}
