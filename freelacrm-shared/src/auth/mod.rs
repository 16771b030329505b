/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing, verification and hash-on-save
/// - [`jwt`]: HS256 session token issue and verification
/// - [`reset_token`]: password reset token generation and digesting
/// - [`middleware`]: bearer-token extraction into an [`middleware::AuthContext`]
/// - [`authorization`]: per-record ownership checks
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use freelacrm_shared::auth::jwt::TokenCodec;
/// use freelacrm_shared::auth::password::{hash_password, verify_password};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let codec = TokenCodec::new("secret-key-that-is-at-least-32-bytes", Duration::hours(24));
/// let token = codec.issue(Uuid::new_v4())?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod reset_token;
