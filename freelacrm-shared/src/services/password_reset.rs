/// Password reset flow
///
/// 1. `request_reset` stores the digest of a fresh token with a one-hour expiry
///    and mails the plaintext token to the account's address.
/// 2. `validate_token` confirms a token is known and unexpired.
/// 3. `reset_password` replaces the password and clears the token, so each
///    token works at most once.
///
/// Issuing a new token replaces any outstanding one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::auth::password::hash_password;
use crate::auth::reset_token::{
    digest_reset_token, generate_reset_token, is_well_formed, reset_token_ttl,
};
use crate::error::{ServiceError, ServiceResult};
use crate::models::user::User;
use crate::notify::Mailer;
use crate::store::Store;

#[derive(Clone)]
pub struct PasswordResetService {
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
}

impl PasswordResetService {
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, mailer }
    }

    /// Issues a reset token for the account using `email` and mails it
    ///
    /// # Errors
    ///
    /// `UserNotFound` if no account uses the email; `Notification` if the
    /// mailer fails (the token stays stored and can be re-requested)
    pub async fn request_reset(&self, email: &str) -> ServiceResult<()> {
        self.request_reset_at(email, Utc::now()).await
    }

    pub async fn request_reset_at(&self, email: &str, now: DateTime<Utc>) -> ServiceResult<()> {
        let mut user = self
            .store
            .find_user_by_email(email.trim())
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let (token, digest) = generate_reset_token();
        user.reset_token_digest = Some(digest);
        user.reset_token_expires_at = Some(now + reset_token_ttl());

        let user = self
            .store
            .update_user(user)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        self.mailer.send_password_reset(&user.email, &token).await?;
        info!(user_id = %user.id, "Password reset requested");

        Ok(())
    }

    /// Returns the account holding `token` if the token has not expired
    ///
    /// # Errors
    ///
    /// `InvalidToken` if the token is unknown or its expiry is before now
    pub async fn validate_token(&self, token: &str) -> ServiceResult<User> {
        self.validate_token_at(token, Utc::now()).await
    }

    pub async fn validate_token_at(&self, token: &str, now: DateTime<Utc>) -> ServiceResult<User> {
        if !is_well_formed(token) {
            return Err(ServiceError::InvalidToken);
        }

        let user = self
            .store
            .find_user_by_reset_digest(&digest_reset_token(token))
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        match user.reset_token_expires_at {
            Some(expires_at) if expires_at >= now => Ok(user),
            _ => Err(ServiceError::InvalidToken),
        }
    }

    /// Replaces the password of the account holding `token`
    ///
    /// The new password is hashed and the token is cleared.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> ServiceResult<User> {
        self.reset_password_at(token, new_password, Utc::now()).await
    }

    pub async fn reset_password_at(
        &self,
        token: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<User> {
        let mut user = self.validate_token_at(token, now).await?;

        user.password_hash = hash_password(new_password)?;
        user.clear_reset_token();

        let user = self
            .store
            .update_user(user)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        info!(user_id = %user.id, "Password reset completed");
        Ok(user)
    }
}
