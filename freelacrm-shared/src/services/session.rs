/// Registration, login and session token renewal
///
/// Sessions are stateless: login issues a signed token whose subject is the
/// user ID, and refresh exchanges a still-valid token for a fresh one after
/// re-checking that the account exists and is active. Old tokens are not
/// revoked; they simply expire.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::jwt::TokenCodec;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{ServiceError, ServiceResult};
use crate::models::user::User;
use crate::store::{Store, StoreError};

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn Store>,
    codec: TokenCodec,
}

impl SessionService {
    pub fn new(store: Arc<dyn Store>, codec: TokenCodec) -> Self {
        Self { store, codec }
    }

    /// The codec used to issue and verify session tokens
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Creates an active, free-plan account
    ///
    /// The email is trimmed and lowercased and the password is hashed before
    /// the record is saved. No token is issued.
    ///
    /// # Errors
    ///
    /// `EmailInUse` if a live account already uses the email
    pub async fn register(&self, name: &str, email: &str, password: &str) -> ServiceResult<User> {
        let email = normalize_email(email);

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(ServiceError::EmailInUse);
        }

        let user = User::new(name.trim(), email, hash_password(password)?);
        let user = match self.store.create_user(user).await {
            Ok(user) => user,
            // Lost a race with a concurrent registration
            Err(StoreError::Conflict(_)) => return Err(ServiceError::EmailInUse),
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Verifies credentials and issues a session token
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if no account uses the email
    /// - `UserDeactivated` if the account is not active
    /// - `InvalidPassword` if the password does not match
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<(User, String)> {
        self.login_at(email, password, Utc::now()).await
    }

    /// [`login`](Self::login) with an explicit clock reading for the token
    pub async fn login_at(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<(User, String)> {
        let user = self
            .store
            .find_user_by_email(&normalize_email(email))
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        if !user.is_active() {
            warn!(user_id = %user.id, status = user.status.as_str(), "Login attempt on inactive account");
            return Err(ServiceError::UserDeactivated);
        }

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(ServiceError::InvalidPassword);
        }

        let token = self.codec.issue_at(user.id, now)?;
        info!(user_id = %user.id, "User logged in");

        Ok((user, token))
    }

    /// Exchanges a valid token for a new one with a fresh expiry
    ///
    /// # Errors
    ///
    /// - `InvalidToken` if the token is malformed, forged or expired
    /// - `UserNotFound` if the subject no longer exists
    /// - `UserDeactivated` if the subject is no longer active
    pub async fn refresh_token(&self, token: &str) -> ServiceResult<String> {
        self.refresh_token_at(token, Utc::now()).await
    }

    /// [`refresh_token`](Self::refresh_token) with an explicit clock reading
    pub async fn refresh_token_at(&self, token: &str, now: DateTime<Utc>) -> ServiceResult<String> {
        let claims = self
            .codec
            .verify_at(token, now)
            .map_err(|_| ServiceError::InvalidToken)?;

        let user = self.get_user_by_id(claims.sub).await?;
        if !user.is_active() {
            return Err(ServiceError::UserDeactivated);
        }

        Ok(self.codec.issue_at(user.id, now)?)
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> ServiceResult<User> {
        self.store
            .find_user(id)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
