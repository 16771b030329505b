/// Domain errors returned by the services
///
/// The HTTP layer maps each variant onto a status code; see the API crate's
/// `error` module. Variants that wrap infrastructure failures (`Store`,
/// `Password`, `Token` creation, `Notification`) are internal errors and are
/// never shown to clients verbatim.

use crate::auth::{jwt::JwtError, password::PasswordError};
use crate::notify::MailError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Email is already in use")]
    EmailInUse,

    #[error("User not found")]
    UserNotFound,

    #[error("User account is not active")]
    UserDeactivated,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Client limit reached for the current plan ({limit})")]
    ClientLimitExceeded { limit: i64 },

    #[error("Pending task limit reached for the current plan ({limit})")]
    TaskLimitExceeded { limit: i64 },

    #[error("Client not found")]
    ClientNotFound,

    #[error("Task not found")]
    TaskNotFound,

    #[error("Payment not found")]
    PaymentNotFound,

    #[error("Client is not active")]
    ClientNotActive,

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Task does not belong to the given client")]
    TaskClientMismatch,

    /// Malformed input that passed request validation
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Notification(#[from] MailError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
