/// Resource ownership checks
///
/// Every client, task and payment belongs to exactly one user. Fetch-by-id
/// paths load the record and then run it through [`require_owned`], which
/// treats "exists but belongs to someone else" exactly like "does not exist".
/// Callers map the resulting `NotFound` to their own not-found error, so a
/// foreign record is indistinguishable from a missing one.
///
/// # Example
///
/// ```
/// use freelacrm_shared::auth::authorization::{require_owned, Owned};
/// use uuid::Uuid;
///
/// struct Note { owner: Uuid }
///
/// impl Owned for Note {
///     fn owner_id(&self) -> Uuid { self.owner }
/// }
///
/// let me = Uuid::new_v4();
/// assert!(require_owned(Some(Note { owner: me }), me).is_ok());
/// assert!(require_owned(Some(Note { owner: Uuid::new_v4() }), me).is_err());
/// assert!(require_owned(None::<Note>, me).is_err());
/// ```

use uuid::Uuid;

use crate::models::{client::Client, payment::Payment, task::Task};

/// Error type for authorization checks
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Record is missing or owned by another user
    #[error("Resource not found")]
    NotFound,
}

/// A record with a single owning user
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for Client {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for Task {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for Payment {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

/// Returns the record only if it exists and `user_id` owns it
pub fn require_owned<T: Owned>(record: Option<T>, user_id: Uuid) -> Result<T, AuthzError> {
    match record {
        Some(record) if record.owner_id() == user_id => Ok(record),
        _ => Err(AuthzError::NotFound),
    }
}
