/// Application services
///
/// Services hold the business rules: session lifecycle, password resets,
/// ownership scoping, cross-entity checks and quota enforcement. They depend
/// only on the storage traits, the token codec and the mailer, so the same
/// code runs over PostgreSQL in production and the in-memory store in tests.
///
/// Every service is cheap to clone (it holds `Arc`s) and keeps no mutable
/// state of its own.

pub mod clients;
pub mod password_reset;
pub mod payments;
pub mod session;
pub mod tasks;

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::authorization::{require_owned, Owned};
use crate::auth::jwt::TokenCodec;
use crate::error::ServiceError;
use crate::notify::Mailer;
use crate::quota::QuotaPolicy;
use crate::store::Store;

pub use clients::ClientService;
pub use password_reset::PasswordResetService;
pub use payments::{PaymentService, PaymentSummary};
pub use session::SessionService;
pub use tasks::TaskService;

/// All services wired over one store
#[derive(Clone)]
pub struct Services {
    pub sessions: SessionService,
    pub password_reset: PasswordResetService,
    pub quota: QuotaPolicy,
    pub clients: ClientService,
    pub tasks: TaskService,
    pub payments: PaymentService,
    store: Arc<dyn Store>,
}

impl Services {
    pub fn new(store: Arc<dyn Store>, codec: TokenCodec, mailer: Arc<dyn Mailer>) -> Self {
        let quota = QuotaPolicy::new(store.clone());

        Self {
            sessions: SessionService::new(store.clone(), codec),
            password_reset: PasswordResetService::new(store.clone(), mailer),
            clients: ClientService::new(store.clone(), quota.clone()),
            tasks: TaskService::new(store.clone(), quota.clone()),
            payments: PaymentService::new(store.clone()),
            quota,
            store,
        }
    }

    /// The store every service shares
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }
}

/// Ownership check that reports a foreign record as `not_found`
fn owned_or<T: Owned>(record: Option<T>, user_id: Uuid, not_found: ServiceError) -> Result<T, ServiceError> {
    require_owned(record, user_id).map_err(|_| not_found)
}
