/// Storage layer
///
/// Services depend on the traits in this module rather than on a database.
/// Two implementations ship with the crate:
///
/// - [`postgres::PgStore`]: PostgreSQL via sqlx, used in production
/// - [`memory::MemoryStore`]: `RwLock`-guarded maps, used by tests and local runs
///
/// Both honour the same contract:
///
/// - updates overwrite every mutable field of the record
/// - deletes are soft and report whether a live record was affected
/// - soft-deleted records never appear in reads, lists or counts
/// - user passwords are hashed on save unless they already are
/// - list operations return one page plus the total number of matches

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::password::PasswordError;
use crate::models::{
    client::Client,
    payment::{Payment, PaymentStatus},
    task::{Task, TaskStatus},
    user::User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size applied when none is given
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Storage error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated
    #[error("Record already exists: {0}")]
    Conflict(String),

    /// Password could not be hashed on save
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = e {
            if db.is_unique_violation() {
                return StoreError::Conflict(db.message().to_string());
            }
        }
        StoreError::Database(e)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// 1-based page selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Builds a page request, clamping page to at least 1 and page size to `1..=100`
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of matching records across all pages
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
        }
    }
}

/// Persistence for user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user, hashing its password if needed
    ///
    /// Fails with `StoreError::Conflict` if the email is taken.
    async fn create_user(&self, user: User) -> StoreResult<User>;

    /// Overwrites a live user, hashing its password if needed
    ///
    /// Returns `None` if the user does not exist.
    async fn update_user(&self, user: User) -> StoreResult<Option<User>>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Case-insensitive email lookup
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_reset_digest(&self, digest: &str) -> StoreResult<Option<User>>;
}

/// Persistence for clients
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn create_client(&self, client: Client) -> StoreResult<Client>;

    async fn update_client(&self, client: Client) -> StoreResult<Option<Client>>;

    async fn delete_client(&self, id: Uuid) -> StoreResult<bool>;

    async fn find_client(&self, id: Uuid) -> StoreResult<Option<Client>>;

    async fn list_clients(&self, user_id: Uuid, page: PageRequest) -> StoreResult<Page<Client>>;

    async fn count_clients(&self, user_id: Uuid) -> StoreResult<i64>;
}

/// Persistence for tasks
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, task: Task) -> StoreResult<Task>;

    async fn update_task(&self, task: Task) -> StoreResult<Option<Task>>;

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    async fn list_tasks(
        &self,
        user_id: Uuid,
        status: Option<TaskStatus>,
        page: PageRequest,
    ) -> StoreResult<Page<Task>>;

    async fn list_tasks_by_client(
        &self,
        client_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Task>>;

    async fn count_tasks(&self, user_id: Uuid, status: Option<TaskStatus>) -> StoreResult<i64>;

    /// Non-completed tasks due in `[from, until]`, soonest first
    async fn tasks_due_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<Task>>;
}

/// Persistence for payments
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn create_payment(&self, payment: Payment) -> StoreResult<Payment>;

    async fn update_payment(&self, payment: Payment) -> StoreResult<Option<Payment>>;

    async fn delete_payment(&self, id: Uuid) -> StoreResult<bool>;

    async fn find_payment(&self, id: Uuid) -> StoreResult<Option<Payment>>;

    async fn list_payments(
        &self,
        user_id: Uuid,
        status: Option<PaymentStatus>,
        page: PageRequest,
    ) -> StoreResult<Page<Payment>>;

    async fn list_payments_by_client(
        &self,
        client_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Payment>>;

    async fn list_payments_by_task(&self, task_id: Uuid) -> StoreResult<Vec<Payment>>;

    /// Payments that are overdue at `now`, oldest due first
    async fn overdue_payments(&self, user_id: Uuid, now: DateTime<Utc>)
        -> StoreResult<Vec<Payment>>;

    /// Sum of paid amounts with a paid date in `[start, end]`
    async fn paid_total(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<f64>;

    /// Flips pending payments due before `now` to overdue, returning how many changed
    async fn mark_overdue(&self, user_id: Uuid, now: DateTime<Utc>) -> StoreResult<u64>;
}

/// Connectivity probe used by the health endpoint
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;
}

/// Every store the services need, behind one handle
pub trait Store: UserStore + ClientStore + TaskStore + PaymentStore + StoreHealth {}

impl<T> Store for T where T: UserStore + ClientStore + TaskStore + PaymentStore + StoreHealth {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults() {
        let page = PageRequest::default();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 10);
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn test_page_request_clamps() {
        let page = PageRequest::new(0, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 1);

        let page = PageRequest::new(3, 1_000);
        assert_eq!(page.page_size, MAX_PAGE_SIZE);
        assert_eq!(page.offset(), 200);
    }
}
