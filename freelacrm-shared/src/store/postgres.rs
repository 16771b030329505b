/// PostgreSQL store
///
/// Thin adapter from the storage traits onto the model query methods. Paged
/// listings run the page query and the count query separately; there is no
/// transaction spanning them.
///
/// # Example
///
/// ```no_run
/// use freelacrm_shared::db::pool::{create_pool, DatabaseConfig};
/// use freelacrm_shared::store::{PgStore, UserStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store = PgStore::new(pool);
///
/// let user = store.find_user_by_email("ada@example.com").await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    ClientStore, Page, PageRequest, PaymentStore, StoreHealth, StoreResult, TaskStore, UserStore,
};
use crate::auth::password::ensure_hashed;
use crate::db::pool::health_check;
use crate::models::{
    client::Client,
    payment::{Payment, PaymentStatus},
    task::{Task, TaskStatus},
    user::User,
};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, mut user: User) -> StoreResult<User> {
        user.password_hash = ensure_hashed(&user.password_hash)?;
        Ok(User::insert(&self.pool, &user).await?)
    }

    async fn update_user(&self, mut user: User) -> StoreResult<Option<User>> {
        user.password_hash = ensure_hashed(&user.password_hash)?;
        Ok(User::save(&self.pool, &user).await?)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_reset_digest(&self, digest: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_reset_digest(&self.pool, digest).await?)
    }
}

#[async_trait]
impl ClientStore for PgStore {
    async fn create_client(&self, client: Client) -> StoreResult<Client> {
        Ok(Client::insert(&self.pool, &client).await?)
    }

    async fn update_client(&self, client: Client) -> StoreResult<Option<Client>> {
        Ok(Client::save(&self.pool, &client).await?)
    }

    async fn delete_client(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Client::soft_delete(&self.pool, id).await?)
    }

    async fn find_client(&self, id: Uuid) -> StoreResult<Option<Client>> {
        Ok(Client::find_by_id(&self.pool, id).await?)
    }

    async fn list_clients(&self, user_id: Uuid, page: PageRequest) -> StoreResult<Page<Client>> {
        let items = Client::list_by_user(&self.pool, user_id, page.limit(), page.offset()).await?;
        let total = Client::count_by_user(&self.pool, user_id).await?;
        Ok(Page::new(items, total, page))
    }

    async fn count_clients(&self, user_id: Uuid) -> StoreResult<i64> {
        Ok(Client::count_by_user(&self.pool, user_id).await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create_task(&self, task: Task) -> StoreResult<Task> {
        Ok(Task::insert(&self.pool, &task).await?)
    }

    async fn update_task(&self, task: Task) -> StoreResult<Option<Task>> {
        Ok(Task::save(&self.pool, &task).await?)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Task::soft_delete(&self.pool, id).await?)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list_tasks(
        &self,
        user_id: Uuid,
        status: Option<TaskStatus>,
        page: PageRequest,
    ) -> StoreResult<Page<Task>> {
        let items =
            Task::list_by_user(&self.pool, user_id, status, page.limit(), page.offset()).await?;
        let total = Task::count_by_user(&self.pool, user_id, status).await?;
        Ok(Page::new(items, total, page))
    }

    async fn list_tasks_by_client(
        &self,
        client_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Task>> {
        let items = Task::list_by_client(&self.pool, client_id, page.limit(), page.offset()).await?;
        let total = Task::count_by_client(&self.pool, client_id).await?;
        Ok(Page::new(items, total, page))
    }

    async fn count_tasks(&self, user_id: Uuid, status: Option<TaskStatus>) -> StoreResult<i64> {
        Ok(Task::count_by_user(&self.pool, user_id, status).await?)
    }

    async fn tasks_due_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<Task>> {
        Ok(Task::list_due_between(&self.pool, user_id, from, until).await?)
    }
}

#[async_trait]
impl PaymentStore for PgStore {
    async fn create_payment(&self, payment: Payment) -> StoreResult<Payment> {
        Ok(Payment::insert(&self.pool, &payment).await?)
    }

    async fn update_payment(&self, payment: Payment) -> StoreResult<Option<Payment>> {
        Ok(Payment::save(&self.pool, &payment).await?)
    }

    async fn delete_payment(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Payment::soft_delete(&self.pool, id).await?)
    }

    async fn find_payment(&self, id: Uuid) -> StoreResult<Option<Payment>> {
        Ok(Payment::find_by_id(&self.pool, id).await?)
    }

    async fn list_payments(
        &self,
        user_id: Uuid,
        status: Option<PaymentStatus>,
        page: PageRequest,
    ) -> StoreResult<Page<Payment>> {
        let items =
            Payment::list_by_user(&self.pool, user_id, status, page.limit(), page.offset()).await?;
        let total = Payment::count_by_user(&self.pool, user_id, status).await?;
        Ok(Page::new(items, total, page))
    }

    async fn list_payments_by_client(
        &self,
        client_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Payment>> {
        let items =
            Payment::list_by_client(&self.pool, client_id, page.limit(), page.offset()).await?;
        let total = Payment::count_by_client(&self.pool, client_id).await?;
        Ok(Page::new(items, total, page))
    }

    async fn list_payments_by_task(&self, task_id: Uuid) -> StoreResult<Vec<Payment>> {
        Ok(Payment::list_by_task(&self.pool, task_id).await?)
    }

    async fn overdue_payments(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Payment>> {
        Ok(Payment::list_overdue(&self.pool, user_id, now).await?)
    }

    async fn paid_total(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<f64> {
        Ok(Payment::paid_total(&self.pool, user_id, start, end).await?)
    }

    async fn mark_overdue(&self, user_id: Uuid, now: DateTime<Utc>) -> StoreResult<u64> {
        Ok(Payment::mark_overdue(&self.pool, user_id, now).await?)
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}
