/// In-memory store
///
/// Keeps every table in a `tokio::sync::RwLock<HashMap<Uuid, _>>`. It follows
/// the same contract as the PostgreSQL store (soft deletes, hash-on-save,
/// unique emails, paged listings), which makes it suitable for tests and for
/// running the API without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ClientStore, Page, PageRequest, PaymentStore, StoreError, StoreHealth, StoreResult, TaskStore,
    UserStore,
};
use crate::auth::password::ensure_hashed;
use crate::models::{
    client::Client,
    payment::{Payment, PaymentStatus},
    task::{Task, TaskStatus},
    user::User,
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    clients: RwLock<HashMap<Uuid, Client>>,
    tasks: RwLock<HashMap<Uuid, Task>>,
    payments: RwLock<HashMap<Uuid, Payment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Sorts `items` with `cmp`, then cuts out the requested page
fn paginate<T, F>(mut items: Vec<T>, page: PageRequest, cmp: F) -> Page<T>
where
    F: FnMut(&T, &T) -> std::cmp::Ordering,
{
    items.sort_by(cmp);
    let total = items.len() as i64;
    let items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();

    Page::new(items, total, page)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, mut user: User) -> StoreResult<User> {
        user.password_hash = ensure_hashed(&user.password_hash)?;

        let mut users = self.users.write().await;
        let taken = users.values().any(|u| {
            u.deleted_at.is_none() && u.email.eq_ignore_ascii_case(&user.email)
        });
        if taken {
            return Err(StoreError::Conflict(format!("email {} is taken", user.email)));
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, mut user: User) -> StoreResult<Option<User>> {
        user.password_hash = ensure_hashed(&user.password_hash)?;

        let mut users = self.users.write().await;
        let taken = users.values().any(|u| {
            u.id != user.id && u.deleted_at.is_none() && u.email.eq_ignore_ascii_case(&user.email)
        });
        if taken {
            return Err(StoreError::Conflict(format!("email {} is taken", user.email)));
        }

        match users.get_mut(&user.id) {
            Some(existing) if existing.deleted_at.is_none() => {
                user.created_at = existing.created_at;
                user.updated_at = Utc::now();
                *existing = user.clone();
                Ok(Some(user))
            }
            _ => Ok(None),
        }
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).filter(|u| u.deleted_at.is_none()).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.deleted_at.is_none() && u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_reset_digest(&self, digest: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.deleted_at.is_none() && u.reset_token_digest.as_deref() == Some(digest))
            .cloned())
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn create_client(&self, client: Client) -> StoreResult<Client> {
        self.clients.write().await.insert(client.id, client.clone());
        Ok(client)
    }

    async fn update_client(&self, mut client: Client) -> StoreResult<Option<Client>> {
        let mut clients = self.clients.write().await;
        match clients.get_mut(&client.id) {
            Some(existing) if existing.deleted_at.is_none() => {
                client.user_id = existing.user_id;
                client.created_at = existing.created_at;
                client.updated_at = Utc::now();
                *existing = client.clone();
                Ok(Some(client))
            }
            _ => Ok(None),
        }
    }

    async fn delete_client(&self, id: Uuid) -> StoreResult<bool> {
        let mut clients = self.clients.write().await;
        match clients.get_mut(&id) {
            Some(client) if client.deleted_at.is_none() => {
                client.deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_client(&self, id: Uuid) -> StoreResult<Option<Client>> {
        let clients = self.clients.read().await;
        Ok(clients.get(&id).filter(|c| c.deleted_at.is_none()).cloned())
    }

    async fn list_clients(&self, user_id: Uuid, page: PageRequest) -> StoreResult<Page<Client>> {
        let clients = self.clients.read().await;
        let matching: Vec<Client> = clients
            .values()
            .filter(|c| c.user_id == user_id && c.deleted_at.is_none())
            .cloned()
            .collect();

        Ok(paginate(matching, page, |a, b| b.created_at.cmp(&a.created_at)))
    }

    async fn count_clients(&self, user_id: Uuid) -> StoreResult<i64> {
        let clients = self.clients.read().await;
        Ok(clients
            .values()
            .filter(|c| c.user_id == user_id && c.deleted_at.is_none())
            .count() as i64)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, task: Task) -> StoreResult<Task> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update_task(&self, mut task: Task) -> StoreResult<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task.id) {
            Some(existing) if existing.deleted_at.is_none() => {
                task.user_id = existing.user_id;
                task.created_at = existing.created_at;
                task.updated_at = Utc::now();
                *existing = task.clone();
                Ok(Some(task))
            }
            _ => Ok(None),
        }
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&id) {
            Some(task) if task.deleted_at.is_none() => {
                task.deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(&id).filter(|t| t.deleted_at.is_none()).cloned())
    }

    async fn list_tasks(
        &self,
        user_id: Uuid,
        status: Option<TaskStatus>,
        page: PageRequest,
    ) -> StoreResult<Page<Task>> {
        let tasks = self.tasks.read().await;
        let matching: Vec<Task> = tasks
            .values()
            .filter(|t| t.user_id == user_id && t.deleted_at.is_none())
            .filter(|t| status.map_or(true, |s| t.status == s))
            .cloned()
            .collect();

        Ok(paginate(matching, page, |a, b| b.created_at.cmp(&a.created_at)))
    }

    async fn list_tasks_by_client(
        &self,
        client_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Task>> {
        let tasks = self.tasks.read().await;
        let matching: Vec<Task> = tasks
            .values()
            .filter(|t| t.client_id == client_id && t.deleted_at.is_none())
            .cloned()
            .collect();

        Ok(paginate(matching, page, |a, b| b.created_at.cmp(&a.created_at)))
    }

    async fn count_tasks(&self, user_id: Uuid, status: Option<TaskStatus>) -> StoreResult<i64> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .values()
            .filter(|t| t.user_id == user_id && t.deleted_at.is_none())
            .filter(|t| status.map_or(true, |s| t.status == s))
            .count() as i64)
    }

    async fn tasks_due_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        let mut due: Vec<Task> = tasks
            .values()
            .filter(|t| t.user_id == user_id && t.deleted_at.is_none())
            .filter(|t| t.status != TaskStatus::Completed)
            .filter(|t| t.due_date.is_some_and(|d| d >= from && d <= until))
            .cloned()
            .collect();
        due.sort_by_key(|t| t.due_date);

        Ok(due)
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn create_payment(&self, payment: Payment) -> StoreResult<Payment> {
        self.payments.write().await.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn update_payment(&self, mut payment: Payment) -> StoreResult<Option<Payment>> {
        let mut payments = self.payments.write().await;
        match payments.get_mut(&payment.id) {
            Some(existing) if existing.deleted_at.is_none() => {
                payment.user_id = existing.user_id;
                payment.created_at = existing.created_at;
                payment.updated_at = Utc::now();
                *existing = payment.clone();
                Ok(Some(payment))
            }
            _ => Ok(None),
        }
    }

    async fn delete_payment(&self, id: Uuid) -> StoreResult<bool> {
        let mut payments = self.payments.write().await;
        match payments.get_mut(&id) {
            Some(payment) if payment.deleted_at.is_none() => {
                payment.deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_payment(&self, id: Uuid) -> StoreResult<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.get(&id).filter(|p| p.deleted_at.is_none()).cloned())
    }

    async fn list_payments(
        &self,
        user_id: Uuid,
        status: Option<PaymentStatus>,
        page: PageRequest,
    ) -> StoreResult<Page<Payment>> {
        let payments = self.payments.read().await;
        let matching: Vec<Payment> = payments
            .values()
            .filter(|p| p.user_id == user_id && p.deleted_at.is_none())
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();

        Ok(paginate(matching, page, |a, b| b.due_date.cmp(&a.due_date)))
    }

    async fn list_payments_by_client(
        &self,
        client_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Payment>> {
        let payments = self.payments.read().await;
        let matching: Vec<Payment> = payments
            .values()
            .filter(|p| p.client_id == client_id && p.deleted_at.is_none())
            .cloned()
            .collect();

        Ok(paginate(matching, page, |a, b| b.due_date.cmp(&a.due_date)))
    }

    async fn list_payments_by_task(&self, task_id: Uuid) -> StoreResult<Vec<Payment>> {
        let payments = self.payments.read().await;
        let mut matching: Vec<Payment> = payments
            .values()
            .filter(|p| p.task_id == Some(task_id) && p.deleted_at.is_none())
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.due_date.cmp(&a.due_date));

        Ok(matching)
    }

    async fn overdue_payments(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Payment>> {
        let payments = self.payments.read().await;
        let mut overdue: Vec<Payment> = payments
            .values()
            .filter(|p| p.user_id == user_id && p.deleted_at.is_none() && p.is_overdue_at(now))
            .cloned()
            .collect();
        overdue.sort_by_key(|p| p.due_date);

        Ok(overdue)
    }

    async fn paid_total(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<f64> {
        let payments = self.payments.read().await;
        Ok(payments
            .values()
            .filter(|p| p.user_id == user_id && p.deleted_at.is_none())
            .filter(|p| p.status == PaymentStatus::Paid)
            .filter(|p| p.paid_date.is_some_and(|d| d >= start && d <= end))
            .map(|p| p.amount)
            .sum())
    }

    async fn mark_overdue(&self, user_id: Uuid, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut payments = self.payments.write().await;
        let mut updated = 0;
        for payment in payments.values_mut() {
            if payment.user_id == user_id
                && payment.deleted_at.is_none()
                && payment.status == PaymentStatus::Pending
                && payment.due_date < now
            {
                payment.status = PaymentStatus::Overdue;
                payment.updated_at = now;
                updated += 1;
            }
        }

        Ok(updated)
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
