/// Task management scoped to the owning user
///
/// Tasks always hang off a client of the same user. Creation requires the
/// client to be active and the user to be under their `todo` task ceiling;
/// status changes stamp the task's start and end dates the first time.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use super::owned_or;
use crate::error::{ServiceError, ServiceResult};
use crate::models::client::Client;
use crate::models::task::{Task, TaskInput, TaskStatus};
use crate::quota::QuotaPolicy;
use crate::store::{Page, PageRequest, Store};

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn Store>,
    quota: QuotaPolicy,
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>, quota: QuotaPolicy) -> Self {
        Self { store, quota }
    }

    /// Creates a `todo` task for an owned, active client
    ///
    /// # Errors
    ///
    /// - `TaskLimitExceeded` when the user is at their `todo` task ceiling
    /// - `ClientNotFound` when the client is missing or owned by someone else
    /// - `ClientNotActive` when the client is inactive or archived
    pub async fn create(&self, user_id: Uuid, input: TaskInput) -> ServiceResult<Task> {
        validate(&input)?;
        self.quota.can_create_task(user_id).await?;
        self.active_client(user_id, input.client_id).await?;

        let task = self.store.create_task(Task::new(user_id, input)).await?;
        info!(user_id = %user_id, task_id = %task.id, client_id = %task.client_id, "Task created");

        Ok(task)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> ServiceResult<Task> {
        let task = self.store.find_task(id).await?;
        owned_or(task, user_id, ServiceError::TaskNotFound)
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        status: Option<TaskStatus>,
        page: PageRequest,
    ) -> ServiceResult<Page<Task>> {
        Ok(self.store.list_tasks(user_id, status, page).await?)
    }

    /// Tasks of one owned client
    pub async fn list_by_client(
        &self,
        user_id: Uuid,
        client_id: Uuid,
        page: PageRequest,
    ) -> ServiceResult<Page<Task>> {
        let client = self.owned_client(user_id, client_id).await?;
        Ok(self.store.list_tasks_by_client(client.id, page).await?)
    }

    /// Overwrites the mutable fields of an owned task
    ///
    /// Moving the task to another client re-checks that client's ownership and
    /// status, and fails with `TaskClientMismatch` while payments reference the
    /// task.
    pub async fn update(&self, user_id: Uuid, id: Uuid, input: TaskInput) -> ServiceResult<Task> {
        self.update_at(user_id, id, input, Utc::now()).await
    }

    pub async fn update_at(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: TaskInput,
        now: DateTime<Utc>,
    ) -> ServiceResult<Task> {
        validate(&input)?;

        let mut task = self.get(user_id, id).await?;
        if input.client_id != task.client_id {
            self.active_client(user_id, input.client_id).await?;
            // Payments keep their client, so a billed task stays where it is
            if !self.store.list_payments_by_task(task.id).await?.is_empty() {
                return Err(ServiceError::TaskClientMismatch);
            }
        }

        task.apply(input, now);
        self.store
            .update_task(task)
            .await?
            .ok_or(ServiceError::TaskNotFound)
    }

    /// Moves an owned task to `status`
    pub async fn change_status(&self, user_id: Uuid, id: Uuid, status: TaskStatus) -> ServiceResult<Task> {
        self.change_status_at(user_id, id, status, Utc::now()).await
    }

    pub async fn change_status_at(
        &self,
        user_id: Uuid,
        id: Uuid,
        status: TaskStatus,
        now: DateTime<Utc>,
    ) -> ServiceResult<Task> {
        let mut task = self.get(user_id, id).await?;
        let previous = task.status;
        task.set_status(status, now);

        let task = self
            .store
            .update_task(task)
            .await?
            .ok_or(ServiceError::TaskNotFound)?;

        info!(
            task_id = %task.id,
            from = previous.as_str(),
            to = status.as_str(),
            "Task status changed"
        );
        Ok(task)
    }

    /// Soft-deletes an owned task
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> ServiceResult<()> {
        let task = self.get(user_id, id).await?;

        if !self.store.delete_task(task.id).await? {
            return Err(ServiceError::TaskNotFound);
        }

        info!(user_id = %user_id, task_id = %id, "Task deleted");
        Ok(())
    }

    /// Non-completed tasks due within the next `days` days, soonest first
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `days` is not positive
    pub async fn upcoming(&self, user_id: Uuid, days: i64) -> ServiceResult<Vec<Task>> {
        self.upcoming_at(user_id, days, Utc::now()).await
    }

    pub async fn upcoming_at(&self, user_id: Uuid, days: i64, now: DateTime<Utc>) -> ServiceResult<Vec<Task>> {
        if days <= 0 {
            return Err(ServiceError::InvalidInput("days must be positive".to_string()));
        }
        let until = Duration::try_days(days)
            .and_then(|span| now.checked_add_signed(span))
            .ok_or_else(|| ServiceError::InvalidInput("days is out of range".to_string()))?;

        Ok(self.store.tasks_due_between(user_id, now, until).await?)
    }

    async fn owned_client(&self, user_id: Uuid, client_id: Uuid) -> ServiceResult<Client> {
        let client = self.store.find_client(client_id).await?;
        owned_or(client, user_id, ServiceError::ClientNotFound)
    }

    async fn active_client(&self, user_id: Uuid, client_id: Uuid) -> ServiceResult<Client> {
        let client = self.owned_client(user_id, client_id).await?;
        if !client.is_active() {
            return Err(ServiceError::ClientNotActive);
        }
        Ok(client)
    }
}

fn validate(input: &TaskInput) -> ServiceResult<()> {
    if input.title.trim().is_empty() {
        return Err(ServiceError::InvalidInput("Task title is required".to_string()));
    }
    let hours = [input.estimated_hours, input.actual_hours, input.hourly_rate];
    if hours.iter().any(|value| !value.is_finite() || *value < 0.0) {
        return Err(ServiceError::InvalidInput(
            "Hours and rates must be non-negative".to_string(),
        ));
    }
    Ok(())
}
