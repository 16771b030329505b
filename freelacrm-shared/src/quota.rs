/// Plan-based resource quotas
///
/// Before a client or task is created the policy counts the user's existing
/// resources and compares the count against the ceiling for the user's plan.
/// Counts are read from the store on every check; nothing is cached.
///
/// # Quota Limits by Plan
///
/// | Plan  | Clients   | Tasks in `todo` |
/// |-------|-----------|-----------------|
/// | free  | 5         | 10              |
/// | basic | 20        | 50              |
/// | pro   | unlimited | unlimited       |
///
/// Only tasks still in `todo` count toward the task ceiling; moving a task
/// forward frees a slot. Soft-deleted records never count.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use freelacrm_shared::quota::QuotaPolicy;
/// use freelacrm_shared::store::MemoryStore;
/// use uuid::Uuid;
///
/// # async fn example(user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let policy = QuotaPolicy::new(Arc::new(MemoryStore::new()));
///
/// // Errors with ClientLimitExceeded once the plan ceiling is reached
/// policy.can_create_client(user_id).await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::models::task::TaskStatus;
use crate::models::user::UserPlan;
use crate::store::Store;

/// Type of quota to check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaType {
    /// Live clients
    Clients,

    /// Live tasks in `todo`
    TodoTasks,
}

impl QuotaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaType::Clients => "clients",
            QuotaType::TodoTasks => "todo_tasks",
        }
    }
}

/// Ceilings for one plan; `None` means unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaLimits {
    pub clients: Option<i64>,
    pub todo_tasks: Option<i64>,
}

impl QuotaLimits {
    pub fn for_plan(plan: UserPlan) -> Self {
        match plan {
            UserPlan::Free => QuotaLimits {
                clients: Some(5),
                todo_tasks: Some(10),
            },
            UserPlan::Basic => QuotaLimits {
                clients: Some(20),
                todo_tasks: Some(50),
            },
            UserPlan::Pro => QuotaLimits {
                clients: None,
                todo_tasks: None,
            },
        }
    }

    pub fn get(&self, quota_type: QuotaType) -> Option<i64> {
        match quota_type {
            QuotaType::Clients => self.clients,
            QuotaType::TodoTasks => self.todo_tasks,
        }
    }
}

/// Result of a quota check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaCheckResult {
    /// Whether one more resource may be created
    pub allowed: bool,

    /// Current usage
    pub current: i64,

    /// Ceiling, `None` when unlimited
    pub limit: Option<i64>,
}

impl QuotaCheckResult {
    pub fn evaluate(current: i64, limit: Option<i64>) -> Self {
        QuotaCheckResult {
            allowed: limit.map_or(true, |limit| current < limit),
            current,
            limit,
        }
    }

    /// Slots left, `None` when unlimited
    pub fn remaining(&self) -> Option<i64> {
        self.limit.map(|limit| (limit - self.current).max(0))
    }
}

/// Current usage for every quota, as shown on the profile
#[derive(Debug, Clone, Serialize)]
pub struct QuotaUsage {
    pub plan: UserPlan,
    pub clients: QuotaCheckResult,
    pub todo_tasks: QuotaCheckResult,
}

/// Quota enforcement service
#[derive(Clone)]
pub struct QuotaPolicy {
    store: Arc<dyn Store>,
}

impl QuotaPolicy {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Checks a user's usage against their plan ceiling
    ///
    /// # Errors
    ///
    /// `UserNotFound` if the user does not exist, `Store` on storage failure
    pub async fn check(&self, user_id: Uuid, quota_type: QuotaType) -> ServiceResult<QuotaCheckResult> {
        let plan = self.plan_of(user_id).await?;
        self.check_for_plan(user_id, plan, quota_type).await
    }

    /// Fails with `ClientLimitExceeded` if the user is at their client ceiling
    pub async fn can_create_client(&self, user_id: Uuid) -> ServiceResult<()> {
        let result = self.check(user_id, QuotaType::Clients).await?;
        match (result.allowed, result.limit) {
            (false, Some(limit)) => Err(ServiceError::ClientLimitExceeded { limit }),
            _ => Ok(()),
        }
    }

    /// Fails with `TaskLimitExceeded` if the user is at their `todo` task ceiling
    pub async fn can_create_task(&self, user_id: Uuid) -> ServiceResult<()> {
        let result = self.check(user_id, QuotaType::TodoTasks).await?;
        match (result.allowed, result.limit) {
            (false, Some(limit)) => Err(ServiceError::TaskLimitExceeded { limit }),
            _ => Ok(()),
        }
    }

    /// Usage across every quota
    pub async fn usage(&self, user_id: Uuid) -> ServiceResult<QuotaUsage> {
        let plan = self.plan_of(user_id).await?;

        Ok(QuotaUsage {
            plan,
            clients: self.check_for_plan(user_id, plan, QuotaType::Clients).await?,
            todo_tasks: self.check_for_plan(user_id, plan, QuotaType::TodoTasks).await?,
        })
    }

    async fn plan_of(&self, user_id: Uuid) -> ServiceResult<UserPlan> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;
        Ok(user.plan)
    }

    async fn check_for_plan(
        &self,
        user_id: Uuid,
        plan: UserPlan,
        quota_type: QuotaType,
    ) -> ServiceResult<QuotaCheckResult> {
        let limit = QuotaLimits::for_plan(plan).get(quota_type);
        let current = match quota_type {
            QuotaType::Clients => self.store.count_clients(user_id).await?,
            QuotaType::TodoTasks => {
                self.store
                    .count_tasks(user_id, Some(TaskStatus::Todo))
                    .await?
            }
        };

        let result = QuotaCheckResult::evaluate(current, limit);
        debug!(
            user_id = %user_id,
            quota = quota_type.as_str(),
            current,
            limit = ?limit,
            allowed = result.allowed,
            "Quota checked"
        );

        Ok(result)
    }
}
