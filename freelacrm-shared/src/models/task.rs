/// Task model and database operations
///
/// Tasks are units of billable work performed for a client. A task always
/// references a client owned by the same user as the task itself.
///
/// # Status Flow
///
/// ```text
/// todo ──> in_progress ──> review ──> completed
///   │           │             │
///   └───────────┴─────────────┴────> cancelled
/// ```
///
/// Transitions are not restricted, but entering `in_progress`, `review` or
/// `completed` stamps `start_date` once, and entering `completed` stamps
/// `end_date` once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, user_id, client_id, title, description, status, priority, \
     due_date, start_date, end_date, estimated_hours, actual_hours, hourly_rate, \
     created_at, updated_at, deleted_at";

/// Task progress status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(TaskStatus::Todo),
            "in_progress" => Some(TaskStatus::InProgress),
            "review" => Some(TaskStatus::Review),
            "completed" => Some(TaskStatus::Completed),
            "cancelled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether work has begun once a task reaches this status
    pub fn is_started(&self) -> bool {
        matches!(
            self,
            TaskStatus::InProgress | TaskStatus::Review | TaskStatus::Completed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Client the work is done for (owned by `user_id`)
    pub client_id: Uuid,

    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,

    /// First time the task entered a started status
    pub start_date: Option<DateTime<Utc>>,

    /// First time the task was completed
    pub end_date: Option<DateTime<Utc>>,

    pub estimated_hours: f64,
    pub actual_hours: f64,
    pub hourly_rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing, default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Mutable task fields, as supplied on create and update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskInput {
    pub client_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Ignored on create (new tasks start in `todo`); left unchanged on update when absent
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_hours: f64,
    #[serde(default)]
    pub actual_hours: f64,
    #[serde(default)]
    pub hourly_rate: f64,
}

impl Task {
    /// Builds a new `todo` task owned by `user_id`
    pub fn new(user_id: Uuid, input: TaskInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            client_id: input.client_id,
            title: input.title,
            description: input.description,
            status: TaskStatus::Todo,
            priority: input.priority.unwrap_or_default(),
            due_date: input.due_date,
            start_date: None,
            end_date: None,
            estimated_hours: input.estimated_hours,
            actual_hours: input.actual_hours,
            hourly_rate: input.hourly_rate,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Overwrites the mutable fields with `input`
    ///
    /// The client reference is copied as given; callers re-validate it first.
    pub fn apply(&mut self, input: TaskInput, now: DateTime<Utc>) {
        self.client_id = input.client_id;
        self.title = input.title;
        self.description = input.description;
        if let Some(priority) = input.priority {
            self.priority = priority;
        }
        self.due_date = input.due_date;
        self.estimated_hours = input.estimated_hours;
        self.actual_hours = input.actual_hours;
        self.hourly_rate = input.hourly_rate;
        if let Some(status) = input.status {
            self.set_status(status, now);
        }
    }

    /// Moves the task to `status`, stamping start and end dates the first time
    pub fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        self.status = status;
        if status.is_started() && self.start_date.is_none() {
            self.start_date = Some(now);
        }
        if status == TaskStatus::Completed && self.end_date.is_none() {
            self.end_date = Some(now);
        }
    }

    /// Billable total: hourly rate times actual hours
    pub fn total(&self) -> f64 {
        self.hourly_rate * self.actual_hours
    }

    /// Inserts a task row
    pub async fn insert(pool: &PgPool, task: &Task) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO tasks (id, user_id, client_id, title, description, status, priority,
                               due_date, start_date, end_date, estimated_hours, actual_hours,
                               hourly_rate, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {TASK_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(task.id)
            .bind(task.user_id)
            .bind(task.client_id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status)
            .bind(task.priority)
            .bind(task.due_date)
            .bind(task.start_date)
            .bind(task.end_date)
            .bind(task.estimated_hours)
            .bind(task.actual_hours)
            .bind(task.hourly_rate)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(pool)
            .await
    }

    /// Overwrites every mutable column of a live task
    pub async fn save(pool: &PgPool, task: &Task) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE tasks
            SET client_id = $2, title = $3, description = $4, status = $5, priority = $6,
                due_date = $7, start_date = $8, end_date = $9, estimated_hours = $10,
                actual_hours = $11, hourly_rate = $12, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {TASK_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(task.id)
            .bind(task.client_id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status)
            .bind(task.priority)
            .bind(task.due_date)
            .bind(task.start_date)
            .bind(task.end_date)
            .bind(task.estimated_hours)
            .bind(task.actual_hours)
            .bind(task.hourly_rate)
            .fetch_optional(pool)
            .await
    }

    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE tasks SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query =
            format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND deleted_at IS NULL");

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a user's live tasks, optionally filtered by status, newest first
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        status: Option<TaskStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE user_id = $1 AND ($2::task_status IS NULL OR status = $2) AND deleted_at IS NULL
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Counts a user's live tasks, optionally filtered by status
    pub async fn count_by_user(
        pool: &PgPool,
        user_id: Uuid,
        status: Option<TaskStatus>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM tasks
            WHERE user_id = $1 AND ($2::task_status IS NULL OR status = $2) AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(pool)
        .await
    }

    /// Lists a client's live tasks, newest first
    pub async fn list_by_client(
        pool: &PgPool,
        client_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE client_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(client_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_by_client(pool: &PgPool, client_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks WHERE client_id = $1 AND deleted_at IS NULL",
        )
        .bind(client_id)
        .fetch_one(pool)
        .await
    }

    /// Lists unfinished tasks due in `[from, until]`, soonest first
    pub async fn list_due_between(
        pool: &PgPool,
        user_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE user_id = $1 AND due_date BETWEEN $2 AND $3
              AND status <> 'completed' AND deleted_at IS NULL
            ORDER BY due_date ASC
            "#
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .bind(from)
            .bind(until)
            .fetch_all(pool)
            .await
    }
}
