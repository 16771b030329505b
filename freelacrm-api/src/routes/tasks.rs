/// Task endpoints

use crate::{
    app::AppState,
    error::ApiResult,
    routes::{
        extract::{ApiPath, ApiQuery, ValidJson},
        ListResponse, PageQuery,
    },
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use freelacrm_shared::{
    auth::middleware::AuthContext,
    models::task::{Task, TaskInput, TaskPriority, TaskStatus},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

const DEFAULT_UPCOMING_DAYS: i64 = 7;

/// Body of create and update; update overwrites every field
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TaskRequest {
    pub client_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    pub description: Option<String>,

    /// Ignored on create
    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    pub due_date: Option<DateTime<Utc>>,

    #[validate(range(min = 0.0, message = "Must not be negative"))]
    pub estimated_hours: Option<f64>,

    #[validate(range(min = 0.0, message = "Must not be negative"))]
    pub actual_hours: Option<f64>,

    #[validate(range(min = 0.0, message = "Must not be negative"))]
    pub hourly_rate: Option<f64>,
}

impl From<TaskRequest> for TaskInput {
    fn from(req: TaskRequest) -> Self {
        TaskInput {
            client_id: req.client_id,
            title: req.title.trim().to_string(),
            description: req.description.unwrap_or_default(),
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            estimated_hours: req.estimated_hours.unwrap_or_default(),
            actual_hours: req.actual_hours.unwrap_or_default(),
            hourly_rate: req.hourly_rate.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UpcomingQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct StatusRequest {
    pub status: TaskStatus,
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidJson(req): ValidJson<TaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state.services.tasks.create(auth.user_id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// `GET /tasks?status=&page=&page_size=`
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(page): ApiQuery<PageQuery>,
    ApiQuery(filter): ApiQuery<TaskFilter>,
) -> ApiResult<Json<ListResponse<Task>>> {
    let page = state
        .services
        .tasks
        .list(auth.user_id, filter.status, page.into())
        .await?;
    Ok(Json(page.into()))
}

/// `GET /clients/:id/tasks`
pub async fn list_client_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(client_id): ApiPath<Uuid>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<ListResponse<Task>>> {
    let page = state
        .services
        .tasks
        .list_by_client(auth.user_id, client_id, page.into())
        .await?;
    Ok(Json(page.into()))
}

/// `GET /tasks/upcoming?days=`; `days` defaults to 7
pub async fn upcoming_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<UpcomingQuery>,
) -> ApiResult<Json<ListResponse<Task>>> {
    let days = query.days.unwrap_or(DEFAULT_UPCOMING_DAYS);
    let tasks = state.services.tasks.upcoming(auth.user_id, days).await?;
    Ok(Json(ListResponse::all(tasks)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.services.tasks.get(auth.user_id, id).await?))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(req): ValidJson<TaskRequest>,
) -> ApiResult<Json<Task>> {
    let task = state
        .services
        .tasks
        .update(auth.user_id, id, req.into())
        .await?;
    Ok(Json(task))
}

/// `PATCH /tasks/:id/status`
pub async fn change_task_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(req): ValidJson<StatusRequest>,
) -> ApiResult<Json<Task>> {
    let task = state
        .services
        .tasks
        .change_status(auth.user_id, id, req.status)
        .await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.tasks.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
