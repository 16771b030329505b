/// Payment endpoints

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
    models::payment::{Payment, PaymentInput, PaymentMethod, PaymentStatus},
    services::PaymentSummary,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Body of create and update; update overwrites every field
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentRequest {
    pub client_id: Uuid,

    pub task_id: Option<Uuid>,

    /// Must be greater than zero
    pub amount: f64,

    /// ISO 4217 code, defaults to USD
    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: Option<String>,

    /// Ignored on create
    pub status: Option<PaymentStatus>,

    pub method: Option<PaymentMethod>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 50, message = "Invoice number must be at most 50 characters"))]
    pub invoice_number: Option<String>,

    pub due_date: DateTime<Utc>,

    pub paid_date: Option<DateTime<Utc>>,
}

impl From<PaymentRequest> for PaymentInput {
    fn from(req: PaymentRequest) -> Self {
        PaymentInput {
            client_id: req.client_id,
            task_id: req.task_id,
            amount: req.amount,
            currency: req.currency,
            status: req.status,
            method: req.method,
            description: req.description.unwrap_or_default(),
            invoice_number: req.invoice_number.unwrap_or_default(),
            due_date: req.due_date,
            paid_date: req.paid_date,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaymentFilter {
    pub status: Option<PaymentStatus>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PayRequest {
    pub paid_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SummaryQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub updated: u64,
}

pub async fn create_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidJson(req): ValidJson<PaymentRequest>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let payment = state
        .services
        .payments
        .create(auth.user_id, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// `GET /payments?status=&page=&page_size=`
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(page): ApiQuery<PageQuery>,
    ApiQuery(filter): ApiQuery<PaymentFilter>,
) -> ApiResult<Json<ListResponse<Payment>>> {
    let page = state
        .services
        .payments
        .list(auth.user_id, filter.status, page.into())
        .await?;
    Ok(Json(page.into()))
}

/// `GET /clients/:id/payments`
pub async fn list_client_payments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(client_id): ApiPath<Uuid>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<ListResponse<Payment>>> {
    let page = state
        .services
        .payments
        .list_by_client(auth.user_id, client_id, page.into())
        .await?;
    Ok(Json(page.into()))
}

/// `GET /payments/task/:task_id`
pub async fn list_task_payments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<Uuid>,
) -> ApiResult<Json<ListResponse<Payment>>> {
    let payments = state
        .services
        .payments
        .list_by_task(auth.user_id, task_id)
        .await?;
    Ok(Json(ListResponse::all(payments)))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Payment>> {
    Ok(Json(state.services.payments.get(auth.user_id, id).await?))
}

pub async fn update_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(req): ValidJson<PaymentRequest>,
) -> ApiResult<Json<Payment>> {
    let payment = state
        .services
        .payments
        .update(auth.user_id, id, req.into())
        .await?;
    Ok(Json(payment))
}

pub async fn delete_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.payments.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /payments/:id/pay`; the body is optional and `paid_date` defaults to now
pub async fn mark_payment_paid(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    body: Option<Json<PayRequest>>,
) -> ApiResult<Json<Payment>> {
    let Json(req) = body.unwrap_or_default();
    let payment = state
        .services
        .payments
        .mark_as_paid(auth.user_id, id, req.paid_date)
        .await?;
    Ok(Json(payment))
}

/// `GET /payments/overdue`
pub async fn overdue_payments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ListResponse<Payment>>> {
    let payments = state.services.payments.overdue(auth.user_id).await?;
    Ok(Json(ListResponse::all(payments)))
}

/// `POST /payments/overdue/refresh`: persist the overdue status
pub async fn refresh_overdue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<RefreshResponse>> {
    let updated = state.services.payments.refresh_overdue(auth.user_id).await?;
    Ok(Json(RefreshResponse { updated }))
}

/// `GET /payments/summary?start=&end=` with RFC 3339 timestamps
pub async fn payment_summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> ApiResult<Json<PaymentSummary>> {
    let summary = state
        .services
        .payments
        .summary(auth.user_id, query.start, query.end)
        .await?;
    Ok(Json(summary))
}
