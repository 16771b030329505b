/// Client endpoints
///
/// All handlers run behind bearer authentication and only ever see the
/// caller's own clients; anything else answers `404`.

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
use freelacrm_shared::{
    auth::middleware::AuthContext,
    models::client::{Client, ClientInput, ClientStatus},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Body of create and update; update overwrites every field
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClientRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 100, message = "Company must be at most 100 characters"))]
    pub company: Option<String>,

    pub address: Option<String>,

    pub notes: Option<String>,

    pub status: Option<ClientStatus>,
}

impl From<ClientRequest> for ClientInput {
    fn from(req: ClientRequest) -> Self {
        ClientInput {
            name: req.name.trim().to_string(),
            email: req.email.unwrap_or_default(),
            phone: req.phone.unwrap_or_default(),
            company: req.company.unwrap_or_default(),
            address: req.address.unwrap_or_default(),
            notes: req.notes.unwrap_or_default(),
            status: req.status,
        }
    }
}

pub async fn create_client(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidJson(req): ValidJson<ClientRequest>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    let client = state.services.clients.create(auth.user_id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn list_clients(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<ListResponse<Client>>> {
    let page = state.services.clients.list(auth.user_id, page.into()).await?;
    Ok(Json(page.into()))
}

pub async fn get_client(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Client>> {
    Ok(Json(state.services.clients.get(auth.user_id, id).await?))
}

pub async fn update_client(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(req): ValidJson<ClientRequest>,
) -> ApiResult<Json<Client>> {
    let client = state
        .services
        .clients
        .update(auth.user_id, id, req.into())
        .await?;
    Ok(Json(client))
}

pub async fn delete_client(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.clients.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
