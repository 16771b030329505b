/// Profile of the authenticated user

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use freelacrm_shared::{auth::middleware::AuthContext, models::user::User, quota::QuotaUsage};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
    pub usage: QuotaUsage,
}

/// `GET /api/v1/user/profile`: the account plus plan usage
pub async fn profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = state.services.sessions.get_user_by_id(auth.user_id).await?;
    let usage = state.services.quota.usage(auth.user_id).await?;

    Ok(Json(ProfileResponse { user, usage }))
}
