// handlers/protected/users.rs - /api/users

use axum::{extract::Path, Extension};
use serde::Deserialize;
use uuid::Uuid;

use crate::authz::Role;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, Session};
use crate::services::UserService;

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

pub async fn users_get(Extension(session): Extension<Session>) -> ApiResult<Vec<User>> {
    let users = UserService::new().await?.list(session.organization_id).await?;
    Ok(ApiResponse::success(users))
}

pub async fn user_role_patch(
    Extension(session): Extension<Session>,
    Path(user_id): Path<Uuid>,
    ApiJson(request): ApiJson<ChangeRoleRequest>,
) -> ApiResult<User> {
    let role = Role::parse(&request.role)
        .ok_or_else(|| ApiError::invalid_field("role", "unknown role"))?;
    let user = UserService::new().await?.change_role(&session, user_id, role).await?;
    Ok(ApiResponse::success(user))
}

pub async fn user_delete(
    Extension(session): Extension<Session>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<()> {
    UserService::new().await?.remove(&session, user_id).await?;
    Ok(ApiResponse::no_content())
}
