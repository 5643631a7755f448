// handlers/protected/invites.rs - /api/invites

use axum::{extract::Path, Extension};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::Invite;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, Session};
use crate::services::invite_service::CreatedInvite;
use crate::services::InviteService;

#[derive(Debug, Deserialize)]
pub struct CreateInviteRequest {
    pub email: String,
    pub role: String,
}

pub async fn invites_get(Extension(session): Extension<Session>) -> ApiResult<Vec<Invite>> {
    let invites = InviteService::new().await?.list_pending(session.organization_id).await?;
    Ok(ApiResponse::success(invites))
}

/// The raw token is only ever returned here
pub async fn invites_post(
    Extension(session): Extension<Session>,
    ApiJson(request): ApiJson<CreateInviteRequest>,
) -> ApiResult<CreatedInvite> {
    let created = InviteService::new()
        .await?
        .create(&session, &request.email, &request.role)
        .await?;
    Ok(ApiResponse::created(created))
}

pub async fn invite_delete(
    Extension(session): Extension<Session>,
    Path(invite_id): Path<Uuid>,
) -> ApiResult<()> {
    InviteService::new().await?.revoke(&session, invite_id).await?;
    Ok(ApiResponse::no_content())
}
