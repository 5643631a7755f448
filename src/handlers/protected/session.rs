// handlers/protected/session.rs - GET /api/session

use axum::Extension;
use serde::Serialize;

use crate::database::models::Organization;
use crate::middleware::{ApiResponse, ApiResult, Session};
use crate::services::OrganizationService;

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub user: Session,
    pub organization: Organization,
}

/// Who am I, in which organization, with which role
pub async fn session_get(Extension(session): Extension<Session>) -> ApiResult<SessionInfo> {
    let organization = OrganizationService::new().await?.get(session.organization_id).await?;
    Ok(ApiResponse::success(SessionInfo {
        user: session,
        organization,
    }))
}
