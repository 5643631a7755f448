// handlers/protected/organization.rs - /api/organization

use axum::Extension;
use serde::Deserialize;

use crate::database::models::Organization;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, Session};
use crate::services::organization_service::OrganizationUsage;
use crate::services::OrganizationService;

#[derive(Debug, Deserialize)]
pub struct UpdateOrganizationRequest {
    pub name: String,
}

pub async fn organization_get(Extension(session): Extension<Session>) -> ApiResult<Organization> {
    let organization = OrganizationService::new().await?.get(session.organization_id).await?;
    Ok(ApiResponse::success(organization))
}

pub async fn organization_patch(
    Extension(session): Extension<Session>,
    ApiJson(request): ApiJson<UpdateOrganizationRequest>,
) -> ApiResult<Organization> {
    let organization = OrganizationService::new().await?.rename(&session, &request.name).await?;
    Ok(ApiResponse::success(organization))
}

/// Current counts next to the plan limits
pub async fn organization_usage_get(
    Extension(session): Extension<Session>,
) -> ApiResult<OrganizationUsage> {
    let usage = OrganizationService::new().await?.usage(session.organization_id).await?;
    Ok(ApiResponse::success(usage))
}
