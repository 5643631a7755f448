// handlers/elevated/organizations.rs - /api/internal/organizations

use axum::{extract::Path, Extension};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::Organization;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, InternalUser};
use crate::services::organization_service::{CreatedOrganization, OrganizationSummary};
use crate::services::OrganizationService;

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub slug: String,
    pub plan: Option<String>,
    pub owner_email: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePlanRequest {
    pub plan: String,
}

pub async fn organizations_get() -> ApiResult<Vec<OrganizationSummary>> {
    let organizations = OrganizationService::new().await?.list_all().await?;
    Ok(ApiResponse::success(organizations))
}

/// Provision a tenant together with its first owner
pub async fn organizations_post(
    Extension(staff): Extension<InternalUser>,
    ApiJson(request): ApiJson<CreateOrganizationRequest>,
) -> ApiResult<CreatedOrganization> {
    let created = OrganizationService::new()
        .await?
        .create_with_owner(
            &request.name,
            &request.slug,
            request.plan.as_deref(),
            &request.owner_email,
        )
        .await?;
    tracing::info!(
        staff = %staff.email,
        organization_id = %created.organization.id,
        "Organization provisioned"
    );
    Ok(ApiResponse::created(created))
}

pub async fn organization_plan_patch(
    Extension(staff): Extension<InternalUser>,
    Path(organization_id): Path<Uuid>,
    ApiJson(request): ApiJson<ChangePlanRequest>,
) -> ApiResult<Organization> {
    let organization = OrganizationService::new()
        .await?
        .set_plan(organization_id, &request.plan)
        .await?;
    tracing::info!(
        staff = %staff.email,
        organization_id = %organization.id,
        plan = %organization.plan,
        "Plan changed by staff"
    );
    Ok(ApiResponse::success(organization))
}
