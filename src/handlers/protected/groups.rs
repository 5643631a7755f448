// handlers/protected/groups.rs - /api/groups/:id

use axum::{extract::Path, Extension};
use serde::Deserialize;
use uuid::Uuid;

use super::ReorderRequest;
use crate::database::models::{Group, Variant};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, Session};
use crate::services::EmbedService;

#[derive(Debug, Deserialize)]
pub struct UpdateGroupRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateVariantRequest {
    pub language: String,
    pub title: Option<String>,
}

pub async fn group_patch(
    Extension(session): Extension<Session>,
    Path(group_id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateGroupRequest>,
) -> ApiResult<Group> {
    let group = EmbedService::new()
        .await?
        .update_group(&session, group_id, &request.title)
        .await?;
    Ok(ApiResponse::success(group))
}

pub async fn group_delete(
    Extension(session): Extension<Session>,
    Path(group_id): Path<Uuid>,
) -> ApiResult<()> {
    EmbedService::new().await?.delete_group(&session, group_id).await?;
    Ok(ApiResponse::no_content())
}

pub async fn variants_post(
    Extension(session): Extension<Session>,
    Path(group_id): Path<Uuid>,
    ApiJson(request): ApiJson<CreateVariantRequest>,
) -> ApiResult<Variant> {
    let variant = EmbedService::new()
        .await?
        .create_variant(&session, group_id, &request.language, request.title.as_deref())
        .await?;
    Ok(ApiResponse::created(variant))
}

pub async fn variants_order_put(
    Extension(session): Extension<Session>,
    Path(group_id): Path<Uuid>,
    ApiJson(request): ApiJson<ReorderRequest>,
) -> ApiResult<()> {
    EmbedService::new()
        .await?
        .reorder_variants(&session, group_id, &request.items)
        .await?;
    Ok(ApiResponse::no_content())
}
