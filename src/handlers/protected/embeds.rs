// handlers/protected/embeds.rs - /api/embeds

use axum::{extract::Path, Extension};
use serde::Deserialize;
use uuid::Uuid;

use super::ReorderRequest;
use crate::database::models::{Embed, Group};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, Session};
use crate::services::embed_service::{EmbedChanges, EmbedDetail};
use crate::services::EmbedService;

#[derive(Debug, Deserialize)]
pub struct CreateEmbedRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub title: String,
}

pub async fn embeds_get(Extension(session): Extension<Session>) -> ApiResult<Vec<Embed>> {
    let embeds = EmbedService::new().await?.list_embeds(session.organization_id).await?;
    Ok(ApiResponse::success(embeds))
}

pub async fn embeds_post(
    Extension(session): Extension<Session>,
    ApiJson(request): ApiJson<CreateEmbedRequest>,
) -> ApiResult<Embed> {
    let embed = EmbedService::new()
        .await?
        .create_embed(&session, &request.name, request.description.as_deref())
        .await?;
    Ok(ApiResponse::created(embed))
}

/// Embed with its groups and their variants, all in display order
pub async fn embed_get(
    Extension(session): Extension<Session>,
    Path(embed_id): Path<Uuid>,
) -> ApiResult<EmbedDetail> {
    let detail = EmbedService::new().await?.get_embed(session.organization_id, embed_id).await?;
    Ok(ApiResponse::success(detail))
}

pub async fn embed_patch(
    Extension(session): Extension<Session>,
    Path(embed_id): Path<Uuid>,
    ApiJson(changes): ApiJson<EmbedChanges>,
) -> ApiResult<Embed> {
    let embed = EmbedService::new().await?.update_embed(&session, embed_id, changes).await?;
    Ok(ApiResponse::success(embed))
}

pub async fn embed_delete(
    Extension(session): Extension<Session>,
    Path(embed_id): Path<Uuid>,
) -> ApiResult<()> {
    EmbedService::new().await?.delete_embed(&session, embed_id).await?;
    Ok(ApiResponse::no_content())
}

pub async fn groups_post(
    Extension(session): Extension<Session>,
    Path(embed_id): Path<Uuid>,
    ApiJson(request): ApiJson<CreateGroupRequest>,
) -> ApiResult<Group> {
    let group = EmbedService::new()
        .await?
        .create_group(&session, embed_id, &request.title)
        .await?;
    Ok(ApiResponse::created(group))
}

pub async fn groups_order_put(
    Extension(session): Extension<Session>,
    Path(embed_id): Path<Uuid>,
    ApiJson(request): ApiJson<ReorderRequest>,
) -> ApiResult<()> {
    EmbedService::new()
        .await?
        .reorder_groups(&session, embed_id, &request.items)
        .await?;
    Ok(ApiResponse::no_content())
}
