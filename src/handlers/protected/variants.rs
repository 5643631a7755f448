// handlers/protected/variants.rs - /api/variants/:id

use axum::{extract::Path, Extension};
use uuid::Uuid;

use crate::database::models::Variant;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, Session};
use crate::services::embed_service::VariantChanges;
use crate::services::EmbedService;

pub async fn variant_patch(
    Extension(session): Extension<Session>,
    Path(variant_id): Path<Uuid>,
    ApiJson(changes): ApiJson<VariantChanges>,
) -> ApiResult<Variant> {
    let variant = EmbedService::new()
        .await?
        .update_variant(&session, variant_id, changes)
        .await?;
    Ok(ApiResponse::success(variant))
}

pub async fn variant_delete(
    Extension(session): Extension<Session>,
    Path(variant_id): Path<Uuid>,
) -> ApiResult<()> {
    EmbedService::new().await?.delete_variant(&session, variant_id).await?;
    Ok(ApiResponse::no_content())
}
