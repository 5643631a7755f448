// handlers/public/embed.rs - GET /embed/:id and POST /embed/:id/views
//
// Consumed by the player script on customer sites, so only published embeds
// and ready variants are visible.

use axum::extract::Path;
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, OptionalApiJson};
use crate::services::embed_service::{PublicEmbed, ViewCounts};
use crate::services::EmbedService;

#[derive(Debug, Default, Deserialize)]
pub struct ViewRequest {
    pub variant_id: Option<Uuid>,
}

pub async fn embed_get(Path(embed_id): Path<Uuid>) -> ApiResult<PublicEmbed> {
    let embed = EmbedService::new().await?.public_embed(embed_id).await?;
    Ok(ApiResponse::success(embed))
}

pub async fn embed_views_post(
    Path(embed_id): Path<Uuid>,
    OptionalApiJson(body): OptionalApiJson<ViewRequest>,
) -> ApiResult<ViewCounts> {
    let request = body.unwrap_or_default();
    let counts = EmbedService::new()
        .await?
        .record_view(embed_id, request.variant_id)
        .await?;
    Ok(ApiResponse::success(counts))
}
