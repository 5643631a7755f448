// handlers/protected/uploads.rs - /api/variants/:id/upload[/sync]
//
// The browser uploads the file straight to the provider using the returned URL;
// the variant then moves forward through the webhook or an explicit sync.

use axum::{extract::Path, Extension};
use uuid::Uuid;

use crate::database::models::Variant;
use crate::middleware::{ApiResponse, ApiResult, Session};
use crate::services::upload_service::UploadTicket;
use crate::services::UploadService;
use crate::video::SharedVideoProvider;

pub async fn upload_post(
    Extension(session): Extension<Session>,
    Extension(provider): Extension<SharedVideoProvider>,
    Path(variant_id): Path<Uuid>,
) -> ApiResult<UploadTicket> {
    let ticket = UploadService::new(provider)
        .await?
        .start_upload(&session, variant_id)
        .await?;
    Ok(ApiResponse::created(ticket))
}

pub async fn upload_sync_post(
    Extension(session): Extension<Session>,
    Extension(provider): Extension<SharedVideoProvider>,
    Path(variant_id): Path<Uuid>,
) -> ApiResult<Variant> {
    let variant = UploadService::new(provider)
        .await?
        .sync_upload(&session, variant_id)
        .await?;
    Ok(ApiResponse::success(variant))
}
