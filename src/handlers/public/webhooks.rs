// handlers/public/webhooks.rs - POST /webhooks/video
//
// Status callbacks from the video hosting provider. Authenticated with the
// shared secret in `x-webhook-secret` rather than a JWT.

use axum::{http::HeaderMap, Extension};

use crate::config;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::upload_service::{webhook_secret_matches, WebhookOutcome, WebhookPayload};
use crate::services::UploadService;
use crate::video::SharedVideoProvider;

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

pub async fn video_webhook_post(
    Extension(provider): Extension<SharedVideoProvider>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<WebhookPayload>,
) -> ApiResult<WebhookOutcome> {
    let expected = &config::config().video.webhook_secret;
    if expected.is_empty() {
        return Err(ApiError::service_unavailable("Video webhook secret is not configured"));
    }

    let provided = headers.get(WEBHOOK_SECRET_HEADER).and_then(|v| v.to_str().ok());
    if !webhook_secret_matches(expected, provided) {
        tracing::warn!(event = %payload.kind, "Rejected video webhook with bad secret");
        return Err(ApiError::unauthorized("Invalid webhook secret"));
    }

    let outcome = UploadService::new(provider).await?.handle_webhook(&payload).await?;
    Ok(ApiResponse::success(outcome))
}
