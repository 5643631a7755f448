use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use super::{EmbedService, ServiceError};
use crate::authz;
use crate::config;
use crate::database::models::Variant;
use crate::database::DatabaseManager;
use crate::middleware::Session;
use crate::types::VariantStatus;
use crate::video::VideoProvider;

const VARIANT_COLUMNS: &str = "id, organization_id, group_id, language, title, sort_order, \
     upload_id, asset_id, playback_id, status, duration_seconds, view_count, \
     created_at, updated_at";

/// Returned to the dashboard so the browser can PUT the file directly to the provider
#[derive(Debug, Clone, Serialize)]
pub struct UploadTicket {
    pub variant: Variant,
    pub upload_url: String,
}

/// Raw webhook body as the provider posts it
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VideoEvent {
    AssetCreated {
        upload_id: String,
        asset_id: String,
    },
    AssetReady {
        asset_id: String,
        upload_id: Option<String>,
        playback_id: Option<String>,
        duration_seconds: Option<f64>,
    },
    AssetErrored {
        asset_id: String,
        upload_id: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookOutcome {
    pub event: String,
    pub handled: bool,
    pub variants_updated: u64,
}

#[derive(Deserialize)]
struct UploadData {
    id: String,
    asset_id: Option<String>,
}

#[derive(Deserialize)]
struct AssetData {
    id: String,
    upload_id: Option<String>,
    #[serde(default)]
    playback_ids: Vec<PlaybackId>,
    duration: Option<f64>,
}

#[derive(Deserialize)]
struct PlaybackId {
    id: String,
}

impl WebhookPayload {
    /// Typed view of the event; `Ok(None)` for event types we do not track
    pub fn parse(&self) -> Result<Option<VideoEvent>, serde_json::Error> {
        let event = match self.kind.as_str() {
            "video.upload.asset_created" => {
                let data: UploadData = serde_json::from_value(self.data.clone())?;
                match data.asset_id {
                    Some(asset_id) => Some(VideoEvent::AssetCreated {
                        upload_id: data.id,
                        asset_id,
                    }),
                    None => None,
                }
            }
            "video.asset.ready" => {
                let data: AssetData = serde_json::from_value(self.data.clone())?;
                Some(VideoEvent::AssetReady {
                    asset_id: data.id,
                    upload_id: data.upload_id,
                    playback_id: data.playback_ids.into_iter().next().map(|p| p.id),
                    duration_seconds: data.duration,
                })
            }
            "video.asset.errored" => {
                let data: AssetData = serde_json::from_value(self.data.clone())?;
                Some(VideoEvent::AssetErrored {
                    asset_id: data.id,
                    upload_id: data.upload_id,
                })
            }
            _ => None,
        };
        Ok(event)
    }
}

pub struct UploadService {
    pool: PgPool,
    provider: Arc<dyn VideoProvider>,
}

impl UploadService {
    pub async fn new(provider: Arc<dyn VideoProvider>) -> Result<Self, ServiceError> {
        Ok(Self::from_pool(DatabaseManager::pool().await?, provider))
    }

    pub fn from_pool(pool: PgPool, provider: Arc<dyn VideoProvider>) -> Self {
        Self { pool, provider }
    }

    /// Issue a fresh direct-upload URL for a variant. Any previous asset is detached.
    pub async fn start_upload(
        &self,
        session: &Session,
        variant_id: Uuid,
    ) -> Result<UploadTicket, ServiceError> {
        authz::require_content_editor(session)?;

        // Ownership check before spending a provider call
        EmbedService::from_pool(self.pool.clone())
            .get_variant(session.organization_id, variant_id)
            .await?;

        let upload = self.provider.create_upload(&config::config().video.cors_origin).await?;

        let variant = sqlx::query_as::<_, Variant>(&format!(
            r#"
            UPDATE video_variants
            SET upload_id = $3, asset_id = NULL, playback_id = NULL, duration_seconds = NULL,
                status = $4, updated_at = now()
            WHERE id = $1 AND organization_id = $2
            RETURNING {}
            "#,
            VARIANT_COLUMNS
        ))
        .bind(variant_id)
        .bind(session.organization_id)
        .bind(&upload.id)
        .bind(VariantStatus::Uploading.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Variant"))?;

        tracing::info!(variant_id = %variant.id, upload_id = %upload.id, "Upload URL issued");
        Ok(UploadTicket {
            variant,
            upload_url: upload.url,
        })
    }

    /// Poll the provider for a variant's upload, for setups where the webhook is not wired
    pub async fn sync_upload(
        &self,
        session: &Session,
        variant_id: Uuid,
    ) -> Result<Variant, ServiceError> {
        authz::require_content_editor(session)?;

        let variant = EmbedService::from_pool(self.pool.clone())
            .get_variant(session.organization_id, variant_id)
            .await?;
        let upload_id = variant.upload_id.clone().ok_or_else(|| {
            ServiceError::validation("upload_id", "no upload has been started for this variant")
        })?;

        let info = self.provider.get_upload(&upload_id).await?;
        tracing::debug!(variant_id = %variant.id, upload_status = %info.status, "Upload polled");

        let updated = match (info.status.as_str(), info.asset_id) {
            ("asset_created", Some(asset_id)) => {
                self.apply(&VideoEvent::AssetCreated {
                    upload_id: upload_id.clone(),
                    asset_id,
                })
                .await?
            }
            ("errored" | "cancelled" | "timed_out", _) => {
                self.mark_upload_errored(&upload_id).await?
            }
            _ => 0,
        };

        if updated == 0 {
            return Ok(variant);
        }
        EmbedService::from_pool(self.pool.clone())
            .get_variant(session.organization_id, variant_id)
            .await
    }

    pub async fn handle_webhook(
        &self,
        payload: &WebhookPayload,
    ) -> Result<WebhookOutcome, ServiceError> {
        let event = payload.parse().map_err(|e| {
            ServiceError::validation("data", format!("malformed {} event: {}", payload.kind, e))
        })?;

        let Some(event) = event else {
            tracing::debug!(event = %payload.kind, "Ignoring video webhook");
            return Ok(WebhookOutcome {
                event: payload.kind.clone(),
                handled: false,
                variants_updated: 0,
            });
        };

        let variants_updated = self.apply(&event).await?;
        if variants_updated == 0 {
            tracing::warn!(event = %payload.kind, "Video webhook matched no variant");
        } else {
            tracing::info!(event = %payload.kind, variants_updated, "Video webhook applied");
        }

        Ok(WebhookOutcome {
            event: payload.kind.clone(),
            handled: true,
            variants_updated,
        })
    }

    async fn apply(&self, event: &VideoEvent) -> Result<u64, ServiceError> {
        let result = match event {
            // A late asset_created must not knock a ready variant back to processing
            VideoEvent::AssetCreated { upload_id, asset_id } => {
                sqlx::query(
                    r#"
                    UPDATE video_variants SET asset_id = $2, status = $3, updated_at = now()
                    WHERE upload_id = $1 AND status IN ('pending', 'uploading')
                    "#,
                )
                .bind(upload_id)
                .bind(asset_id)
                .bind(VariantStatus::Processing.as_str())
                .execute(&self.pool)
                .await?
            }
            VideoEvent::AssetReady {
                asset_id,
                upload_id,
                playback_id,
                duration_seconds,
            } => {
                sqlx::query(
                    r#"
                    UPDATE video_variants
                    SET asset_id = $1, playback_id = $3, duration_seconds = $4, status = $5,
                        updated_at = now()
                    WHERE asset_id = $1 OR ($2::TEXT IS NOT NULL AND upload_id = $2)
                    "#,
                )
                .bind(asset_id)
                .bind(upload_id)
                .bind(playback_id)
                .bind(duration_seconds)
                .bind(status_when_ready(playback_id.as_deref()).as_str())
                .execute(&self.pool)
                .await?
            }
            VideoEvent::AssetErrored { asset_id, upload_id } => {
                sqlx::query(
                    r#"
                    UPDATE video_variants SET status = $3, updated_at = now()
                    WHERE asset_id = $1 OR ($2::TEXT IS NOT NULL AND upload_id = $2)
                    "#,
                )
                .bind(asset_id)
                .bind(upload_id)
                .bind(VariantStatus::Errored.as_str())
                .execute(&self.pool)
                .await?
            }
        };
        Ok(result.rows_affected())
    }

    async fn mark_upload_errored(&self, upload_id: &str) -> Result<u64, ServiceError> {
        let result = sqlx::query(
            "UPDATE video_variants SET status = $2, updated_at = now() \
             WHERE upload_id = $1 AND status <> 'ready'",
        )
        .bind(upload_id)
        .bind(VariantStatus::Errored.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

/// A ready asset with nothing to play is useless to the player
fn status_when_ready(playback_id: Option<&str>) -> VariantStatus {
    match playback_id {
        Some(_) => VariantStatus::Ready,
        None => VariantStatus::Errored,
    }
}

/// Shared-secret check for the webhook endpoint; an unset secret rejects everything
pub fn webhook_secret_matches(expected: &str, provided: Option<&str>) -> bool {
    match provided {
        Some(provided) if !expected.is_empty() => {
            expected.as_bytes().ct_eq(provided.as_bytes()).into()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(kind: &str, data: serde_json::Value) -> WebhookPayload {
        WebhookPayload {
            kind: kind.to_string(),
            data,
        }
    }

    #[test]
    fn parses_asset_created() {
        let event = payload("video.upload.asset_created", json!({"id": "up_1", "asset_id": "as_1"}))
            .parse()
            .unwrap();
        assert_eq!(
            event,
            Some(VideoEvent::AssetCreated {
                upload_id: "up_1".to_string(),
                asset_id: "as_1".to_string()
            })
        );
    }

    #[test]
    fn parses_asset_ready_with_first_playback_id() {
        let event = payload(
            "video.asset.ready",
            json!({
                "id": "as_1",
                "upload_id": "up_1",
                "duration": 42.7,
                "playback_ids": [{"id": "pb_1", "policy": "public"}, {"id": "pb_2"}]
            }),
        )
        .parse()
        .unwrap();
        assert_eq!(
            event,
            Some(VideoEvent::AssetReady {
                asset_id: "as_1".to_string(),
                upload_id: Some("up_1".to_string()),
                playback_id: Some("pb_1".to_string()),
                duration_seconds: Some(42.7),
            })
        );
    }

    #[test]
    fn parses_asset_errored() {
        let event = payload("video.asset.errored", json!({"id": "as_9"})).parse().unwrap();
        assert!(matches!(
            event,
            Some(VideoEvent::AssetErrored { ref asset_id, upload_id: None }) if asset_id == "as_9"
        ));
    }

    #[test]
    fn unknown_events_are_ignored() {
        let event = payload("video.asset.deleted", json!({"id": "as_1"})).parse().unwrap();
        assert!(event.is_none());

        let body: WebhookPayload =
            serde_json::from_value(json!({"type": "video.live_stream.idle"})).unwrap();
        assert!(body.parse().unwrap().is_none());
    }

    #[test]
    fn malformed_known_events_fail() {
        assert!(payload("video.asset.ready", json!({"duration": 1.0})).parse().is_err());
    }

    #[test]
    fn ready_without_playback_id_is_errored() {
        assert_eq!(status_when_ready(Some("pb_1")), VariantStatus::Ready);
        assert_eq!(status_when_ready(None), VariantStatus::Errored);

        let event = payload("video.asset.ready", json!({"id": "as_2", "playback_ids": []}))
            .parse()
            .unwrap();
        assert!(matches!(event, Some(VideoEvent::AssetReady { playback_id: None, .. })));
    }

    #[test]
    fn webhook_secret() {
        assert!(webhook_secret_matches("s3cret", Some("s3cret")));
        assert!(!webhook_secret_matches("s3cret", Some("s3cre")));
        assert!(!webhook_secret_matches("s3cret", Some("s3cret!")));
        assert!(!webhook_secret_matches("s3cret", None));
        assert!(!webhook_secret_matches("", Some("")));
    }
}
