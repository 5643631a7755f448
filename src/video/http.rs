use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::{DirectUpload, ProviderError, UploadInfo, VideoProvider};
use crate::config::VideoConfig;

/// REST client for the hosting provider's video API (`/video/v1/uploads`)
#[derive(Clone)]
pub struct HttpVideoProvider {
    client: reqwest::Client,
    base_url: String,
    token_id: String,
    token_secret: String,
}

/// Provider responses are wrapped in `{"data": ...}`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

impl HttpVideoProvider {
    pub fn from_config(config: &VideoConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token_id: config.token_id.clone(),
            token_secret: config.token_secret.clone(),
        })
    }

    fn ensure_configured(&self) -> Result<(), ProviderError> {
        if self.token_id.is_empty() || self.token_secret.is_empty() {
            return Err(ProviderError::NotConfigured);
        }
        Ok(())
    }

    fn uploads_url(&self) -> String {
        format!("{}/video/v1/uploads", self.base_url)
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl VideoProvider for HttpVideoProvider {
    async fn create_upload(&self, cors_origin: &str) -> Result<DirectUpload, ProviderError> {
        self.ensure_configured()?;

        let body = json!({
            "cors_origin": cors_origin,
            "new_asset_settings": { "playback_policy": ["public"] }
        });
        let response = self
            .client
            .post(self.uploads_url())
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .json(&body)
            .send()
            .await?;

        let upload: DirectUpload = Self::read(response).await?;
        tracing::info!(upload_id = %upload.id, "Direct upload created");
        Ok(upload)
    }

    async fn get_upload(&self, upload_id: &str) -> Result<UploadInfo, ProviderError> {
        self.ensure_configured()?;

        let response = self
            .client
            .get(format!("{}/{}", self.uploads_url(), upload_id))
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .send()
            .await?;

        Self::read(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token_id: &str) -> VideoConfig {
        VideoConfig {
            api_base_url: "https://video.example.com/".to_string(),
            token_id: token_id.to_string(),
            token_secret: "secret".to_string(),
            webhook_secret: String::new(),
            cors_origin: "https://app.example.com".to_string(),
            request_timeout_secs: 5,
        }
    }

    #[test]
    fn builds_upload_urls_without_double_slashes() {
        let provider = HttpVideoProvider::from_config(&config("id")).unwrap();
        assert_eq!(provider.uploads_url(), "https://video.example.com/video/v1/uploads");
    }

    #[tokio::test]
    async fn refuses_to_call_without_credentials() {
        let provider = HttpVideoProvider::from_config(&config("")).unwrap();
        let result = provider.create_upload("https://app.example.com").await;
        assert!(matches!(result, Err(ProviderError::NotConfigured)));
    }

    #[test]
    fn parses_wrapped_upload_payloads() {
        let raw =
            r#"{"data":{"id":"up_1","status":"asset_created","asset_id":"as_9","timeout":3600}}"#;
        let envelope: Envelope<UploadInfo> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.data.asset_id.as_deref(), Some("as_9"));
        assert_eq!(envelope.data.status, "asset_created");
    }
}
