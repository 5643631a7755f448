//! Video hosting provider seam.
//!
//! Uploads go straight from the browser to the provider: the server only asks for
//! a one-shot upload URL, then follows the upload until the provider reports a
//! playable asset (by polling or through the webhook).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod http;

pub use http::HttpVideoProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("video provider credentials are not configured")]
    NotConfigured,

    #[error("video provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("video provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Direct-upload slot issued by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectUpload {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadInfo {
    pub id: String,
    /// Provider status, e.g. `waiting`, `asset_created`, `errored`, `cancelled`, `timed_out`
    pub status: String,
    #[serde(default)]
    pub asset_id: Option<String>,
}

#[async_trait]
pub trait VideoProvider: Send + Sync {
    async fn create_upload(&self, cors_origin: &str) -> Result<DirectUpload, ProviderError>;

    async fn get_upload(&self, upload_id: &str) -> Result<UploadInfo, ProviderError>;
}

/// Provider handle shared with handlers through a request extension
pub type SharedVideoProvider = std::sync::Arc<dyn VideoProvider>;
