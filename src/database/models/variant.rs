use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Variant {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub group_id: Uuid,
    pub language: String,
    pub title: Option<String>,
    pub sort_order: i32,
    pub upload_id: Option<String>,
    pub asset_id: Option<String>,
    pub playback_id: Option<String>,
    pub status: String,
    pub duration_seconds: Option<f64>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Variant {
    pub fn is_ready(&self) -> bool {
        self.status == "ready" && self.playback_id.is_some()
    }
}
