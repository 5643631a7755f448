// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Route Prefix: /api/*
// Middleware: jwt_auth → validate_user, so every handler receives a `Session`
// for a current member of the organization named in the token.

pub mod embeds;
pub mod groups;
pub mod invites;
pub mod organization;
pub mod session;
pub mod uploads;
pub mod users;
pub mod variants;

pub use embeds::{
    embed_delete, embed_get, embed_patch, embeds_get, embeds_post, groups_order_put, groups_post,
};
pub use groups::{group_delete, group_patch, variants_order_put, variants_post};
pub use invites::{invite_delete, invites_get, invites_post};
pub use organization::{organization_get, organization_patch, organization_usage_get};
pub use session::session_get;
pub use uploads::{upload_post, upload_sync_post};
pub use users::{user_delete, user_role_patch, users_get};
pub use variants::{variant_delete, variant_patch};

use serde::Deserialize;

use crate::types::ReorderItem;

/// Body of both reorder endpoints
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub items: Vec<ReorderItem>,
}
