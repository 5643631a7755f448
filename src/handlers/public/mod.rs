// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Invite links, the embed payload served to external sites, view counting and
// the video provider webhook. Inputs here come from anonymous callers and are
// validated before touching the database.

pub mod embed;
pub mod health;
pub mod invites;
pub mod plans;
pub mod root;
pub mod webhooks;

pub use embed::{embed_get, embed_views_post};
pub use health::health;
pub use invites::{invite_accept, invite_get};
pub use plans::plans_get;
pub use root::root;
pub use webhooks::video_webhook_post;
