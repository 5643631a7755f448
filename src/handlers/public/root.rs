// handlers/public/root.rs - GET / handler

use axum::response::Json;
use serde_json::{json, Value};

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Clipstack API",
            "version": version,
            "description": "Multi-tenant video embed management API",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "plans": "/plans (public)",
                "invites": "/invites/:token[/accept] (public)",
                "embed": "/embed/:id[/views] (public)",
                "webhooks": "/webhooks/video (shared secret)",
                "api": "/api/* (protected - organization members)",
                "internal": "/api/internal/* (restricted, requires internal token)",
            }
        }
    }))
}
