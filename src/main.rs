use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{delete, get, patch, post, put},
    Extension, Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clipstack_api::config;
use clipstack_api::error::ApiError;
use clipstack_api::handlers::{elevated, protected, public};
use clipstack_api::middleware::{
    dashboard_cors, embed_cors, jwt_auth_middleware, require_internal_middleware,
    validate_user_middleware,
};
use clipstack_api::telemetry;
use clipstack_api::video::{HttpVideoProvider, SharedVideoProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("clipstack_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::config();
    tracing::info!("Starting Clipstack API in {} mode", config.environment.as_str());

    if config.security.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET is not set; every authenticated request will be rejected");
    }

    telemetry::init();

    let provider: SharedVideoProvider = Arc::new(HttpVideoProvider::from_config(&config.video)?);
    let app = app(provider);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Clipstack API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn app(provider: SharedVideoProvider) -> Router {
    let config = config::config();

    let dashboard = Router::new()
        .merge(public_routes())
        .merge(protected_routes())
        .merge(internal_routes())
        .layer(dashboard_cors(&config.security.cors_origins));

    let mut app = Router::new()
        .merge(dashboard)
        .merge(embed_routes().layer(embed_cors()))
        .fallback(not_found)
        .layer(Extension(provider))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    app
}

fn public_routes() -> Router {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/plans", get(public::plans_get))
        // Invite links carry the raw token
        .route("/invites/:token", get(public::invite_get))
        .route("/invites/:token/accept", post(public::invite_accept))
        .route("/webhooks/video", post(public::video_webhook_post))
}

fn embed_routes() -> Router {
    Router::new()
        .route("/embed/:id", get(public::embed_get))
        .route("/embed/:id/views", post(public::embed_views_post))
}

fn protected_routes() -> Router {
    Router::new()
        .route("/api/session", get(protected::session_get))
        // Organization
        .route(
            "/api/organization",
            get(protected::organization_get).patch(protected::organization_patch),
        )
        .route("/api/organization/usage", get(protected::organization_usage_get))
        // Members and invites
        .route("/api/users", get(protected::users_get))
        .route("/api/users/:id", delete(protected::user_delete))
        .route("/api/users/:id/role", patch(protected::user_role_patch))
        .route("/api/invites", get(protected::invites_get).post(protected::invites_post))
        .route("/api/invites/:id", delete(protected::invite_delete))
        // Content
        .route("/api/embeds", get(protected::embeds_get).post(protected::embeds_post))
        .route(
            "/api/embeds/:id",
            get(protected::embed_get)
                .patch(protected::embed_patch)
                .delete(protected::embed_delete),
        )
        .route("/api/embeds/:id/groups", post(protected::groups_post))
        .route("/api/embeds/:id/groups/order", put(protected::groups_order_put))
        .route(
            "/api/groups/:id",
            patch(protected::group_patch).delete(protected::group_delete),
        )
        .route("/api/groups/:id/variants", post(protected::variants_post))
        .route("/api/groups/:id/variants/order", put(protected::variants_order_put))
        .route(
            "/api/variants/:id",
            patch(protected::variant_patch).delete(protected::variant_delete),
        )
        // Uploads
        .route("/api/variants/:id/upload", post(protected::upload_post))
        .route("/api/variants/:id/upload/sync", post(protected::upload_sync_post))
        // Outermost layer runs first: JWT, then membership
        .route_layer(from_fn(validate_user_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn internal_routes() -> Router {
    Router::new()
        .route(
            "/api/internal/organizations",
            get(elevated::organizations_get).post(elevated::organizations_post),
        )
        .route(
            "/api/internal/organizations/:id/plan",
            patch(elevated::organization_plan_patch),
        )
        .route_layer(from_fn(require_internal_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
