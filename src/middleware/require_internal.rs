use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

use super::auth::AuthUser;
use crate::error::ApiError;

/// Platform staff identity for cross-tenant endpoints
#[derive(Clone, Debug)]
pub struct InternalUser {
    pub id: Uuid,
    pub email: String,
}

/// Middleware that admits only tokens carrying the `internal` claim
pub async fn require_internal_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| {
            ApiError::unauthorized("JWT authentication required before internal access check")
        })?;

    if !auth_user.internal {
        tracing::warn!(
            user_id = %auth_user.id,
            "Internal endpoint refused for non-internal session"
        );
        return Err(crate::authz::AuthzError::InternalOnly.into());
    }

    request.extensions_mut().insert(InternalUser {
        id: auth_user.id,
        email: auth_user.email,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware::from_fn,
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::auth::{generate_jwt, Claims};
    use crate::authz::Role;
    use crate::middleware::jwt_auth_middleware;

    fn router() -> Router {
        Router::new()
            .route(
                "/internal",
                get(|Extension(staff): Extension<InternalUser>| async move { staff.email }),
            )
            .route_layer(from_fn(require_internal_middleware))
            .route_layer(from_fn(jwt_auth_middleware))
    }

    async fn status_for(token: Option<String>) -> StatusCode {
        let mut request = HttpRequest::builder().uri("/internal");
        if let Some(token) = token {
            request = request.header("authorization", format!("Bearer {}", token));
        }
        router()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        assert_eq!(status_for(None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn member_token_is_forbidden() {
        let claims =
            Claims::for_member(Uuid::new_v4(), Uuid::new_v4(), "owner@example.com", Role::Owner);
        let token = generate_jwt(&claims).unwrap();
        assert_eq!(status_for(Some(token)).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn internal_token_passes() {
        let claims = Claims::for_internal(Uuid::new_v4(), "staff@example.com");
        let token = generate_jwt(&claims).unwrap();
        assert_eq!(status_for(Some(token)).await, StatusCode::OK);
    }
}
