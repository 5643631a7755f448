use axum::{extract::Request, middleware::Next, response::Response};
use serde::Serialize;
use uuid::Uuid;

use super::auth::AuthUser;
use crate::authz::Role;
use crate::database::models::User;
use crate::database::DatabaseManager;
use crate::error::ApiError;

/// Organization member behind the request, as currently stored in the database
#[derive(Clone, Debug, Serialize)]
pub struct Session {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
}

impl From<User> for Session {
    fn from(user: User) -> Self {
        let role = user.role();
        Self {
            user_id: user.id,
            organization_id: user.organization_id,
            email: user.email,
            name: user.name,
            role,
        }
    }
}

/// Middleware that resolves the JWT subject to a member of the claimed organization.
/// The stored role wins over the role in the token, so demotions apply immediately.
pub async fn validate_user_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| {
            ApiError::unauthorized("JWT authentication required before user validation")
        })?;

    let organization_id = auth_user
        .organization_id
        .ok_or_else(|| ApiError::forbidden("Session is not bound to an organization"))?;

    let pool = DatabaseManager::pool().await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, organization_id, email, name, role, created_at, updated_at
        FROM users
        WHERE id = $1 AND organization_id = $2
        "#,
    )
    .bind(auth_user.id)
    .bind(organization_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Database error validating user {}: {}", auth_user.id, e);
        ApiError::internal_server_error("Failed to validate user")
    })?
    .ok_or_else(|| {
        tracing::warn!(
            "User validation failed: {} is not a member of organization {}",
            auth_user.id,
            organization_id
        );
        ApiError::forbidden("User is not a member of this organization")
    })?;

    let session = Session::from(user);
    if auth_user.role.is_some_and(|role| role != session.role) {
        tracing::debug!(
            "Token role {:?} for {} is stale, using stored role {}",
            auth_user.role,
            session.email,
            session.role
        );
    }

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
