// handlers/public/invites.rs - GET /invites/:token and POST /invites/:token/accept

use axum::extract::Path;
use serde::Deserialize;

use crate::error::ApiError;
use crate::invites::is_well_formed;
use crate::middleware::{ApiResponse, ApiResult, OptionalApiJson};
use crate::services::invite_service::{AcceptedInvite, InvitePreview};
use crate::services::InviteService;

#[derive(Debug, Default, Deserialize)]
pub struct AcceptInviteRequest {
    pub name: Option<String>,
}

/// Show who is inviting whom before the recipient commits
pub async fn invite_get(Path(token): Path<String>) -> ApiResult<InvitePreview> {
    check_token(&token)?;
    let preview = InviteService::new().await?.preview(&token).await?;
    Ok(ApiResponse::success(preview))
}

/// Join the organization and receive a session token
pub async fn invite_accept(
    Path(token): Path<String>,
    OptionalApiJson(body): OptionalApiJson<AcceptInviteRequest>,
) -> ApiResult<AcceptedInvite> {
    check_token(&token)?;
    let request = body.unwrap_or_default();
    let accepted = InviteService::new()
        .await?
        .accept(&token, request.name.as_deref())
        .await?;
    Ok(ApiResponse::created(accepted))
}

fn check_token(token: &str) -> Result<(), ApiError> {
    if !is_well_formed(token) {
        return Err(ApiError::bad_request("Malformed invite token"));
    }
    Ok(())
}
