pub mod embed_service;
pub mod invite_service;
pub mod organization_service;
pub mod upload_service;
pub mod user_service;

pub use embed_service::EmbedService;
pub use invite_service::InviteService;
pub use organization_service::OrganizationService;
pub use upload_service::UploadService;
pub use user_service::UserService;

use crate::auth::JwtError;
use crate::authz::AuthzError;
use crate::database::DatabaseError;
use crate::video::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    PlanLimit(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Gone(String),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Token(#[from] JwtError),
}

impl ServiceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(what: &str) -> Self {
        ServiceError::NotFound(format!("{} not found", what))
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(DatabaseError::Sqlx(err))
    }
}

/// Map a unique-constraint failure to a 409 with the given message, pass anything else through
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> ServiceError {
    let err = DatabaseError::Sqlx(err);
    if err.is_unique_violation() {
        ServiceError::Conflict(message.to_string())
    } else {
        ServiceError::Database(err)
    }
}

/// Trimmed, non-empty, bounded text field
pub(crate) fn required_text(
    field: &'static str,
    value: &str,
    max_len: usize,
) -> Result<String, ServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::validation(field, "must not be empty"));
    }
    if value.chars().count() > max_len {
        return Err(ServiceError::validation(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }
    Ok(value.to_string())
}

/// Optional text: blank becomes `None`
pub(crate) fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max_len: usize,
) -> Result<Option<String>, ServiceError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => required_text(field, v, max_len).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_trims_and_bounds() {
        assert_eq!(required_text("name", "  Launch video ", 100).unwrap(), "Launch video");
        assert!(matches!(
            required_text("name", "   ", 100),
            Err(ServiceError::Validation { field: "name", .. })
        ));
        assert!(required_text("name", &"x".repeat(101), 100).is_err());
    }

    #[test]
    fn optional_text_treats_blank_as_absent() {
        assert_eq!(optional_text("title", Some("  "), 10).unwrap(), None);
        assert_eq!(optional_text("title", None, 10).unwrap(), None);
        assert_eq!(optional_text("title", Some(" Intro "), 10).unwrap(), Some("Intro".to_string()));
    }
}
