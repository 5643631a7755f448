pub mod auth;
pub mod cors;
pub mod require_internal;
pub mod response;
pub mod validate_user;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use cors::{dashboard_cors, embed_cors};
pub use require_internal::{require_internal_middleware, InternalUser};
pub use response::{ApiJson, ApiResponse, ApiResult, OptionalApiJson};
pub use validate_user::{validate_user_middleware, Session};
