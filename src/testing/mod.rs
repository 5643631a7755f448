//! Fixtures shared by unit tests

use uuid::Uuid;

use crate::authz::Role;
use crate::middleware::Session;

/// A member session in a throwaway organization
pub fn session_with_role(role: Role) -> Session {
    Session {
        user_id: Uuid::new_v4(),
        organization_id: Uuid::new_v4(),
        email: format!("{}@example.com", role.as_str()),
        name: None,
        role,
    }
}
