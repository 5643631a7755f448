//! Role resolution and allow-list checks against the request session.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::middleware::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Editor,
    Viewer,
}

impl Role {
    pub fn parse(role: &str) -> Option<Role> {
        match role.trim().to_ascii_lowercase().as_str() {
            "owner" => Some(Role::Owner),
            "admin" => Some(Role::Admin),
            "editor" => Some(Role::Editor),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles allowed to manage members, invites and organization settings
pub const MANAGE_MEMBERS: &[Role] = &[Role::Owner, Role::Admin];

/// Roles allowed to create, edit, reorder and upload content
pub const EDIT_CONTENT: &[Role] = &[Role::Owner, Role::Admin, Role::Editor];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    #[error("Role '{0}' is not allowed to perform this action")]
    RoleNotAllowed(Role),

    #[error("Internal access required")]
    InternalOnly,

    #[error("You cannot change your own membership")]
    SelfChange,

    #[error("Only an owner can grant or modify the owner role")]
    OwnerOnly,

    #[error("An organization must keep at least one owner")]
    LastOwner,
}

pub fn require_role(session: &Session, allowed: &[Role]) -> Result<(), AuthzError> {
    if allowed.contains(&session.role) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %session.user_id,
            role = %session.role,
            "Role check failed"
        );
        Err(AuthzError::RoleNotAllowed(session.role))
    }
}

pub fn require_member_manager(session: &Session) -> Result<(), AuthzError> {
    require_role(session, MANAGE_MEMBERS)
}

pub fn require_content_editor(session: &Session) -> Result<(), AuthzError> {
    require_role(session, EDIT_CONTENT)
}

/// Validates a role change or removal of `target_id`.
///
/// `new_role` is `None` for removals. `owner_count` is the number of owners in the
/// organization at the time of the check and must be read inside the same
/// transaction as the mutation.
pub fn check_member_change(
    actor_id: Uuid,
    actor_role: Role,
    target_id: Uuid,
    target_role: Role,
    new_role: Option<Role>,
    owner_count: i64,
) -> Result<(), AuthzError> {
    if !MANAGE_MEMBERS.contains(&actor_role) {
        return Err(AuthzError::RoleNotAllowed(actor_role));
    }
    if actor_id == target_id {
        return Err(AuthzError::SelfChange);
    }

    let touches_owner = target_role == Role::Owner || new_role == Some(Role::Owner);
    if touches_owner && actor_role != Role::Owner {
        return Err(AuthzError::OwnerOnly);
    }

    let loses_owner = target_role == Role::Owner && new_role != Some(Role::Owner);
    if loses_owner && owner_count <= 1 {
        return Err(AuthzError::LastOwner);
    }

    Ok(())
}

/// Roles an actor may hand out through invites.
pub fn can_invite_as(actor_role: Role, invited_role: Role) -> Result<(), AuthzError> {
    if !MANAGE_MEMBERS.contains(&actor_role) {
        return Err(AuthzError::RoleNotAllowed(actor_role));
    }
    if invited_role == Role::Owner && actor_role != Role::Owner {
        return Err(AuthzError::OwnerOnly);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::session_with_role;

    #[test]
    fn parses_roles_case_insensitively() {
        assert_eq!(Role::parse("Owner"), Some(Role::Owner));
        assert_eq!(Role::parse(" editor "), Some(Role::Editor));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::Viewer.to_string(), "viewer");
    }

    #[test]
    fn allow_lists_gate_roles() {
        assert!(require_member_manager(&session_with_role(Role::Admin)).is_ok());
        assert_eq!(
            require_member_manager(&session_with_role(Role::Editor)),
            Err(AuthzError::RoleNotAllowed(Role::Editor))
        );
        assert!(require_content_editor(&session_with_role(Role::Editor)).is_ok());
        assert!(require_content_editor(&session_with_role(Role::Viewer)).is_err());
    }

    #[test]
    fn members_cannot_change_themselves() {
        let me = Uuid::new_v4();
        let result = check_member_change(me, Role::Owner, me, Role::Owner, Some(Role::Admin), 3);
        assert_eq!(result, Err(AuthzError::SelfChange));
    }

    #[test]
    fn admins_cannot_touch_owners() {
        let (actor, target) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            check_member_change(actor, Role::Admin, target, Role::Owner, Some(Role::Viewer), 2),
            Err(AuthzError::OwnerOnly)
        );
        assert_eq!(
            check_member_change(actor, Role::Admin, target, Role::Editor, Some(Role::Owner), 2),
            Err(AuthzError::OwnerOnly)
        );
        assert!(
            check_member_change(actor, Role::Admin, target, Role::Editor, Some(Role::Viewer), 1)
                .is_ok()
        );
    }

    #[test]
    fn last_owner_is_protected() {
        let (actor, target) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            check_member_change(actor, Role::Owner, target, Role::Owner, Some(Role::Admin), 1),
            Err(AuthzError::LastOwner)
        );
        assert_eq!(
            check_member_change(actor, Role::Owner, target, Role::Owner, None, 1),
            Err(AuthzError::LastOwner)
        );
        assert!(check_member_change(actor, Role::Owner, target, Role::Owner, None, 2).is_ok());
    }

    #[test]
    fn only_owners_invite_owners() {
        assert!(can_invite_as(Role::Owner, Role::Owner).is_ok());
        assert_eq!(can_invite_as(Role::Admin, Role::Owner), Err(AuthzError::OwnerOnly));
        assert!(can_invite_as(Role::Admin, Role::Editor).is_ok());
        assert!(can_invite_as(Role::Viewer, Role::Viewer).is_err());
    }
}
