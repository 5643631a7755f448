use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::{conflict_on_unique, optional_text, ServiceError};
use crate::auth::{generate_jwt, Claims};
use crate::authz::{self, Role};
use crate::config;
use crate::database::models::{Invite, User};
use crate::database::DatabaseManager;
use crate::invites::{self, hash_token, is_expired, normalize_email};
use crate::middleware::Session;
use crate::plans::plan_limits;

const INVITE_COLUMNS: &str =
    "id, organization_id, email, role, token_hash, invited_by, expires_at, accepted_at, created_at";

/// Returned once on creation; the only time the raw token is visible
#[derive(Debug, Clone, Serialize)]
pub struct CreatedInvite {
    pub invite: Invite,
    pub token: String,
    pub accept_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvitePreview {
    pub organization_name: String,
    pub email: String,
    pub role: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AcceptedInvite {
    pub user: User,
    pub token: String,
    pub expires_in: i64,
}

#[derive(sqlx::FromRow)]
struct InviteWithOrganization {
    #[sqlx(flatten)]
    invite: Invite,
    organization_name: String,
}

pub struct InviteService {
    pool: PgPool,
}

impl InviteService {
    pub async fn new() -> Result<Self, ServiceError> {
        Ok(Self::from_pool(DatabaseManager::pool().await?))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        session: &Session,
        email: &str,
        role: &str,
    ) -> Result<CreatedInvite, ServiceError> {
        let role =
            Role::parse(role).ok_or_else(|| ServiceError::validation("role", "unknown role"))?;
        authz::can_invite_as(session.role, role)?;
        let email = normalize_email(email)
            .ok_or_else(|| ServiceError::validation("email", "must be a valid email address"))?;

        let mut tx = self.pool.begin().await?;

        // Serialises invite creation per organization so the seat count below stays accurate
        let plan: String =
            sqlx::query_scalar("SELECT plan FROM organizations WHERE id = $1 FOR UPDATE")
                .bind(session.organization_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ServiceError::not_found("Organization"))?;

        let is_member: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE organization_id = $1 AND email = $2)",
        )
        .bind(session.organization_id)
        .bind(&email)
        .fetch_one(&mut *tx)
        .await?;
        if is_member {
            return Err(ServiceError::Conflict(format!("{} is already a member", email)));
        }

        let already_invited: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM invites
                WHERE organization_id = $1 AND email = $2
                  AND accepted_at IS NULL AND expires_at > now()
            )
            "#,
        )
        .bind(session.organization_id)
        .bind(&email)
        .fetch_one(&mut *tx)
        .await?;
        if already_invited {
            return Err(ServiceError::Conflict(format!("{} already has a pending invite", email)));
        }

        let seats_taken: i64 = sqlx::query_scalar(
            r#"
            SELECT (SELECT COUNT(*) FROM users WHERE organization_id = $1)
                 + (SELECT COUNT(*) FROM invites
                    WHERE organization_id = $1 AND accepted_at IS NULL AND expires_at > now())
            "#,
        )
        .bind(session.organization_id)
        .fetch_one(&mut *tx)
        .await?;
        let max_users = plan_limits(&plan).max_users;
        if seats_taken >= i64::from(max_users) {
            return Err(ServiceError::PlanLimit(format!(
                "The {} plan allows {} users including pending invites",
                plan, max_users
            )));
        }

        let issued = invites::issue_token(Utc::now(), config::config().invites.expiry_days);
        let invite = sqlx::query_as::<_, Invite>(&format!(
            r#"
            INSERT INTO invites
                (id, organization_id, email, role, token_hash, invited_by, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            INVITE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(session.organization_id)
        .bind(&email)
        .bind(role.as_str())
        .bind(&issued.token_hash)
        .bind(session.user_id)
        .bind(issued.expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            organization_id = %session.organization_id,
            invite_id = %invite.id,
            role = %role,
            "Invite created"
        );

        Ok(CreatedInvite {
            accept_url: accept_url(&config::config().invites.public_base_url, &issued.token),
            invite,
            token: issued.token,
        })
    }

    pub async fn list_pending(&self, organization_id: Uuid) -> Result<Vec<Invite>, ServiceError> {
        let invites = sqlx::query_as::<_, Invite>(&format!(
            r#"
            SELECT {} FROM invites
            WHERE organization_id = $1 AND accepted_at IS NULL AND expires_at > now()
            ORDER BY created_at DESC
            "#,
            INVITE_COLUMNS
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(invites)
    }

    pub async fn revoke(&self, session: &Session, invite_id: Uuid) -> Result<(), ServiceError> {
        authz::require_member_manager(session)?;

        let result = sqlx::query(
            "DELETE FROM invites WHERE id = $1 AND organization_id = $2 AND accepted_at IS NULL",
        )
        .bind(invite_id)
        .bind(session.organization_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found("Invite"));
        }

        tracing::info!(
            organization_id = %session.organization_id,
            invite_id = %invite_id,
            "Invite revoked"
        );
        Ok(())
    }

    pub async fn preview(&self, token: &str) -> Result<InvitePreview, ServiceError> {
        let found = self.find_by_token(&self.pool, token, false).await?;
        ensure_pending(&found.invite, Utc::now())?;

        Ok(InvitePreview {
            organization_name: found.organization_name,
            email: found.invite.email,
            role: found.invite.role,
            expires_at: found.invite.expires_at,
        })
    }

    /// Turn a pending invite into a member and sign them in
    pub async fn accept(
        &self,
        token: &str,
        name: Option<&str>,
    ) -> Result<AcceptedInvite, ServiceError> {
        let name = optional_text("name", name, 100)?;

        let mut tx = self.pool.begin().await?;

        let found = self.find_by_token(&mut *tx, token, true).await?;
        let invite = found.invite;
        ensure_pending(&invite, Utc::now())?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, organization_id, email, name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, organization_id, email, name, role, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(invite.organization_id)
        .bind(&invite.email)
        .bind(&name)
        .bind(&invite.role)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "This email is already a member of the organization"))?;

        sqlx::query("UPDATE invites SET accepted_at = now() WHERE id = $1")
            .bind(invite.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let claims =
            Claims::for_member(user.id, user.organization_id, user.email.clone(), user.role());
        let expires_in = claims.expires_in();
        let session_token = generate_jwt(&claims)?;

        tracing::info!(
            organization_id = %user.organization_id,
            user_id = %user.id,
            invite_id = %invite.id,
            "Invite accepted"
        );

        Ok(AcceptedInvite {
            user,
            token: session_token,
            expires_in,
        })
    }

    async fn find_by_token<'e, E>(
        &self,
        executor: E,
        token: &str,
        for_update: bool,
    ) -> Result<InviteWithOrganization, ServiceError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let sql = format!(
            r#"
            SELECT i.id, i.organization_id, i.email, i.role, i.token_hash, i.invited_by,
                   i.expires_at, i.accepted_at, i.created_at, o.name AS organization_name
            FROM invites i
            JOIN organizations o ON o.id = i.organization_id
            WHERE i.token_hash = $1
            {}
            "#,
            if for_update { "FOR UPDATE OF i" } else { "" }
        );

        sqlx::query_as::<_, InviteWithOrganization>(&sql)
            .bind(hash_token(token))
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| ServiceError::not_found("Invite"))
    }
}

fn ensure_pending(invite: &Invite, now: DateTime<Utc>) -> Result<(), ServiceError> {
    if invite.accepted_at.is_some() {
        return Err(ServiceError::Gone("This invite has already been accepted".to_string()));
    }
    if is_expired(invite.expires_at, now) {
        return Err(ServiceError::Gone("This invite has expired".to_string()));
    }
    Ok(())
}

pub fn accept_url(base_url: &str, token: &str) -> String {
    format!("{}/invites/{}", base_url.trim_end_matches('/'), token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invite(expires_at: DateTime<Utc>, accepted_at: Option<DateTime<Utc>>) -> Invite {
        Invite {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            role: "editor".to_string(),
            token_hash: hash_token("t"),
            invited_by: None,
            expires_at,
            accepted_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn pending_invites_pass() {
        let now = Utc::now();
        assert!(ensure_pending(&invite(now + Duration::days(1), None), now).is_ok());
    }

    #[test]
    fn expired_and_accepted_invites_are_gone() {
        let now = Utc::now();
        assert!(matches!(
            ensure_pending(&invite(now - Duration::seconds(1), None), now),
            Err(ServiceError::Gone(_))
        ));
        assert!(matches!(
            ensure_pending(&invite(now + Duration::days(1), Some(now)), now),
            Err(ServiceError::Gone(_))
        ));
    }

    #[test]
    fn accept_urls_join_cleanly() {
        let expected = "https://app.example.com/invites/tok";
        assert_eq!(accept_url("https://app.example.com/", "tok"), expected);
        assert_eq!(accept_url("https://app.example.com", "tok"), expected);
    }

    #[test]
    fn serialized_invites_hide_the_hash() {
        let value = serde_json::to_value(invite(Utc::now(), None)).unwrap();
        assert!(value.get("token_hash").is_none());
        assert_eq!(value["role"], "editor");
    }
}
