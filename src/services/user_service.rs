use sqlx::PgPool;
use uuid::Uuid;

use super::ServiceError;
use crate::authz::{self, Role};
use crate::database::models::User;
use crate::database::DatabaseManager;
use crate::middleware::Session;

const USER_COLUMNS: &str = "id, organization_id, email, name, role, created_at, updated_at";

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub async fn new() -> Result<Self, ServiceError> {
        Ok(Self::from_pool(DatabaseManager::pool().await?))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, organization_id: Uuid) -> Result<Vec<User>, ServiceError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE organization_id = $1 ORDER BY created_at, email",
            USER_COLUMNS
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn change_role(
        &self,
        session: &Session,
        target_id: Uuid,
        new_role: Role,
    ) -> Result<User, ServiceError> {
        authz::require_member_manager(session)?;

        let mut tx = self.pool.begin().await?;

        lock_organization(&mut tx, session.organization_id).await?;
        let actor_role = current_role(&mut tx, session).await?;
        let target = lock_member(&mut tx, session.organization_id, target_id).await?;
        let owner_count = count_owners(&mut tx, session.organization_id).await?;
        authz::check_member_change(
            session.user_id,
            actor_role,
            target.id,
            target.role(),
            Some(new_role),
            owner_count,
        )?;

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $3, updated_at = now() \
             WHERE id = $1 AND organization_id = $2 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(target_id)
        .bind(session.organization_id)
        .bind(new_role.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            organization_id = %session.organization_id,
            actor = %session.user_id,
            target = %target_id,
            from = %target.role,
            to = %new_role,
            "Member role changed"
        );
        Ok(user)
    }

    pub async fn remove(&self, session: &Session, target_id: Uuid) -> Result<(), ServiceError> {
        authz::require_member_manager(session)?;

        let mut tx = self.pool.begin().await?;

        lock_organization(&mut tx, session.organization_id).await?;
        let actor_role = current_role(&mut tx, session).await?;
        let target = lock_member(&mut tx, session.organization_id, target_id).await?;
        let owner_count = count_owners(&mut tx, session.organization_id).await?;
        authz::check_member_change(
            session.user_id,
            actor_role,
            target.id,
            target.role(),
            None,
            owner_count,
        )?;

        sqlx::query("DELETE FROM users WHERE id = $1 AND organization_id = $2")
            .bind(target_id)
            .bind(session.organization_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            organization_id = %session.organization_id,
            actor = %session.user_id,
            target = %target_id,
            "Member removed"
        );
        Ok(())
    }
}

/// Member changes for one organization run one at a time behind its row lock
async fn lock_organization(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    organization_id: Uuid,
) -> Result<(), ServiceError> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM organizations WHERE id = $1 FOR UPDATE")
        .bind(organization_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| ServiceError::not_found("Organization"))?;
    Ok(())
}

/// The actor's role as of the organization lock; a concurrent demotion wins over the session
async fn current_role(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    session: &Session,
) -> Result<Role, ServiceError> {
    let role: Option<String> =
        sqlx::query_scalar("SELECT role FROM users WHERE id = $1 AND organization_id = $2")
            .bind(session.user_id)
            .bind(session.organization_id)
            .fetch_optional(&mut **tx)
            .await?;
    role.and_then(|r| Role::parse(&r)).ok_or_else(|| {
        ServiceError::Forbidden("You are no longer a member of this organization".into())
    })
}

async fn lock_member(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    organization_id: Uuid,
    user_id: Uuid,
) -> Result<User, ServiceError> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = $1 AND organization_id = $2 FOR UPDATE",
        USER_COLUMNS
    ))
    .bind(user_id)
    .bind(organization_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| ServiceError::not_found("User"))
}

async fn count_owners(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    organization_id: Uuid,
) -> Result<i64, ServiceError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE organization_id = $1 AND role = 'owner'",
    )
    .bind(organization_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(count)
}
