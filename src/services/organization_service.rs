use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::{conflict_on_unique, required_text, ServiceError};
use crate::authz::{self, Role};
use crate::database::models::{Organization, User};
use crate::database::DatabaseManager;
use crate::invites::normalize_email;
use crate::middleware::Session;
use crate::plans::{Plan, PlanLimits};

const ORG_COLUMNS: &str = "id, name, slug, plan, created_at, updated_at";

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationUsage {
    pub plan: String,
    pub limits: PlanLimits,
    pub embeds: i64,
    pub users: i64,
    pub pending_invites: i64,
    pub total_views: i64,
}

/// Cross-tenant listing row for internal staff
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrganizationSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub plan: String,
    pub member_count: i64,
    pub embed_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedOrganization {
    pub organization: Organization,
    pub owner: User,
}

pub struct OrganizationService {
    pool: PgPool,
}

impl OrganizationService {
    pub async fn new() -> Result<Self, ServiceError> {
        Ok(Self::from_pool(DatabaseManager::pool().await?))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, organization_id: Uuid) -> Result<Organization, ServiceError> {
        sqlx::query_as::<_, Organization>(&format!(
            "SELECT {} FROM organizations WHERE id = $1",
            ORG_COLUMNS
        ))
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Organization"))
    }

    pub async fn rename(
        &self,
        session: &Session,
        name: &str,
    ) -> Result<Organization, ServiceError> {
        authz::require_member_manager(session)?;
        let name = required_text("name", name, 100)?;

        let organization = sqlx::query_as::<_, Organization>(&format!(
            "UPDATE organizations SET name = $2, updated_at = now() WHERE id = $1 RETURNING {}",
            ORG_COLUMNS
        ))
        .bind(session.organization_id)
        .bind(&name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Organization"))?;

        tracing::info!(organization_id = %organization.id, "Organization renamed");
        Ok(organization)
    }

    pub async fn usage(&self, organization_id: Uuid) -> Result<OrganizationUsage, ServiceError> {
        let organization = self.get(organization_id).await?;

        let (embeds, total_views): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(view_count), 0)::BIGINT \
             FROM embeds WHERE organization_id = $1",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE organization_id = $1")
            .bind(organization_id)
            .fetch_one(&self.pool)
            .await?;

        let pending_invites: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM invites \
             WHERE organization_id = $1 AND accepted_at IS NULL AND expires_at > now()",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(OrganizationUsage {
            limits: organization.limits(),
            plan: organization.plan,
            embeds,
            users,
            pending_invites,
            total_views,
        })
    }

    pub async fn list_all(&self) -> Result<Vec<OrganizationSummary>, ServiceError> {
        let rows = sqlx::query_as::<_, OrganizationSummary>(
            r#"
            SELECT o.id, o.name, o.slug, o.plan, o.created_at,
                   (SELECT COUNT(*) FROM users u WHERE u.organization_id = o.id) AS member_count,
                   (SELECT COUNT(*) FROM embeds e WHERE e.organization_id = o.id) AS embed_count
            FROM organizations o
            ORDER BY o.created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Create an organization together with its first owner
    pub async fn create_with_owner(
        &self,
        name: &str,
        slug: &str,
        plan: Option<&str>,
        owner_email: &str,
    ) -> Result<CreatedOrganization, ServiceError> {
        let name = required_text("name", name, 100)?;
        let slug = validate_slug(slug)?;
        let plan = match plan {
            Some(p) => parse_plan(p)?,
            None => Plan::Free,
        };
        let owner_email = normalize_email(owner_email).ok_or_else(|| {
            ServiceError::validation("owner_email", "must be a valid email address")
        })?;

        let mut tx = self.pool.begin().await?;

        let organization = sqlx::query_as::<_, Organization>(&format!(
            "INSERT INTO organizations (id, name, slug, plan) VALUES ($1, $2, $3, $4) RETURNING {}",
            ORG_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&name)
        .bind(&slug)
        .bind(plan.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "An organization with this slug already exists"))?;

        let owner = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, organization_id, email, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, organization_id, email, name, role, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(organization.id)
        .bind(&owner_email)
        .bind(Role::Owner.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            organization_id = %organization.id,
            slug = %organization.slug,
            "Organization created"
        );
        Ok(CreatedOrganization { organization, owner })
    }

    pub async fn set_plan(
        &self,
        organization_id: Uuid,
        plan: &str,
    ) -> Result<Organization, ServiceError> {
        let plan = parse_plan(plan)?;

        let organization = sqlx::query_as::<_, Organization>(&format!(
            "UPDATE organizations SET plan = $2, updated_at = now() WHERE id = $1 RETURNING {}",
            ORG_COLUMNS
        ))
        .bind(organization_id)
        .bind(plan.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Organization"))?;

        tracing::info!(
            organization_id = %organization.id,
            plan = %plan,
            "Organization plan changed"
        );
        Ok(organization)
    }
}

fn parse_plan(plan: &str) -> Result<Plan, ServiceError> {
    Plan::parse(plan).ok_or_else(|| {
        ServiceError::validation("plan", format!("unknown plan '{}'", plan.trim()))
    })
}

pub fn validate_slug(slug: &str) -> Result<String, ServiceError> {
    let slug = slug.trim();
    let valid_chars = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let hyphen_edge = slug.starts_with('-') || slug.ends_with('-');
    if !(2..=63).contains(&slug.len()) || !valid_chars || hyphen_edge {
        return Err(ServiceError::validation(
            "slug",
            "must be 2-63 characters of lowercase letters, digits and inner hyphens",
        ));
    }
    Ok(slug.to_string())
}
