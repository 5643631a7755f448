use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{conflict_on_unique, optional_text, required_text, ServiceError};
use crate::authz;
use crate::database::models::{Embed, Group, Variant};
use crate::database::DatabaseManager;
use crate::middleware::Session;
use crate::plans::plan_limits;
use crate::types::{is_language_tag, validate_reorder, ReorderItem};

const EMBED_COLUMNS: &str = "id, organization_id, name, description, is_published, view_count, \
     created_by, created_at, updated_at";
const GROUP_COLUMNS: &str =
    "id, organization_id, embed_id, title, sort_order, created_at, updated_at";
const VARIANT_COLUMNS: &str = "id, organization_id, group_id, language, title, sort_order, \
     upload_id, asset_id, playback_id, status, duration_seconds, view_count, \
     created_at, updated_at";

#[derive(Debug, Clone, Serialize)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: Group,
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedDetail {
    #[serde(flatten)]
    pub embed: Embed,
    pub groups: Vec<GroupDetail>,
}

/// Partial update for an embed; `description: Some("")` clears it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbedChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariantChanges {
    pub language: Option<String>,
    pub title: Option<String>,
}

/// What external sites receive for a published embed
#[derive(Debug, Clone, Serialize)]
pub struct PublicEmbed {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub groups: Vec<PublicGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicGroup {
    pub id: Uuid,
    pub title: String,
    pub variants: Vec<PublicVariant>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicVariant {
    pub id: Uuid,
    pub language: String,
    pub title: Option<String>,
    pub playback_id: String,
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewCounts {
    pub embed_views: i64,
    pub variant_views: Option<i64>,
}

/// Sibling collections that can be reordered in one batch
#[derive(Debug, Clone, Copy)]
enum Siblings {
    GroupsOfEmbed,
    VariantsOfGroup,
}

impl Siblings {
    fn table(&self) -> &'static str {
        match self {
            Siblings::GroupsOfEmbed => "video_groups",
            Siblings::VariantsOfGroup => "video_variants",
        }
    }

    fn parent_column(&self) -> &'static str {
        match self {
            Siblings::GroupsOfEmbed => "embed_id",
            Siblings::VariantsOfGroup => "group_id",
        }
    }

    fn item_name(&self) -> &'static str {
        match self {
            Siblings::GroupsOfEmbed => "Group",
            Siblings::VariantsOfGroup => "Variant",
        }
    }
}

pub struct EmbedService {
    pool: PgPool,
}

impl EmbedService {
    pub async fn new() -> Result<Self, ServiceError> {
        Ok(Self::from_pool(DatabaseManager::pool().await?))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    // --- embeds ---

    pub async fn list_embeds(&self, organization_id: Uuid) -> Result<Vec<Embed>, ServiceError> {
        let embeds = sqlx::query_as::<_, Embed>(&format!(
            "SELECT {} FROM embeds WHERE organization_id = $1 ORDER BY created_at DESC",
            EMBED_COLUMNS
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(embeds)
    }

    pub async fn create_embed(
        &self,
        session: &Session,
        name: &str,
        description: Option<&str>,
    ) -> Result<Embed, ServiceError> {
        authz::require_content_editor(session)?;
        let name = required_text("name", name, 120)?;
        let description = optional_text("description", description, 2000)?;

        let mut tx = self.pool.begin().await?;

        let plan: String =
            sqlx::query_scalar("SELECT plan FROM organizations WHERE id = $1 FOR UPDATE")
                .bind(session.organization_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ServiceError::not_found("Organization"))?;

        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM embeds WHERE organization_id = $1")
                .bind(session.organization_id)
                .fetch_one(&mut *tx)
                .await?;
        let max_embeds = plan_limits(&plan).max_embeds;
        if existing >= i64::from(max_embeds) {
            return Err(ServiceError::PlanLimit(format!(
                "The {} plan allows {} embeds",
                plan, max_embeds
            )));
        }

        let embed = sqlx::query_as::<_, Embed>(&format!(
            r#"
            INSERT INTO embeds (id, organization_id, name, description, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            EMBED_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(session.organization_id)
        .bind(&name)
        .bind(&description)
        .bind(session.user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            organization_id = %session.organization_id,
            embed_id = %embed.id,
            "Embed created"
        );
        Ok(embed)
    }

    pub async fn get_embed(
        &self,
        organization_id: Uuid,
        embed_id: Uuid,
    ) -> Result<EmbedDetail, ServiceError> {
        let embed = sqlx::query_as::<_, Embed>(&format!(
            "SELECT {} FROM embeds WHERE id = $1 AND organization_id = $2",
            EMBED_COLUMNS
        ))
        .bind(embed_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Embed"))?;

        let groups = self.load_groups(embed.id).await?;
        Ok(EmbedDetail { embed, groups })
    }

    pub async fn update_embed(
        &self,
        session: &Session,
        embed_id: Uuid,
        changes: EmbedChanges,
    ) -> Result<Embed, ServiceError> {
        authz::require_content_editor(session)?;

        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Embed>(&format!(
            "SELECT {} FROM embeds WHERE id = $1 AND organization_id = $2 FOR UPDATE",
            EMBED_COLUMNS
        ))
        .bind(embed_id)
        .bind(session.organization_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::not_found("Embed"))?;

        let name = match changes.name.as_deref() {
            Some(name) => required_text("name", name, 120)?,
            None => current.name,
        };
        let description = match changes.description.as_deref() {
            Some(description) => optional_text("description", Some(description), 2000)?,
            None => current.description,
        };
        let is_published = changes.is_published.unwrap_or(current.is_published);

        let embed = sqlx::query_as::<_, Embed>(&format!(
            r#"
            UPDATE embeds SET name = $2, description = $3, is_published = $4, updated_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            EMBED_COLUMNS
        ))
        .bind(embed_id)
        .bind(&name)
        .bind(&description)
        .bind(is_published)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        if embed.is_published != current.is_published {
            tracing::info!(
                embed_id = %embed.id,
                published = embed.is_published,
                "Embed visibility changed"
            );
        }
        Ok(embed)
    }

    pub async fn delete_embed(
        &self,
        session: &Session,
        embed_id: Uuid,
    ) -> Result<(), ServiceError> {
        authz::require_content_editor(session)?;
        self.delete_scoped("embeds", "Embed", session.organization_id, embed_id).await
    }

    // --- groups ---

    pub async fn create_group(
        &self,
        session: &Session,
        embed_id: Uuid,
        title: &str,
    ) -> Result<Group, ServiceError> {
        authz::require_content_editor(session)?;
        let title = required_text("title", title, 200)?;

        let mut tx = self.pool.begin().await?;

        // Lock the parent so concurrent appends get distinct sort orders
        let embed_exists: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM embeds WHERE id = $1 AND organization_id = $2 FOR UPDATE",
        )
        .bind(embed_id)
        .bind(session.organization_id)
        .fetch_optional(&mut *tx)
        .await?;
        if embed_exists.is_none() {
            return Err(ServiceError::not_found("Embed"));
        }

        let group = sqlx::query_as::<_, Group>(&format!(
            r#"
            INSERT INTO video_groups (id, organization_id, embed_id, title, sort_order)
            VALUES ($1, $2, $3, $4,
                    (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM video_groups WHERE embed_id = $3))
            RETURNING {}
            "#,
            GROUP_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(session.organization_id)
        .bind(embed_id)
        .bind(&title)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(group)
    }

    pub async fn update_group(
        &self,
        session: &Session,
        group_id: Uuid,
        title: &str,
    ) -> Result<Group, ServiceError> {
        authz::require_content_editor(session)?;
        let title = required_text("title", title, 200)?;

        sqlx::query_as::<_, Group>(&format!(
            r#"
            UPDATE video_groups SET title = $3, updated_at = now()
            WHERE id = $1 AND organization_id = $2
            RETURNING {}
            "#,
            GROUP_COLUMNS
        ))
        .bind(group_id)
        .bind(session.organization_id)
        .bind(&title)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Group"))
    }

    pub async fn delete_group(
        &self,
        session: &Session,
        group_id: Uuid,
    ) -> Result<(), ServiceError> {
        authz::require_content_editor(session)?;
        self.delete_scoped("video_groups", "Group", session.organization_id, group_id).await
    }

    pub async fn reorder_groups(
        &self,
        session: &Session,
        embed_id: Uuid,
        items: &[ReorderItem],
    ) -> Result<(), ServiceError> {
        self.reorder(session, Siblings::GroupsOfEmbed, embed_id, items).await
    }

    // --- variants ---

    pub async fn create_variant(
        &self,
        session: &Session,
        group_id: Uuid,
        language: &str,
        title: Option<&str>,
    ) -> Result<Variant, ServiceError> {
        authz::require_content_editor(session)?;
        let language = validate_language(language)?;
        let title = optional_text("title", title, 200)?;

        let mut tx = self.pool.begin().await?;

        let group_exists: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM video_groups WHERE id = $1 AND organization_id = $2 FOR UPDATE",
        )
        .bind(group_id)
        .bind(session.organization_id)
        .fetch_optional(&mut *tx)
        .await?;
        if group_exists.is_none() {
            return Err(ServiceError::not_found("Group"));
        }

        let (plan, existing): (String, i64) = sqlx::query_as(
            r#"
            SELECT o.plan, (SELECT COUNT(*) FROM video_variants v WHERE v.group_id = $2)
            FROM organizations o
            WHERE o.id = $1
            "#,
        )
        .bind(session.organization_id)
        .bind(group_id)
        .fetch_one(&mut *tx)
        .await?;
        let max_variants = plan_limits(&plan).max_variants_per_group;
        if existing >= i64::from(max_variants) {
            return Err(ServiceError::PlanLimit(format!(
                "The {} plan allows {} language variants per group",
                plan, max_variants
            )));
        }

        let variant = sqlx::query_as::<_, Variant>(&format!(
            r#"
            INSERT INTO video_variants (id, organization_id, group_id, language, title, sort_order)
            VALUES ($1, $2, $3, $4, $5,
                    (SELECT COALESCE(MAX(sort_order) + 1, 0)
                     FROM video_variants WHERE group_id = $3))
            RETURNING {}
            "#,
            VARIANT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(session.organization_id)
        .bind(group_id)
        .bind(&language)
        .bind(&title)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "This group already has a variant for that language"))?;

        tx.commit().await?;

        tracing::info!(
            group_id = %group_id,
            variant_id = %variant.id,
            language = %variant.language,
            "Variant created"
        );
        Ok(variant)
    }

    pub async fn get_variant(
        &self,
        organization_id: Uuid,
        variant_id: Uuid,
    ) -> Result<Variant, ServiceError> {
        sqlx::query_as::<_, Variant>(&format!(
            "SELECT {} FROM video_variants WHERE id = $1 AND organization_id = $2",
            VARIANT_COLUMNS
        ))
        .bind(variant_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Variant"))
    }

    pub async fn update_variant(
        &self,
        session: &Session,
        variant_id: Uuid,
        changes: VariantChanges,
    ) -> Result<Variant, ServiceError> {
        authz::require_content_editor(session)?;
        let language = changes.language.as_deref().map(validate_language).transpose()?;
        let title_given = changes.title.is_some();
        let title = optional_text("title", changes.title.as_deref(), 200)?;

        sqlx::query_as::<_, Variant>(&format!(
            r#"
            UPDATE video_variants
            SET language = COALESCE($3, language),
                title = CASE WHEN $4 THEN $5 ELSE title END,
                updated_at = now()
            WHERE id = $1 AND organization_id = $2
            RETURNING {}
            "#,
            VARIANT_COLUMNS
        ))
        .bind(variant_id)
        .bind(session.organization_id)
        .bind(&language)
        .bind(title_given)
        .bind(&title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "This group already has a variant for that language"))?
        .ok_or_else(|| ServiceError::not_found("Variant"))
    }

    pub async fn delete_variant(
        &self,
        session: &Session,
        variant_id: Uuid,
    ) -> Result<(), ServiceError> {
        authz::require_content_editor(session)?;
        self.delete_scoped("video_variants", "Variant", session.organization_id, variant_id).await
    }

    pub async fn reorder_variants(
        &self,
        session: &Session,
        group_id: Uuid,
        items: &[ReorderItem],
    ) -> Result<(), ServiceError> {
        self.reorder(session, Siblings::VariantsOfGroup, group_id, items).await
    }

    // --- public surface ---

    pub async fn public_embed(&self, embed_id: Uuid) -> Result<PublicEmbed, ServiceError> {
        let embed = sqlx::query_as::<_, Embed>(&format!(
            "SELECT {} FROM embeds WHERE id = $1 AND is_published",
            EMBED_COLUMNS
        ))
        .bind(embed_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Embed"))?;

        let groups = self.load_groups(embed.id).await?;
        Ok(to_public(embed, groups))
    }

    /// Atomic view increment, delegated to the database
    pub async fn record_view(
        &self,
        embed_id: Uuid,
        variant_id: Option<Uuid>,
    ) -> Result<ViewCounts, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let embed_views: i64 = sqlx::query_scalar(
            r#"
            UPDATE embeds SET view_count = view_count + 1
            WHERE id = $1 AND is_published
            RETURNING view_count
            "#,
        )
        .bind(embed_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::not_found("Embed"))?;

        let variant_views = match variant_id {
            Some(variant_id) => {
                let views: i64 = sqlx::query_scalar(
                    r#"
                    UPDATE video_variants v SET view_count = v.view_count + 1
                    FROM video_groups g
                    WHERE v.id = $1 AND v.group_id = g.id AND g.embed_id = $2
                    RETURNING v.view_count
                    "#,
                )
                .bind(variant_id)
                .bind(embed_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ServiceError::not_found("Variant"))?;
                Some(views)
            }
            None => None,
        };

        tx.commit().await?;
        Ok(ViewCounts {
            embed_views,
            variant_views,
        })
    }

    // --- helpers ---

    async fn load_groups(&self, embed_id: Uuid) -> Result<Vec<GroupDetail>, ServiceError> {
        let groups = sqlx::query_as::<_, Group>(&format!(
            "SELECT {} FROM video_groups WHERE embed_id = $1 ORDER BY sort_order, created_at",
            GROUP_COLUMNS
        ))
        .bind(embed_id)
        .fetch_all(&self.pool)
        .await?;

        let group_ids: Vec<Uuid> = groups.iter().map(|g| g.id).collect();
        let variants = if group_ids.is_empty() {
            Vec::new()
        } else {
            sqlx::query_as::<_, Variant>(&format!(
                "SELECT {} FROM video_variants WHERE group_id = ANY($1) \
                 ORDER BY sort_order, created_at",
                VARIANT_COLUMNS
            ))
            .bind(&group_ids)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(assemble_groups(groups, variants))
    }

    async fn delete_scoped(
        &self,
        table: &'static str,
        what: &str,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<(), ServiceError> {
        let sql = format!("DELETE FROM {} WHERE id = $1 AND organization_id = $2", table);
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(organization_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found(what));
        }
        tracing::info!(organization_id = %organization_id, id = %id, "{} deleted", what);
        Ok(())
    }

    /// Apply `(id, sort_order)` pairs as independent updates inside one transaction.
    /// Any id outside the parent rolls the whole batch back.
    async fn reorder(
        &self,
        session: &Session,
        siblings: Siblings,
        parent_id: Uuid,
        items: &[ReorderItem],
    ) -> Result<(), ServiceError> {
        authz::require_content_editor(session)?;
        validate_reorder(items).map_err(|e| ServiceError::validation("items", e.to_string()))?;

        let sql = format!(
            "UPDATE {} SET sort_order = $1, updated_at = now() \
             WHERE id = $2 AND {} = $3 AND organization_id = $4",
            siblings.table(),
            siblings.parent_column()
        );

        let mut tx = self.pool.begin().await?;
        for item in items {
            let result = sqlx::query(&sql)
                .bind(item.sort_order)
                .bind(item.id)
                .bind(parent_id)
                .bind(session.organization_id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() != 1 {
                // Dropping the transaction rolls back updates already applied
                return Err(ServiceError::NotFound(format!(
                    "{} {} not found in this collection",
                    siblings.item_name(),
                    item.id
                )));
            }
        }
        tx.commit().await?;

        tracing::debug!(
            parent = %parent_id,
            count = items.len(),
            "{}s reordered",
            siblings.item_name(),
        );
        Ok(())
    }
}

fn validate_language(language: &str) -> Result<String, ServiceError> {
    let language = language.trim();
    if !is_language_tag(language) {
        return Err(ServiceError::validation(
            "language",
            "expected a language tag such as 'en' or 'pt-BR'",
        ));
    }
    Ok(language.to_string())
}

/// Attach variants to their groups, preserving the query order of both
pub fn assemble_groups(groups: Vec<Group>, variants: Vec<Variant>) -> Vec<GroupDetail> {
    let mut by_group: HashMap<Uuid, Vec<Variant>> = HashMap::new();
    for variant in variants {
        by_group.entry(variant.group_id).or_default().push(variant);
    }

    groups
        .into_iter()
        .map(|group| GroupDetail {
            variants: by_group.remove(&group.id).unwrap_or_default(),
            group,
        })
        .collect()
}

/// Strip an embed down to what an external player needs: ready variants only
pub fn to_public(embed: Embed, groups: Vec<GroupDetail>) -> PublicEmbed {
    PublicEmbed {
        id: embed.id,
        name: embed.name,
        description: embed.description,
        groups: groups
            .into_iter()
            .map(|detail| PublicGroup {
                id: detail.group.id,
                title: detail.group.title,
                variants: detail
                    .variants
                    .into_iter()
                    .filter(Variant::is_ready)
                    .filter_map(|v| {
                        Some(PublicVariant {
                            id: v.id,
                            language: v.language,
                            title: v.title,
                            playback_id: v.playback_id?,
                            duration_seconds: v.duration_seconds,
                        })
                    })
                    .collect(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn group(embed_id: Uuid, sort_order: i32) -> Group {
        Group {
            id: Uuid::new_v4(),
            organization_id: Uuid::nil(),
            embed_id,
            title: format!("Group {}", sort_order),
            sort_order,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn variant(group_id: Uuid, language: &str, status: &str, playback_id: Option<&str>) -> Variant {
        Variant {
            id: Uuid::new_v4(),
            organization_id: Uuid::nil(),
            group_id,
            language: language.to_string(),
            title: None,
            sort_order: 0,
            upload_id: None,
            asset_id: None,
            playback_id: playback_id.map(str::to_string),
            status: status.to_string(),
            duration_seconds: Some(12.5),
            view_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn embed() -> Embed {
        Embed {
            id: Uuid::new_v4(),
            organization_id: Uuid::nil(),
            name: "Onboarding".to_string(),
            description: None,
            is_published: true,
            view_count: 0,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn assembles_variants_under_their_groups_in_order() {
        let e = embed();
        let (g1, g2) = (group(e.id, 0), group(e.id, 1));
        let variants = vec![
            variant(g2.id, "de", "ready", Some("pb-de")),
            variant(g1.id, "en", "ready", Some("pb-en")),
            variant(g1.id, "fr", "pending", None),
        ];
        let details = assemble_groups(vec![g1.clone(), g2.clone()], variants);

        assert_eq!(details.len(), 2);
        assert_eq!(details[0].group.id, g1.id);
        let languages: Vec<_> = details[0].variants.iter().map(|v| v.language.as_str()).collect();
        assert_eq!(languages, ["en", "fr"]);
        assert_eq!(details[1].variants.len(), 1);
    }

    #[test]
    fn groups_without_variants_are_kept() {
        let e = embed();
        let details = assemble_groups(vec![group(e.id, 0)], Vec::new());
        assert_eq!(details.len(), 1);
        assert!(details[0].variants.is_empty());
    }

    #[test]
    fn public_payload_only_exposes_ready_variants() {
        let e = embed();
        let g = group(e.id, 0);
        let details = assemble_groups(
            vec![g.clone()],
            vec![
                variant(g.id, "en", "ready", Some("pb-en")),
                variant(g.id, "es", "processing", None),
                variant(g.id, "fr", "errored", None),
            ],
        );
        let public = to_public(e, details);
        assert_eq!(public.groups[0].variants.len(), 1);
        assert_eq!(public.groups[0].variants[0].playback_id, "pb-en");

        let json = serde_json::to_value(&public).unwrap();
        assert!(json["groups"][0]["variants"][0].get("upload_id").is_none());
    }

    #[test]
    fn detail_flattens_the_embed() {
        let detail = EmbedDetail {
            embed: embed(),
            groups: Vec::new(),
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["name"], "Onboarding");
        assert!(json["groups"].as_array().unwrap().is_empty());
    }

    #[test]
    fn language_is_trimmed_and_checked() {
        assert_eq!(validate_language(" pt-BR ").unwrap(), "pt-BR");
        assert!(matches!(
            validate_language("Portuguese"),
            Err(ServiceError::Validation { field: "language", .. })
        ));
    }
}
