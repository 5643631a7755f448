use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::database::models::User;
use crate::database::DatabaseManager;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue a session token for an existing organization member")]
    Member {
        #[arg(help = "Organization slug")]
        org: String,

        #[arg(help = "Member email")]
        email: String,
    },

    #[command(about = "Issue an internal staff token for /api/internal")]
    Internal {
        #[arg(help = "Staff email recorded in the token")]
        email: String,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let claims = match cmd {
        TokenCommands::Member { org, email } => {
            let pool = DatabaseManager::pool().await?;
            let user = sqlx::query_as::<_, User>(
                r#"
                SELECT u.id, u.organization_id, u.email, u.name, u.role, u.created_at, u.updated_at
                FROM users u
                JOIN organizations o ON o.id = u.organization_id
                WHERE o.slug = $1 AND u.email = $2
                "#,
            )
            .bind(org.trim())
            .bind(email.trim().to_lowercase())
            .fetch_optional(&pool)
            .await?
            .ok_or_else(|| anyhow::anyhow!("No member {} in organization '{}'", email, org))?;

            Claims::for_member(user.id, user.organization_id, user.email.clone(), user.role())
        }
        // Staff identities live outside the tenant tables
        TokenCommands::Internal { email } => Claims::for_internal(Uuid::new_v4(), email),
    };

    let token = generate_jwt(&claims)?;
    output_value(
        &output_format,
        "token",
        &token,
        json!({ "expires_in": claims.expires_in(), "subject": claims.sub }),
    )
}
