use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::services::OrganizationService;

#[derive(Subcommand)]
pub enum OrgCommands {
    #[command(about = "List all organizations")]
    List,

    #[command(about = "Create an organization and its owner")]
    Create {
        #[arg(long, help = "Display name")]
        name: String,

        #[arg(long, help = "URL-safe identifier (lowercase letters, digits, hyphens)")]
        slug: String,

        #[arg(long, help = "Email of the first owner")]
        owner_email: String,

        #[arg(long, help = "Plan identifier (free, starter, pro, enterprise)")]
        plan: Option<String>,
    },

    #[command(about = "Change an organization's plan")]
    Plan {
        #[arg(help = "Organization ID")]
        id: Uuid,

        #[arg(help = "New plan identifier")]
        plan: String,
    },
}

pub async fn handle(cmd: OrgCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let service = OrganizationService::new().await?;

    match cmd {
        OrgCommands::List => {
            let organizations = service.list_all().await?;
            output_table(
                &output_format,
                "organizations",
                &organizations,
                &format!(
                    "{:<36}  {:<20} {:<10} {:>7} {:>6}",
                    "ID", "SLUG", "PLAN", "MEMBERS", "EMBEDS"
                ),
                |o| {
                    format!(
                        "{:<36}  {:<20} {:<10} {:>7} {:>6}",
                        o.id, o.slug, o.plan, o.member_count, o.embed_count
                    )
                },
            )
        }
        OrgCommands::Create {
            name,
            slug,
            owner_email,
            plan,
        } => {
            let created = service
                .create_with_owner(&name, &slug, plan.as_deref(), &owner_email)
                .await?;
            output_success(
                &output_format,
                &format!(
                    "Created organization '{}' ({}) owned by {}",
                    created.organization.slug, created.organization.id, created.owner.email
                ),
                Some(json!({
                    "organization": created.organization,
                    "owner": created.owner,
                })),
            )
        }
        OrgCommands::Plan { id, plan } => {
            let organization = service.set_plan(id, &plan).await?;
            output_success(
                &output_format,
                &format!(
                    "Organization '{}' is now on the {} plan",
                    organization.slug, organization.plan
                ),
                Some(json!({ "organization": organization })),
            )
        }
    }
}
