use serde::Serialize;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::plans::{Plan, PlanLimits};

#[derive(Serialize)]
struct PlanRow {
    plan: Plan,
    #[serde(flatten)]
    limits: PlanLimits,
}

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let rows: Vec<PlanRow> = Plan::ALL
        .iter()
        .map(|plan| PlanRow {
            plan: *plan,
            limits: plan.limits(),
        })
        .collect();

    output_table(
        &output_format,
        "plans",
        &rows,
        &format!(
            "{:<12} {:>7} {:>6} {:>9} {:>14} {:>14}",
            "PLAN", "EMBEDS", "USERS", "VARIANTS", "MONTHLY VIEWS", "VIDEO MINUTES"
        ),
        |r| {
            format!(
                "{:<12} {:>7} {:>6} {:>9} {:>14} {:>14}",
                r.plan.as_str(),
                r.limits.max_embeds,
                r.limits.max_users,
                r.limits.max_variants_per_group,
                r.limits.max_monthly_views,
                r.limits.max_video_minutes
            )
        },
    )
}
