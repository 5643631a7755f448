//! Subscription plans and their fixed limits.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Starter,
    Pro,
    Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub max_embeds: u32,
    pub max_users: u32,
    pub max_variants_per_group: u32,
    pub max_monthly_views: u64,
    pub max_video_minutes: u32,
}

impl Plan {
    pub const ALL: [Plan; 4] = [Plan::Free, Plan::Starter, Plan::Pro, Plan::Enterprise];

    /// Strict parse; `None` for anything that is not a known plan identifier.
    pub fn parse(identifier: &str) -> Option<Plan> {
        match identifier.trim().to_ascii_lowercase().as_str() {
            "free" => Some(Plan::Free),
            "starter" => Some(Plan::Starter),
            "pro" => Some(Plan::Pro),
            "enterprise" => Some(Plan::Enterprise),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Starter => "starter",
            Plan::Pro => "pro",
            Plan::Enterprise => "enterprise",
        }
    }

    pub fn limits(&self) -> PlanLimits {
        match self {
            Plan::Free => PlanLimits {
                max_embeds: 3,
                max_users: 2,
                max_variants_per_group: 2,
                max_monthly_views: 1_000,
                max_video_minutes: 30,
            },
            Plan::Starter => PlanLimits {
                max_embeds: 25,
                max_users: 5,
                max_variants_per_group: 5,
                max_monthly_views: 25_000,
                max_video_minutes: 300,
            },
            Plan::Pro => PlanLimits {
                max_embeds: 100,
                max_users: 20,
                max_variants_per_group: 20,
                max_monthly_views: 250_000,
                max_video_minutes: 2_000,
            },
            Plan::Enterprise => PlanLimits {
                max_embeds: 1_000,
                max_users: 200,
                max_variants_per_group: 50,
                max_monthly_views: 5_000_000,
                max_video_minutes: 20_000,
            },
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Limits for a stored plan identifier. Unknown identifiers fall back to the free tier.
pub fn plan_limits(identifier: &str) -> PlanLimits {
    Plan::parse(identifier).unwrap_or(Plan::Free).limits()
}
