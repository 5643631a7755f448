// handlers/public/plans.rs - GET /plans handler

use serde::Serialize;

use crate::middleware::{ApiResponse, ApiResult};
use crate::plans::{Plan, PlanLimits};

#[derive(Debug, Serialize)]
pub struct PlanEntry {
    pub plan: Plan,
    pub limits: PlanLimits,
}

/// Every plan with its limits, cheapest first
pub async fn plans_get() -> ApiResult<Vec<PlanEntry>> {
    let plans = Plan::ALL
        .iter()
        .map(|plan| PlanEntry {
            plan: *plan,
            limits: plan.limits(),
        })
        .collect();
    Ok(ApiResponse::success(plans))
}
