//! Monthly cost estimation

use serde::{Deserialize, Serialize};

use crate::cloud::registry::ProviderRegistry;
use crate::errors::DeployError;

const DAYS_PER_MONTH: f64 = 30.0;

fn default_requests() -> u64 {
    1000
}

/// Cost estimation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostRequest {
    pub cloud_provider: String,
    #[serde(default)]
    pub bundle_type: Option<String>,
    /// Expected requests per day
    #[serde(default = "default_requests")]
    pub estimated_requests: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub requests: u64,
    pub request_cost: f64,
    pub bundle_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub estimated_monthly_cost: f64,
    pub breakdown: CostBreakdown,
    pub currency: String,
}

/// Bundles with several services cost more to run
pub fn bundle_multiplier(bundle_type: Option<&str>) -> f64 {
    match bundle_type {
        Some("ai-agent-stack") => 2.0,
        Some("mcp-bundle") => 1.5,
        _ => 1.0,
    }
}

pub fn estimate(
    registry: &ProviderRegistry,
    request: &CostRequest,
) -> Result<CostEstimate, DeployError> {
    let provider = registry
        .get(&request.cloud_provider)
        .ok_or_else(|| DeployError::UnsupportedProvider(request.cloud_provider.clone()))?;

    let request_cost =
        request.estimated_requests as f64 * provider.request_price() * DAYS_PER_MONTH;
    let multiplier = bundle_multiplier(request.bundle_type.as_deref());

    Ok(CostEstimate {
        estimated_monthly_cost: round_cents(request_cost * multiplier),
        breakdown: CostBreakdown {
            requests: request.estimated_requests,
            request_cost: round_cents(request_cost),
            bundle_multiplier: multiplier,
        },
        currency: "USD".to_string(),
    })
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
