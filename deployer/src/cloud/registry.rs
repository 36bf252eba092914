//! Cloud provider registry

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Unit prices used for cost estimates, keyed by billing dimension
pub type Pricing = BTreeMap<String, f64>;

/// Display metadata for a supported provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudProvider {
    pub name: String,
    pub service: String,
    pub regions: Vec<String>,
    pub pricing: Pricing,
}

impl CloudProvider {
    /// Price per request, zero when the provider bills no such dimension
    pub fn request_price(&self) -> f64 {
        self.pricing.get("requests").copied().unwrap_or(0.0)
    }

    pub fn has_region(&self, region: &str) -> bool {
        self.regions.iter().any(|r| r == region)
    }
}

/// Lookup table of supported providers, keyed by short name (`gcp`, `aws`)
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, CloudProvider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the providers the platform ships with
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            "gcp",
            CloudProvider {
                name: "Google Cloud Platform".to_string(),
                service: "Cloud Run".to_string(),
                regions: strings(&["us-central1", "us-east1", "europe-west1", "asia-east1"]),
                pricing: pricing(&[
                    ("requests", 0.000_000_4),
                    ("cpu", 0.000_024),
                    ("memory", 0.000_002_5),
                ]),
            },
        );
        registry.register(
            "aws",
            CloudProvider {
                name: "Amazon Web Services".to_string(),
                service: "Lambda + ECS".to_string(),
                regions: strings(&["us-east-1", "us-west-2", "eu-west-1", "ap-southeast-1"]),
                pricing: pricing(&[
                    ("requests", 0.000_000_2),
                    ("duration", 0.000_016_666_7),
                    ("storage", 0.000_000_030_9),
                ]),
            },
        );
        registry
    }

    pub fn register(&mut self, key: impl Into<String>, provider: CloudProvider) {
        self.providers.insert(key.into(), provider);
    }

    pub fn get(&self, key: &str) -> Option<&CloudProvider> {
        self.providers.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn pricing(values: &[(&str, f64)]) -> Pricing {
    values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}
