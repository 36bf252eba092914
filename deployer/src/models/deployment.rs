//! Deployment models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cloud::registry::ProviderRegistry;
use crate::deploy::fsm::DeploymentState;
use crate::errors::DeployError;
use crate::utils::generate_deployment_id;

pub const DEFAULT_CLOUD_PROVIDER: &str = "gcp";
pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_ENVIRONMENT: &str = "production";

/// Severity of a deployment log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    Info,
    Success,
    Error,
}

/// One line of deployment history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogSeverity,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogSeverity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        }
    }
}

/// Append-only deployment log.
///
/// Entries can only be pushed; timestamps are clamped so the sequence
/// never goes backwards even if the wall clock does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentLog(Vec<LogEntry>);

impl DeploymentLog {
    pub fn push(&mut self, mut entry: LogEntry) {
        if let Some(last) = self.0.last() {
            if entry.timestamp < last.timestamp {
                entry.timestamp = last.timestamp;
            }
        }
        self.0.push(entry);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Public endpoint of a deployed service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub path: String,
    pub url: String,
    pub method: String,
}

/// A deployment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
    pub owner_id: String,
    pub bundle_id: String,
    pub cloud_provider: String,
    pub region: String,
    pub environment: String,
    pub status: DeploymentState,
    pub progress: u8,
    pub logs: DeploymentLog,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Vec<Endpoint>>,
    pub created_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Deployment {
    /// Build a fresh pending record for `owner_id`
    pub fn new(owner_id: &str, request: ValidatedRequest) -> Self {
        let now = Utc::now();
        Self {
            id: generate_deployment_id(),
            owner_id: owner_id.to_string(),
            bundle_id: request.bundle_id,
            cloud_provider: request.cloud_provider,
            region: request.region,
            environment: request.environment,
            status: DeploymentState::Pending,
            progress: 0,
            logs: DeploymentLog::default(),
            url: None,
            endpoints: None,
            created_at: now,
            started_at: now,
            completed_at: None,
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            status: self.status,
            progress: self.progress,
            url: self.url.clone(),
            endpoints: self.endpoints.clone(),
        }
    }
}

/// Point-in-time view returned to status pollers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: DeploymentState,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Vec<Endpoint>>,
}

/// Start-deployment request as received from callers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    #[serde(default)]
    pub bundle_id: Option<String>,
    #[serde(default)]
    pub cloud_provider: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
}

/// A request that passed validation, with defaults filled in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub bundle_id: String,
    pub cloud_provider: String,
    pub region: String,
    pub environment: String,
}

impl DeployRequest {
    /// Check required fields and resolve the provider against `registry`.
    ///
    /// The bundle id is only checked for presence; its contents belong to
    /// the bundle store.
    pub fn validate(self, registry: &ProviderRegistry) -> Result<ValidatedRequest, DeployError> {
        let bundle_id = self
            .bundle_id
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .ok_or_else(|| DeployError::ValidationError("Bundle ID is required".to_string()))?;

        let cloud_provider = match self.cloud_provider {
            Some(p) if p.trim().is_empty() => {
                return Err(DeployError::ValidationError(
                    "Cloud provider must not be empty".to_string(),
                ));
            }
            Some(p) => p.trim().to_lowercase(),
            None => DEFAULT_CLOUD_PROVIDER.to_string(),
        };
        if registry.get(&cloud_provider).is_none() {
            return Err(DeployError::UnsupportedProvider(cloud_provider));
        }

        Ok(ValidatedRequest {
            bundle_id,
            cloud_provider,
            region: non_blank_or(self.region, DEFAULT_REGION),
            environment: non_blank_or(self.environment, DEFAULT_ENVIRONMENT),
        })
    }
}

fn non_blank_or(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
