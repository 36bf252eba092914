//! Progress and log projection for the stage sequence
//!
//! Everything the sequencer writes into a record besides the status itself
//! is derived here: percent complete, log lines, and the synthesized
//! service URL and endpoints.

use crate::models::deployment::{Endpoint, LogEntry, LogSeverity};

/// Fixed stage sequence every deployment goes through
pub const STAGES: [&str; 6] = [
    "Building container image",
    "Pushing to registry",
    "Creating cloud resources",
    "Deploying service",
    "Setting up monitoring",
    "Generating endpoints",
];

/// Percent complete when entering stage `index` of `total`
pub fn progress_at(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((index as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

pub fn stage_started(stage: &str) -> LogEntry {
    LogEntry::new(LogSeverity::Info, format!("{}...", stage))
}

pub fn stage_completed(stage: &str) -> LogEntry {
    LogEntry::new(LogSeverity::Success, format!("✓ {} completed", stage))
}

pub fn deployment_succeeded(url: &str) -> LogEntry {
    LogEntry::new(
        LogSeverity::Success,
        format!("Deployment successful! Service available at {}", url),
    )
}

pub fn deployment_failed(reason: &str) -> LogEntry {
    LogEntry::new(LogSeverity::Error, format!("Deployment failed: {}", reason))
}

pub fn deployment_cancelled() -> LogEntry {
    LogEntry::new(LogSeverity::Info, "Deployment cancelled by user")
}

/// Service URL for a finished deployment.
///
/// Deterministic in provider, region and deployment id.
pub fn service_url(cloud_provider: &str, region: &str, deployment_id: &str) -> String {
    let service_name = service_name(deployment_id);
    match cloud_provider {
        "gcp" => format!("https://{}-{}.run.app", service_name, region),
        _ => format!(
            "https://{}.execute-api.{}.amazonaws.com",
            service_name, region
        ),
    }
}

fn service_name(deployment_id: &str) -> String {
    let suffix = deployment_id
        .split_once('_')
        .map(|(_, rest)| rest)
        .unwrap_or(deployment_id);
    let short: String = suffix.chars().take(12).collect();
    format!("svc-{}", short)
}

/// Endpoints exposed by every deployed agent service
pub fn endpoints(url: &str) -> Vec<Endpoint> {
    [("/health", "GET"), ("/chat", "POST"), ("/status", "GET")]
        .into_iter()
        .map(|(path, method)| Endpoint {
            path: path.to_string(),
            url: format!("{}{}", url, path),
            method: method.to_string(),
        })
        .collect()
}
