//! Stage sequencer tests

use std::sync::Arc;

use aluminum_deployer::deploy::fsm::DeploymentState;
use aluminum_deployer::deploy::projector::STAGES;
use aluminum_deployer::deploy::sequencer::Outcome;
use aluminum_deployer::errors::DeployError;
use aluminum_deployer::models::deployment::{Deployment, LogEntry, LogSeverity};

use crate::support::{gated_sleep, harness, harness_with, instant_sleep, request, FlakyStore};

/// The twelve stage lines of an uninterrupted run, in order
fn expected_stage_lines() -> Vec<(LogSeverity, String)> {
    STAGES
        .iter()
        .flat_map(|stage| {
            [
                (LogSeverity::Info, format!("{}...", stage)),
                (LogSeverity::Success, format!("✓ {} completed", stage)),
            ]
        })
        .collect()
}

fn lines(logs: &[LogEntry]) -> Vec<(LogSeverity, String)> {
    logs.iter().map(|e| (e.level, e.message.clone())).collect()
}

async fn pending(h: &crate::support::Harness, owner: &str) -> Deployment {
    let validated = request("bundle_1", "gcp", "us-central1")
        .validate(h.service.registry())
        .unwrap();
    h.store.create(Deployment::new(owner, validated)).await.unwrap()
}

#[tokio::test]
async fn test_full_run_completes() {
    let h = harness(instant_sleep());
    let deployment = pending(&h, "u1").await;

    let handle = h.sequencer.launch(&deployment).await.unwrap();
    assert_eq!(handle.await.unwrap(), Outcome::Completed);

    let done = h.service.get(&deployment.id, "u1").await.unwrap();
    assert_eq!(done.status, DeploymentState::Completed);
    assert_eq!(done.progress, 100);
    assert!(done.completed_at.is_some());

    let logs = done.logs.entries();
    assert_eq!(logs.len(), 13);
    assert_eq!(lines(&logs[..12]), expected_stage_lines());
    assert_eq!(logs[12].level, LogSeverity::Success);

    let url = done.url.clone().unwrap();
    assert!(url.starts_with("https://svc-"));
    assert!(url.ends_with("-us-central1.run.app"));
    assert!(logs[12].message.contains(&url));

    let endpoints = done.endpoints.unwrap();
    assert_eq!(endpoints.len(), 3);
    assert!(endpoints.iter().all(|e| e.url.starts_with(&url)));

    assert!(logs.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert!(!h.sequencer.is_running(&deployment.id));
}

#[tokio::test]
async fn test_progress_is_monotonic_per_stage() {
    let (sleep, mut gate) = gated_sleep();
    let h = harness(sleep);
    let deployment = pending(&h, "u1").await;
    let handle = h.sequencer.launch(&deployment).await.unwrap();

    let mut seen = Vec::new();
    for _ in 0..STAGES.len() {
        gate.entered().await;
        let snapshot = h.service.status(&deployment.id, "u1").await.unwrap();
        assert_eq!(snapshot.status, DeploymentState::Deploying);
        seen.push(snapshot.progress);
        gate.release();
    }

    assert_eq!(seen, vec![0, 17, 33, 50, 67, 83]);
    assert_eq!(handle.await.unwrap(), Outcome::Completed);
}

#[tokio::test]
async fn test_cancel_before_first_stage() {
    let h = harness(instant_sleep());
    let started = h
        .service
        .start("u1", request("bundle_1", "gcp", "us-central1"))
        .await
        .unwrap();

    // Current-thread runtime: the sequencer task has not been polled yet
    let cancelled = h.service.cancel(&started.id, "u1").await.unwrap();
    assert_eq!(cancelled.status, DeploymentState::Cancelled);

    h.sequencer_idle(&started.id).await;

    let logs = h.service.logs(&started.id, "u1").await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].message, "Deployment cancelled by user");

    let snapshot = h.service.status(&started.id, "u1").await.unwrap();
    assert_eq!(snapshot.status, DeploymentState::Cancelled);
    assert_eq!(snapshot.progress, 0);
    assert!(snapshot.url.is_none());
}

#[tokio::test]
async fn test_cancel_mid_sequence_stops_at_next_boundary() {
    let (sleep, mut gate) = gated_sleep();
    let h = harness(sleep);
    let started = h
        .service
        .start("u1", request("bundle_1", "aws", "us-east-1"))
        .await
        .unwrap();

    gate.park_at(2).await;
    h.service.cancel(&started.id, "u1").await.unwrap();

    // Let the parked stage wake up; it must not log its completion
    gate.release();
    h.sequencer_idle(&started.id).await;

    let done = h.service.get(&started.id, "u1").await.unwrap();
    let logs = done.logs.entries();
    assert_eq!(done.status, DeploymentState::Cancelled);
    assert_eq!(done.progress, 33);
    assert!(done.url.is_none());

    assert_eq!(logs.len(), 6);
    assert_eq!(lines(&logs[..5]), expected_stage_lines()[..5].to_vec());
    assert_eq!(logs[5].message, "Deployment cancelled by user");
}

#[tokio::test]
async fn test_sequencer_fault_marks_failed() {
    // Updates 1 and 2 cover stage one; the third (stage two start) fails
    let h = harness_with(Arc::new(FlakyStore::failing_update(3)), instant_sleep());
    let deployment = pending(&h, "u1").await;

    let handle = h.sequencer.launch(&deployment).await.unwrap();
    assert_eq!(handle.await.unwrap(), Outcome::Failed);

    let failed = h.service.get(&deployment.id, "u1").await.unwrap();
    assert_eq!(failed.status, DeploymentState::Failed);
    assert!(failed.completed_at.is_some());
    assert!(failed.url.is_none());

    let logs = failed.logs.entries();
    assert_eq!(logs.len(), 3);
    assert_eq!(lines(&logs[..2]), expected_stage_lines()[..2].to_vec());
    assert_eq!(logs[2].level, LogSeverity::Error);
    assert!(logs[2].message.contains("store unavailable"));

    // Failed is terminal for cancellation too
    let err = h.service.cancel(&deployment.id, "u1").await.unwrap_err();
    assert!(matches!(err, DeployError::Conflict(_)));
}

#[tokio::test]
async fn test_single_sequencer_per_deployment() {
    let (sleep, mut gate) = gated_sleep();
    let h = harness(sleep);
    let deployment = pending(&h, "u1").await;

    let handle = h.sequencer.launch(&deployment).await.unwrap();
    gate.entered().await;
    assert!(h.sequencer.is_running(&deployment.id));

    let err = h.sequencer.launch(&deployment).await.unwrap_err();
    assert!(matches!(err, DeployError::Conflict(_)));

    for _ in 0..STAGES.len() {
        gate.release();
    }
    assert_eq!(handle.await.unwrap(), Outcome::Completed);

    // A finished deployment cannot be driven again either
    let err = h.sequencer.launch(&deployment).await.unwrap_err();
    assert!(matches!(err, DeployError::Conflict(_)));

    let logs = h.service.logs(&deployment.id, "u1").await.unwrap();
    assert_eq!(logs.len(), 13);
}

#[tokio::test]
async fn test_reads_between_transitions_are_stable() {
    let (sleep, mut gate) = gated_sleep();
    let h = harness(sleep);
    let started = h
        .service
        .start("u1", request("bundle_1", "gcp", "europe-west1"))
        .await
        .unwrap();

    gate.park_at(1).await;

    let first = h.service.status(&started.id, "u1").await.unwrap();
    let second = h.service.status(&started.id, "u1").await.unwrap();
    assert_eq!(first, second);

    let logs_a = h.service.logs(&started.id, "u1").await.unwrap();
    let logs_b = h.service.logs(&started.id, "u1").await.unwrap();
    assert_eq!(logs_a, logs_b);
    assert_eq!(logs_a.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deployments_are_independent() {
    let h = harness(instant_sleep());

    let mut started = Vec::new();
    for i in 0..8 {
        let owner = format!("owner-{}", i % 3);
        let deployment = h
            .service
            .start(&owner, request(&format!("bundle_{}", i), "gcp", "us-east1"))
            .await
            .unwrap();
        started.push((deployment.id, owner));
    }

    for (id, owner) in &started {
        let done = h.settle(id, owner).await;
        assert_eq!(done.status, DeploymentState::Completed);
        assert_eq!(lines(&done.logs.entries()[..12]), expected_stage_lines());
        assert_eq!(done.logs.len(), 13);
    }
}
