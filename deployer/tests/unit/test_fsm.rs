//! FSM unit tests

use aluminum_deployer::deploy::fsm::{DeploymentEvent, DeploymentState};

#[test]
fn test_fsm_initial_state() {
    let state = DeploymentState::Pending;
    assert!(!state.is_terminal());
    assert_eq!(state.to_string(), "pending");
}

#[test]
fn test_fsm_deploy_success_flow() {
    let mut state = DeploymentState::Pending;

    // One advance per stage
    for _ in 0..6 {
        state = state.next(&DeploymentEvent::Advance).unwrap();
        assert_eq!(state, DeploymentState::Deploying);
    }

    state = state.next(&DeploymentEvent::Complete).unwrap();
    assert_eq!(state, DeploymentState::Completed);
}

#[test]
fn test_fsm_deploy_failure_flow() {
    let state = DeploymentState::Pending
        .next(&DeploymentEvent::Advance)
        .unwrap()
        .next(&DeploymentEvent::Fail("test error".to_string()))
        .unwrap();

    assert_eq!(state, DeploymentState::Failed);
    assert!(state.is_terminal());
}

#[test]
fn test_fsm_cancel_from_pending_and_deploying() {
    let cancelled = DeploymentState::Pending
        .next(&DeploymentEvent::Cancel)
        .unwrap();
    assert_eq!(cancelled, DeploymentState::Cancelled);

    let cancelled = DeploymentState::Deploying
        .next(&DeploymentEvent::Cancel)
        .unwrap();
    assert_eq!(cancelled, DeploymentState::Cancelled);
}

#[test]
fn test_fsm_invalid_transition() {
    // Cannot cancel twice
    let result = DeploymentState::Cancelled.next(&DeploymentEvent::Cancel);
    assert!(result.is_err());

    // Cannot resume a finished deployment
    let result = DeploymentState::Completed.next(&DeploymentEvent::Advance);
    assert_eq!(
        result.unwrap_err(),
        "Invalid transition: completed -> advance"
    );
}

#[test]
fn test_fsm_state_serialization() {
    let json = serde_json::to_string(&DeploymentState::Deploying).unwrap();
    assert_eq!(json, "\"deploying\"");

    let state: DeploymentState = serde_json::from_str("\"cancelled\"").unwrap();
    assert_eq!(state, DeploymentState::Cancelled);
}
