//! Finite State Machine for deployment status

use std::fmt;

use serde::{Deserialize, Serialize};

/// Deployment state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentState {
    /// Accepted, sequencer not yet started
    Pending,

    /// Stages in progress
    Deploying,

    /// All stages finished
    Completed,

    /// Sequencer faulted
    Failed,

    /// Cancelled by the owner
    Cancelled,
}

impl DeploymentState {
    /// Terminal states never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeploymentState::Completed | DeploymentState::Failed | DeploymentState::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentState::Pending => "pending",
            DeploymentState::Deploying => "deploying",
            DeploymentState::Completed => "completed",
            DeploymentState::Failed => "failed",
            DeploymentState::Cancelled => "cancelled",
        }
    }

    /// Compute the state reached by applying `event`
    pub fn next(&self, event: &DeploymentEvent) -> Result<DeploymentState, String> {
        let next = match (self, event) {
            // Entering a stage. Repeated for every stage, so it is idempotent
            // once deploying.
            (DeploymentState::Pending, DeploymentEvent::Advance)
            | (DeploymentState::Deploying, DeploymentEvent::Advance) => DeploymentState::Deploying,

            (DeploymentState::Deploying, DeploymentEvent::Complete) => DeploymentState::Completed,

            (DeploymentState::Pending, DeploymentEvent::Fail(_))
            | (DeploymentState::Deploying, DeploymentEvent::Fail(_)) => DeploymentState::Failed,

            (DeploymentState::Pending, DeploymentEvent::Cancel)
            | (DeploymentState::Deploying, DeploymentEvent::Cancel) => DeploymentState::Cancelled,

            (state, event) => {
                return Err(format!("Invalid transition: {} -> {}", state, event));
            }
        };
        Ok(next)
    }
}

impl fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentEvent {
    /// Sequencer entered the next stage
    Advance,

    /// Every stage finished
    Complete,

    /// Sequencer fault
    Fail(String),

    /// Explicit cancel request
    Cancel,
}

impl fmt::Display for DeploymentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentEvent::Advance => f.write_str("advance"),
            DeploymentEvent::Complete => f.write_str("complete"),
            DeploymentEvent::Fail(reason) => write!(f, "fail({})", reason),
            DeploymentEvent::Cancel => f.write_str("cancel"),
        }
    }
}
