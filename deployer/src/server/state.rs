//! Server state

use std::sync::Arc;

use crate::authn::token::TokenIssuer;
use crate::deploy::service::DeploymentService;

/// Server state shared across handlers
pub struct ServerState {
    pub deployments: Arc<DeploymentService>,
    pub tokens: Arc<TokenIssuer>,
}

impl ServerState {
    pub fn new(deployments: Arc<DeploymentService>, tokens: Arc<TokenIssuer>) -> Self {
        Self {
            deployments,
            tokens,
        }
    }
}
