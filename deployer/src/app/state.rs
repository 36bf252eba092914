//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::app::options::AuthOptions;
use crate::authn::token::TokenIssuer;
use crate::cloud::registry::ProviderRegistry;
use crate::deploy::sequencer::{Sequencer, SequencerOptions};
use crate::deploy::service::DeploymentService;
use crate::storage::memory::MemoryStore;
use crate::storage::store::DeploymentStore;

/// Main application state
pub struct AppState {
    /// Owner-scoped deployment operations
    pub deployments: Arc<DeploymentService>,

    /// Bearer token issuer
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    /// Initialize application state
    pub fn init(sequencer_options: SequencerOptions, auth: AuthOptions) -> Self {
        info!("Initializing application state...");

        let store: Arc<dyn DeploymentStore> = Arc::new(MemoryStore::new());
        let registry = Arc::new(ProviderRegistry::builtin());
        let sequencer = Arc::new(Sequencer::new(store.clone(), sequencer_options));
        let deployments = Arc::new(DeploymentService::new(store, registry, sequencer));
        let tokens = Arc::new(TokenIssuer::new(auth.jwt_secret, auth.token_ttl_secs));

        Self {
            deployments,
            tokens,
        }
    }
}
