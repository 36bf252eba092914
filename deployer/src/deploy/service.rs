//! Deployment service
//!
//! Owner-scoped entry points used by the HTTP layer: start, cancel, list,
//! and the status/log queries.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::cloud::cost::{self, CostEstimate, CostRequest};
use crate::cloud::registry::ProviderRegistry;
use crate::deploy::fsm::DeploymentEvent;
use crate::deploy::projector;
use crate::deploy::sequencer::{self, Sequencer};
use crate::errors::DeployError;
use crate::models::deployment::{DeployRequest, Deployment, LogEntry, StatusSnapshot};
use crate::storage::store::DeploymentStore;

pub struct DeploymentService {
    store: Arc<dyn DeploymentStore>,
    registry: Arc<ProviderRegistry>,
    sequencer: Arc<Sequencer>,
}

impl DeploymentService {
    pub fn new(
        store: Arc<dyn DeploymentStore>,
        registry: Arc<ProviderRegistry>,
        sequencer: Arc<Sequencer>,
    ) -> Self {
        Self {
            store,
            registry,
            sequencer,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Validate the request, record a pending deployment and start its
    /// sequencer in the background. Returns the record as created.
    pub async fn start(
        &self,
        owner_id: &str,
        request: DeployRequest,
    ) -> Result<Deployment, DeployError> {
        let validated = request.validate(&self.registry)?;
        let deployment = self.store.create(Deployment::new(owner_id, validated)).await?;

        info!(
            "Deployment {} created for bundle {} on {}/{}",
            deployment.id, deployment.bundle_id, deployment.cloud_provider, deployment.region
        );

        // The record exists, so a launch failure is reported through the
        // record itself rather than to this caller.
        if let Err(e) = self.sequencer.launch(&deployment).await {
            warn!("Failed to launch sequencer for {}: {}", deployment.id, e);
            sequencer::record_failure(self.store.as_ref(), &deployment.id, &e).await;
        }

        Ok(deployment)
    }

    pub async fn get(&self, id: &str, owner_id: &str) -> Result<Deployment, DeployError> {
        self.store.get(id, owner_id).await
    }

    pub async fn status(&self, id: &str, owner_id: &str) -> Result<StatusSnapshot, DeployError> {
        Ok(self.store.get(id, owner_id).await?.snapshot())
    }

    /// Full log history, oldest first
    pub async fn logs(&self, id: &str, owner_id: &str) -> Result<Vec<LogEntry>, DeployError> {
        Ok(self.store.get(id, owner_id).await?.logs.entries().to_vec())
    }

    pub async fn list(&self, owner_id: &str) -> Result<Vec<Deployment>, DeployError> {
        self.store.list_by_owner(owner_id).await
    }

    /// Cancel a pending or running deployment.
    ///
    /// The sequencer notices at its next stage boundary.
    pub async fn cancel(&self, id: &str, owner_id: &str) -> Result<Deployment, DeployError> {
        let owner = owner_id.to_string();
        let deployment = self
            .store
            .update(
                id,
                Box::new(move |d: &mut Deployment| {
                    if d.owner_id != owner {
                        return Err(DeployError::NotFound);
                    }
                    let next = d.status.next(&DeploymentEvent::Cancel).map_err(|_| {
                        DeployError::Conflict(format!("Cannot cancel {} deployment", d.status))
                    })?;
                    d.status = next;
                    d.completed_at = Some(Utc::now());
                    d.logs.push(projector::deployment_cancelled());
                    Ok(())
                }),
            )
            .await?;

        info!("Deployment {} cancelled by owner", deployment.id);
        Ok(deployment)
    }

    pub fn estimate_cost(&self, request: &CostRequest) -> Result<CostEstimate, DeployError> {
        cost::estimate(&self.registry, request)
    }
}
