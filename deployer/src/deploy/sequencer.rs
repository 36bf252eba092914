//! Stage sequencer
//!
//! Drives one deployment through [`STAGES`] on its own tokio task. Every
//! write goes through [`DeploymentStore::update`] and re-checks for
//! cancellation inside the mutation, so a cancel takes effect at the next
//! stage boundary and nothing is appended after the cancellation log.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::deploy::fsm::{DeploymentEvent, DeploymentState};
use crate::deploy::projector::{self, STAGES};
use crate::errors::DeployError;
use crate::models::deployment::Deployment;
use crate::storage::store::DeploymentStore;

/// Suspension used between a stage's start and completion logs
pub type SleepFn = Arc<dyn Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap a sleep function such as `tokio::time::sleep`
pub fn sleep_fn<S, F>(sleep: S) -> SleepFn
where
    S: Fn(Duration) -> F + Send + Sync + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |wait| sleep(wait).boxed())
}

/// Sequencer settings
#[derive(Debug, Clone)]
pub struct SequencerOptions {
    /// Time spent in each stage
    pub stage_delay: Duration,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            stage_delay: Duration::from_secs(2),
        }
    }
}

/// How a sequencer run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
    Failed,
}

type RunningSet = Arc<Mutex<HashSet<String>>>;

/// Marks a deployment id as driven by a live task until dropped
struct RunClaim {
    running: RunningSet,
    id: String,
}

impl RunClaim {
    fn acquire(running: &RunningSet, id: &str) -> Result<Self, DeployError> {
        let mut ids = running.lock().unwrap_or_else(|e| e.into_inner());
        if !ids.insert(id.to_string()) {
            return Err(DeployError::Conflict(format!(
                "Deployment {} is already being sequenced",
                id
            )));
        }
        Ok(Self {
            running: running.clone(),
            id: id.to_string(),
        })
    }
}

impl Drop for RunClaim {
    fn drop(&mut self) {
        let mut ids = self.running.lock().unwrap_or_else(|e| e.into_inner());
        ids.remove(&self.id);
    }
}

/// Stage sequencer
pub struct Sequencer {
    store: Arc<dyn DeploymentStore>,
    options: SequencerOptions,
    sleep_fn: SleepFn,
    running: RunningSet,
}

impl Sequencer {
    /// Create a sequencer that waits on the tokio timer
    pub fn new(store: Arc<dyn DeploymentStore>, options: SequencerOptions) -> Self {
        Self::with_sleep_fn(store, options, sleep_fn(tokio::time::sleep))
    }

    pub fn with_sleep_fn(
        store: Arc<dyn DeploymentStore>,
        options: SequencerOptions,
        sleep_fn: SleepFn,
    ) -> Self {
        Self {
            store,
            options,
            sleep_fn,
            running: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Whether a task is currently driving `id`
    pub fn is_running(&self, id: &str) -> bool {
        let ids = self.running.lock().unwrap_or_else(|e| e.into_inner());
        ids.contains(id)
    }

    /// Spawn the task that drives `deployment` through every stage.
    ///
    /// Only a pending record that no other task is driving can be launched.
    pub async fn launch(
        &self,
        deployment: &Deployment,
    ) -> Result<JoinHandle<Outcome>, DeployError> {
        let claim = RunClaim::acquire(&self.running, &deployment.id)?;

        let current = self.store.get(&deployment.id, &deployment.owner_id).await?;
        if current.status != DeploymentState::Pending {
            return Err(DeployError::Conflict(format!(
                "Deployment {} is {} and cannot be started",
                current.id, current.status
            )));
        }

        let store = self.store.clone();
        let sleep_fn = self.sleep_fn.clone();
        let delay = self.options.stage_delay;
        let id = current.id;

        info!("Launching sequencer for deployment {}", id);
        let handle = tokio::spawn(async move {
            let _claim = claim;
            drive(store.as_ref(), &id, delay, &sleep_fn).await
        });

        Ok(handle)
    }
}

async fn drive(
    store: &dyn DeploymentStore,
    id: &str,
    delay: Duration,
    sleep_fn: &SleepFn,
) -> Outcome {
    match run_stages(store, id, delay, sleep_fn).await {
        Ok(()) => {
            info!("Deployment {} completed", id);
            Outcome::Completed
        }
        Err(DeployError::Cancelled(_)) => {
            info!("Deployment {} cancelled, sequencer stopped", id);
            Outcome::Cancelled
        }
        Err(fault) => {
            error!("Deployment {} failed: {}", id, fault);
            record_failure(store, id, &fault).await;
            Outcome::Failed
        }
    }
}

async fn run_stages(
    store: &dyn DeploymentStore,
    id: &str,
    delay: Duration,
    sleep_fn: &SleepFn,
) -> Result<(), DeployError> {
    let total = STAGES.len();

    for (index, stage) in STAGES.into_iter().enumerate() {
        store
            .update(
                id,
                Box::new(move |d: &mut Deployment| {
                    halt_if_cancelled(d)?;
                    d.status = d
                        .status
                        .next(&DeploymentEvent::Advance)
                        .map_err(DeployError::SequencerFault)?;
                    d.progress = d.progress.max(projector::progress_at(index, total));
                    d.logs.push(projector::stage_started(stage));
                    Ok(())
                }),
            )
            .await?;
        debug!("Deployment {}: {} ({}/{})", id, stage, index + 1, total);

        sleep_fn(delay).await;

        store
            .update(
                id,
                Box::new(move |d: &mut Deployment| {
                    halt_if_cancelled(d)?;
                    d.logs.push(projector::stage_completed(stage));
                    Ok(())
                }),
            )
            .await?;
    }

    store
        .update(
            id,
            Box::new(|d: &mut Deployment| {
                halt_if_cancelled(d)?;
                d.status = d
                    .status
                    .next(&DeploymentEvent::Complete)
                    .map_err(DeployError::SequencerFault)?;
                let url = projector::service_url(&d.cloud_provider, &d.region, &d.id);
                d.progress = 100;
                d.completed_at = Some(Utc::now());
                d.endpoints = Some(projector::endpoints(&url));
                d.logs.push(projector::deployment_succeeded(&url));
                d.url = Some(url);
                Ok(())
            }),
        )
        .await?;

    Ok(())
}

fn halt_if_cancelled(deployment: &Deployment) -> Result<(), DeployError> {
    if deployment.status == DeploymentState::Cancelled {
        return Err(DeployError::Cancelled(deployment.id.clone()));
    }
    Ok(())
}

/// Faults are terminal: mark the record failed instead of retrying
pub(crate) async fn record_failure(store: &dyn DeploymentStore, id: &str, fault: &DeployError) {
    let reason = fault.to_string();
    let result = store
        .update(
            id,
            Box::new(move |d: &mut Deployment| {
                d.status = d
                    .status
                    .next(&DeploymentEvent::Fail(reason.clone()))
                    .map_err(DeployError::Conflict)?;
                d.completed_at = Some(Utc::now());
                d.logs.push(projector::deployment_failed(&reason));
                Ok(())
            }),
        )
        .await;

    if let Err(e) = result {
        error!("Unable to record failure of deployment {}: {}", id, e);
    }
}
