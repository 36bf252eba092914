//! Shared test helpers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Semaphore};

use aluminum_deployer::cloud::registry::ProviderRegistry;
use aluminum_deployer::deploy::sequencer::{sleep_fn, Sequencer, SequencerOptions, SleepFn};
use aluminum_deployer::deploy::service::DeploymentService;
use aluminum_deployer::errors::DeployError;
use aluminum_deployer::models::deployment::{DeployRequest, Deployment};
use aluminum_deployer::storage::memory::MemoryStore;
use aluminum_deployer::storage::store::{DeploymentStore, Mutator};

/// Sleep that only yields to the scheduler
pub fn instant_sleep() -> SleepFn {
    sleep_fn(|_| tokio::task::yield_now())
}

/// Lets a test hold the sequencer inside a stage delay
pub struct StageGate {
    entered: mpsc::UnboundedReceiver<()>,
    release: Arc<Semaphore>,
}

impl StageGate {
    /// Wait until the sequencer is parked in the next stage delay
    pub async fn entered(&mut self) {
        tokio::time::timeout(Duration::from_secs(5), self.entered.recv())
            .await
            .expect("sequencer never reached a stage delay")
            .expect("sequencer dropped");
    }

    /// Let one parked stage finish
    pub fn release(&self) {
        self.release.add_permits(1);
    }

    /// Advance until the sequencer is parked inside stage `index`
    pub async fn park_at(&mut self, index: usize) {
        self.entered().await;
        for _ in 0..index {
            self.release();
            self.entered().await;
        }
    }
}

pub fn gated_sleep() -> (SleepFn, StageGate) {
    let (tx, rx) = mpsc::unbounded_channel();
    let release = Arc::new(Semaphore::new(0));
    let permits = release.clone();

    let sleep = sleep_fn(move |_| {
        let tx = tx.clone();
        let permits = permits.clone();
        async move {
            let _ = tx.send(());
            if let Ok(permit) = permits.acquire().await {
                permit.forget();
            }
        }
    });

    (
        sleep,
        StageGate {
            entered: rx,
            release,
        },
    )
}

/// Memory store whose `nth` read or update (1-based) fails as if the
/// backend were down
pub struct FlakyStore {
    inner: MemoryStore,
    gets: AtomicUsize,
    updates: AtomicUsize,
    fail_get_on: Option<usize>,
    fail_update_on: Option<usize>,
}

impl FlakyStore {
    fn new(fail_get_on: Option<usize>, fail_update_on: Option<usize>) -> Self {
        Self {
            inner: MemoryStore::new(),
            gets: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            fail_get_on,
            fail_update_on,
        }
    }

    pub fn failing_get(nth: usize) -> Self {
        Self::new(Some(nth), None)
    }

    pub fn failing_update(nth: usize) -> Self {
        Self::new(None, Some(nth))
    }
}

fn unavailable(counter: &AtomicUsize, fail_on: Option<usize>) -> Result<(), DeployError> {
    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
    if fail_on == Some(n) {
        return Err(DeployError::StorageError("store unavailable".to_string()));
    }
    Ok(())
}

#[async_trait]
impl DeploymentStore for FlakyStore {
    async fn create(&self, deployment: Deployment) -> Result<Deployment, DeployError> {
        self.inner.create(deployment).await
    }

    async fn get(&self, id: &str, owner_id: &str) -> Result<Deployment, DeployError> {
        unavailable(&self.gets, self.fail_get_on)?;
        self.inner.get(id, owner_id).await
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Deployment>, DeployError> {
        self.inner.list_by_owner(owner_id).await
    }

    async fn update(&self, id: &str, mutator: Mutator) -> Result<Deployment, DeployError> {
        unavailable(&self.updates, self.fail_update_on)?;
        self.inner.update(id, mutator).await
    }
}

pub struct Harness {
    pub store: Arc<dyn DeploymentStore>,
    pub sequencer: Arc<Sequencer>,
    pub service: DeploymentService,
}

pub fn harness_with(store: Arc<dyn DeploymentStore>, sleep: SleepFn) -> Harness {
    let sequencer = Arc::new(Sequencer::with_sleep_fn(
        store.clone(),
        SequencerOptions {
            stage_delay: Duration::from_millis(1),
        },
        sleep,
    ));
    let service = DeploymentService::new(
        store.clone(),
        Arc::new(ProviderRegistry::builtin()),
        sequencer.clone(),
    );
    Harness {
        store,
        sequencer,
        service,
    }
}

pub fn harness(sleep: SleepFn) -> Harness {
    harness_with(Arc::new(MemoryStore::new()), sleep)
}

pub fn request(bundle_id: &str, provider: &str, region: &str) -> DeployRequest {
    DeployRequest {
        bundle_id: Some(bundle_id.to_string()),
        cloud_provider: Some(provider.to_string()),
        region: Some(region.to_string()),
        environment: Some("production".to_string()),
    }
}

impl Harness {
    /// Poll until the deployment is terminal and no sequencer drives it
    pub async fn settle(&self, id: &str, owner_id: &str) -> Deployment {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let deployment = self.service.get(id, owner_id).await.unwrap();
                if deployment.status.is_terminal() && !self.sequencer.is_running(id) {
                    return deployment;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("deployment never settled")
    }

    /// Wait for the sequencer task to exit, whatever the record says
    pub async fn sequencer_idle(&self, id: &str) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.sequencer.is_running(id) {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("sequencer never stopped");
    }
}
