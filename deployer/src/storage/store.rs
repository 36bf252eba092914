//! Deployment record store interface

use async_trait::async_trait;

use crate::errors::DeployError;
use crate::models::deployment::Deployment;

/// Mutation applied to a stored record by [`DeploymentStore::update`].
///
/// Returning an error discards the mutation and leaves the record as it was.
pub type Mutator = Box<dyn FnOnce(&mut Deployment) -> Result<(), DeployError> + Send>;

/// Keyed, owner-scoped storage of deployment records
#[async_trait]
pub trait DeploymentStore: Send + Sync {
    /// Insert a new record. Fails with `Conflict` if the id is taken.
    async fn create(&self, deployment: Deployment) -> Result<Deployment, DeployError>;

    /// Fetch a record owned by `owner_id`.
    ///
    /// A record owned by someone else is reported as `NotFound`, exactly
    /// like a missing one.
    async fn get(&self, id: &str, owner_id: &str) -> Result<Deployment, DeployError>;

    /// All records owned by `owner_id`, in creation order
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Deployment>, DeployError>;

    /// Atomically apply `mutator` to the record and return the result
    async fn update(&self, id: &str, mutator: Mutator) -> Result<Deployment, DeployError>;
}
