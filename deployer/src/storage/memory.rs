//! In-memory deployment store

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::errors::DeployError;
use crate::models::deployment::Deployment;
use crate::storage::store::{DeploymentStore, Mutator};

#[derive(Default)]
struct Tables {
    records: HashMap<String, Deployment>,
    by_owner: HashMap<String, Vec<String>>,
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DeploymentStore for MemoryStore {
    async fn create(&self, deployment: Deployment) -> Result<Deployment, DeployError> {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());

        if tables.records.contains_key(&deployment.id) {
            return Err(DeployError::Conflict(format!(
                "Deployment {} already exists",
                deployment.id
            )));
        }

        tables
            .by_owner
            .entry(deployment.owner_id.clone())
            .or_default()
            .push(deployment.id.clone());
        tables
            .records
            .insert(deployment.id.clone(), deployment.clone());

        Ok(deployment)
    }

    async fn get(&self, id: &str, owner_id: &str) -> Result<Deployment, DeployError> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables
            .records
            .get(id)
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .ok_or(DeployError::NotFound)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Deployment>, DeployError> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        let ids = match tables.by_owner.get(owner_id) {
            Some(ids) => ids,
            None => return Ok(Vec::new()),
        };
        Ok(ids
            .iter()
            .filter_map(|id| tables.records.get(id))
            .cloned()
            .collect())
    }

    async fn update(&self, id: &str, mutator: Mutator) -> Result<Deployment, DeployError> {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let record = tables.records.get_mut(id).ok_or(DeployError::NotFound)?;

        // Mutate a copy so a rejected mutation never leaks a partial record
        let mut updated = record.clone();
        mutator(&mut updated)?;
        *record = updated.clone();

        Ok(updated)
    }
}
