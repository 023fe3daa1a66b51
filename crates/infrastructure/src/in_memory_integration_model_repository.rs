use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use lattice_application::{
    IntegrationModelRepository, NewStoredIntegrationModel, StoredIntegrationModel,
};
use lattice_core::{AppError, AppResult, IntegrationModelId};
use tokio::sync::RwLock;

/// In-memory integration model repository.
#[derive(Debug, Default)]
pub struct InMemoryIntegrationModelRepository {
    next_id: AtomicI64,
    models: RwLock<HashMap<IntegrationModelId, StoredIntegrationModel>>,
}

impl InMemoryIntegrationModelRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IntegrationModelRepository for InMemoryIntegrationModelRepository {
    async fn find_model(
        &self,
        model_id: IntegrationModelId,
    ) -> AppResult<Option<StoredIntegrationModel>> {
        Ok(self.models.read().await.get(&model_id).cloned())
    }

    async fn insert_model(
        &self,
        model: NewStoredIntegrationModel,
    ) -> AppResult<StoredIntegrationModel> {
        let mut models = self.models.write().await;
        if models.values().any(|stored| stored.name == model.name) {
            return Err(AppError::Conflict(format!(
                "integration model '{}' already exists",
                model.name
            )));
        }

        let id = IntegrationModelId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)?;
        let stored = model.into_stored(id);
        models.insert(id, stored.clone());
        Ok(stored)
    }
}
