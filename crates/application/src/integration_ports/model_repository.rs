use async_trait::async_trait;
use lattice_core::{AppResult, IntegrationModelId};

use super::stored::{NewStoredIntegrationModel, StoredIntegrationModel};

/// Repository port for integration models.
#[async_trait]
pub trait IntegrationModelRepository: Send + Sync {
    /// Returns one model by identifier.
    async fn find_model(
        &self,
        model_id: IntegrationModelId,
    ) -> AppResult<Option<StoredIntegrationModel>>;

    /// Persists a new model and returns it with its assigned identity.
    async fn insert_model(
        &self,
        model: NewStoredIntegrationModel,
    ) -> AppResult<StoredIntegrationModel>;
}
