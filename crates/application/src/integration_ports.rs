mod crypto;
mod model_repository;
mod query;
mod repository;
mod stored;

pub use crypto::{FieldCipher, RecordSigner};
pub use model_repository::IntegrationModelRepository;
pub use query::IntegrationQuery;
pub use repository::{IntegrationRepository, WorkflowIntegrationRepository};
pub use stored::{
    FetchedIntegration, NewStoredIntegration, NewStoredIntegrationModel, StoredConfigValue,
    StoredIntegration, StoredIntegrationConfig, StoredIntegrationModel,
};
