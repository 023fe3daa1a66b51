//! Application services and ports.

#![forbid(unsafe_code)]

mod config_sealing;
mod integration_model_service;
mod integration_ports;
mod integration_service;
mod key_install_service;
mod workflow_integration_service;

pub use integration_model_service::IntegrationModelService;
pub use integration_ports::{
    FetchedIntegration, FieldCipher, IntegrationModelRepository, IntegrationQuery,
    IntegrationRepository, NewStoredIntegration, NewStoredIntegrationModel, RecordSigner,
    StoredConfigValue, StoredIntegration, StoredIntegrationConfig, StoredIntegrationModel,
    WorkflowIntegrationRepository,
};
pub use integration_service::{IntegrationBatch, IntegrationService};
pub use key_install_service::{InstalledKey, KeyInstallRequest, KeyInstallService, KeyInstaller};
pub use workflow_integration_service::WorkflowIntegrationService;
