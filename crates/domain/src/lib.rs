//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod integration;
mod job_secret;
mod workflow_link;

pub use integration::{
    IntegrationCapabilities, IntegrationConfig, IntegrationConfigType, IntegrationConfigValue,
    IntegrationModel, IntegrationModelInput, ProjectIntegration, ProjectIntegrationInput,
};
pub use job_secret::{
    JobSecret, JobSecretKind, JobSecretSet, KEY_SECRET_PREFIX, PRIVATE_KEY_SECRET_SUFFIX,
    private_key_secret_name,
};
pub use workflow_link::WorkflowIntegrationLink;
