mod common;
mod integrations;
mod workflows;

pub use common::HealthResponse;
pub use integrations::{
    CreateIntegrationRequest, IntegrationCapabilitiesResponse, IntegrationConfigValueDto,
    IntegrationModelResponse, IntegrationResponse, IntegrationScope, ListIntegrationsQuery,
    UpdateIntegrationRequest,
};
pub use workflows::RemovedLinksResponse;
