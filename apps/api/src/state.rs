use std::sync::Arc;

use lattice_application::{IntegrationService, WorkflowIntegrationService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub integration_service: IntegrationService,
    pub workflow_integration_service: WorkflowIntegrationService,
    pub admin_token: Arc<str>,
}
