use lattice_core::{IntegrationId, WorkflowId};
use serde::{Deserialize, Serialize};

/// Association between a workflow and a project integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowIntegrationLink {
    /// Linked workflow.
    pub workflow_id: WorkflowId,
    /// Linked integration record.
    pub integration_id: IntegrationId,
}

impl WorkflowIntegrationLink {
    /// Creates an association pair.
    #[must_use]
    pub fn new(workflow_id: WorkflowId, integration_id: IntegrationId) -> Self {
        Self {
            workflow_id,
            integration_id,
        }
    }
}
