//! Workflow/integration association management.

use std::sync::Arc;

use lattice_core::{AppResult, IntegrationId, WorkflowId};
use lattice_domain::WorkflowIntegrationLink;
use tracing::{debug, info};

use crate::WorkflowIntegrationRepository;

/// Maintains the many-to-many link between workflows and integrations.
///
/// All operations are idempotent. Reads go through
/// [`crate::IntegrationService::list_for_workflow`].
#[derive(Clone)]
pub struct WorkflowIntegrationService {
    repository: Arc<dyn WorkflowIntegrationRepository>,
}

impl WorkflowIntegrationService {
    /// Creates a new association service.
    #[must_use]
    pub fn new(repository: Arc<dyn WorkflowIntegrationRepository>) -> Self {
        Self { repository }
    }

    /// Links an integration to a workflow; an existing link is left as is.
    pub async fn add_to_workflow(
        &self,
        workflow_id: WorkflowId,
        integration_id: IntegrationId,
    ) -> AppResult<()> {
        self.repository
            .add_link(WorkflowIntegrationLink::new(workflow_id, integration_id))
            .await?;
        debug!(workflow_id = %workflow_id, integration_id = %integration_id, "integration linked to workflow");
        Ok(())
    }

    /// Unlinks one integration from a workflow; a missing link is not an error.
    pub async fn remove_from_workflow(
        &self,
        workflow_id: WorkflowId,
        integration_id: IntegrationId,
    ) -> AppResult<()> {
        self.repository
            .remove_link(WorkflowIntegrationLink::new(workflow_id, integration_id))
            .await?;
        debug!(workflow_id = %workflow_id, integration_id = %integration_id, "integration unlinked from workflow");
        Ok(())
    }

    /// Removes every integration link of a workflow, typically when the
    /// workflow itself is deleted.
    pub async fn remove_all_for_workflow(&self, workflow_id: WorkflowId) -> AppResult<u64> {
        let removed = self.repository.remove_links_for_workflow(workflow_id).await?;
        info!(workflow_id = %workflow_id, removed, "workflow integration links removed");
        Ok(removed)
    }
}
