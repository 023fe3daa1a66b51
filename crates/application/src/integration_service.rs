//! Signed integration record store.
//!
//! Every read funnels through one pipeline: verify the stored signature,
//! open sealed fields only when clear-text access is requested, attach the
//! resolved model and redact what the model declares sensitive.

use std::collections::HashMap;
use std::sync::Arc;

use lattice_core::{AppError, AppResult, IntegrationId, IntegrationModelId, ProjectId, WorkflowId};
use lattice_domain::{IntegrationModel, ProjectIntegration, ProjectIntegrationInput};
use tracing::{error, info, warn};

use crate::config_sealing::{open_config, seal_config};
use crate::{
    FetchedIntegration, FieldCipher, IntegrationModelService, IntegrationQuery,
    IntegrationRepository, NewStoredIntegration, RecordSigner, StoredIntegration,
};

mod load;
mod write;

#[cfg(test)]
mod tests;

pub use load::IntegrationBatch;

/// Application service for project integration records.
#[derive(Clone)]
pub struct IntegrationService {
    repository: Arc<dyn IntegrationRepository>,
    model_service: IntegrationModelService,
    signer: Arc<dyn RecordSigner>,
    cipher: Arc<dyn FieldCipher>,
}

impl IntegrationService {
    /// Creates a new integration service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn IntegrationRepository>,
        model_service: IntegrationModelService,
        signer: Arc<dyn RecordSigner>,
        cipher: Arc<dyn FieldCipher>,
    ) -> Self {
        Self {
            repository,
            model_service,
            signer,
            cipher,
        }
    }

    /// Loads one integration by project key and name.
    pub async fn load_by_name(
        &self,
        project_key: &str,
        name: &str,
        clear_password: bool,
    ) -> AppResult<ProjectIntegration> {
        self.load_one(
            IntegrationQuery::ByProjectKeyAndName {
                project_key: project_key.to_owned(),
                name: name.to_owned(),
            },
            clear_password,
        )
        .await
    }

    /// Loads one integration by identifier.
    pub async fn load_by_id(
        &self,
        id: IntegrationId,
        clear_password: bool,
    ) -> AppResult<ProjectIntegration> {
        self.load_one(IntegrationQuery::ById(id), clear_password)
            .await
    }

    /// Lists every valid integration of a project.
    pub async fn list_for_project(
        &self,
        project_id: ProjectId,
        clear_password: bool,
    ) -> AppResult<Vec<ProjectIntegration>> {
        self.load_all(IntegrationQuery::ByProjectId(project_id), clear_password)
            .await
            .map(|batch| batch.integrations)
    }

    /// Lists every valid integration linked to a workflow.
    pub async fn list_for_workflow(
        &self,
        workflow_id: WorkflowId,
        clear_password: bool,
    ) -> AppResult<Vec<ProjectIntegration>> {
        self.load_all(IntegrationQuery::ByWorkflowId(workflow_id), clear_password)
            .await
            .map(|batch| batch.integrations)
    }
}
