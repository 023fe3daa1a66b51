use std::collections::BTreeMap;

use lattice_core::{AppError, AppResult, IntegrationModelId, ProjectId, WorkflowId};
use lattice_domain::{
    IntegrationCapabilities, IntegrationConfig, IntegrationConfigType, IntegrationConfigValue,
    IntegrationModel, ProjectIntegration, ProjectIntegrationInput,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One configuration field as exchanged over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/integration-config-value-dto.ts"
)]
pub struct IntegrationConfigValueDto {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Incoming payload for integration creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-integration-request.ts"
)]
pub struct CreateIntegrationRequest {
    #[ts(type = "number")]
    pub project_id: i64,
    pub name: String,
    #[ts(type = "number")]
    pub integration_model_id: i64,
    #[serde(default)]
    pub config: BTreeMap<String, IntegrationConfigValueDto>,
}

/// Incoming payload replacing an integration's name and configuration.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-integration-request.ts"
)]
pub struct UpdateIntegrationRequest {
    pub name: String,
    #[serde(default)]
    pub config: BTreeMap<String, IntegrationConfigValueDto>,
}

/// Listing filter; exactly one of the two scopes must be given.
#[derive(Debug, Default, Deserialize)]
pub struct ListIntegrationsQuery {
    pub project_id: Option<i64>,
    pub workflow_id: Option<i64>,
}

/// Scope resolved from a listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationScope {
    Project(ProjectId),
    Workflow(WorkflowId),
}

/// Capability flags of an integration model.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/integration-capabilities-response.ts"
)]
pub struct IntegrationCapabilitiesResponse {
    pub storage: bool,
    pub deployment: bool,
    pub hook: bool,
    pub compute: bool,
    pub event: bool,
}

/// API representation of an integration model.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/integration-model-response.ts"
)]
pub struct IntegrationModelResponse {
    #[ts(type = "number")]
    pub id: i64,
    pub name: String,
    pub author: String,
    pub description: Option<String>,
    pub public: bool,
    pub capabilities: IntegrationCapabilitiesResponse,
    pub default_config: BTreeMap<String, IntegrationConfigValueDto>,
    pub public_configurations: BTreeMap<String, BTreeMap<String, IntegrationConfigValueDto>>,
}

/// API representation of an integration record.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/integration-response.ts"
)]
pub struct IntegrationResponse {
    #[ts(type = "number")]
    pub id: i64,
    #[ts(type = "number")]
    pub project_id: i64,
    pub name: String,
    #[ts(type = "number")]
    pub integration_model_id: i64,
    pub config: BTreeMap<String, IntegrationConfigValueDto>,
    pub model: Option<IntegrationModelResponse>,
}

impl ListIntegrationsQuery {
    /// Resolves the single listing scope.
    pub fn scope(&self) -> AppResult<IntegrationScope> {
        match (self.project_id, self.workflow_id) {
            (Some(project_id), None) => Ok(IntegrationScope::Project(ProjectId::new(project_id)?)),
            (None, Some(workflow_id)) => {
                Ok(IntegrationScope::Workflow(WorkflowId::new(workflow_id)?))
            }
            _ => Err(AppError::Validation(
                "exactly one of project_id or workflow_id is required".to_owned(),
            )),
        }
    }
}

impl CreateIntegrationRequest {
    /// Converts the payload into a domain input.
    pub fn into_input(self) -> AppResult<ProjectIntegrationInput> {
        Ok(ProjectIntegrationInput {
            project_id: ProjectId::new(self.project_id)?,
            name: self.name,
            integration_model_id: IntegrationModelId::new(self.integration_model_id)?,
            config: config_from_dto(self.config)?,
        })
    }
}

impl UpdateIntegrationRequest {
    /// Applies the payload to a loaded record.
    pub fn apply_to(self, integration: &mut ProjectIntegration) -> AppResult<()> {
        integration.rename(self.name)?;
        integration.replace_config(config_from_dto(self.config)?);
        Ok(())
    }
}

/// Parses API configuration fields into a domain configuration.
pub fn config_from_dto(
    fields: BTreeMap<String, IntegrationConfigValueDto>,
) -> AppResult<IntegrationConfig> {
    fields
        .into_iter()
        .map(|(name, field)| {
            let kind = IntegrationConfigType::parse(field.kind.as_str())?;
            Ok((
                name,
                IntegrationConfigValue {
                    value: field.value,
                    kind,
                    description: field.description,
                },
            ))
        })
        .collect()
}

fn config_to_dto(config: &IntegrationConfig) -> BTreeMap<String, IntegrationConfigValueDto> {
    config
        .iter()
        .map(|(name, field)| {
            (
                name.clone(),
                IntegrationConfigValueDto {
                    value: field.value.clone(),
                    kind: field.kind.as_str().to_owned(),
                    description: field.description.clone(),
                },
            )
        })
        .collect()
}

impl From<IntegrationCapabilities> for IntegrationCapabilitiesResponse {
    fn from(value: IntegrationCapabilities) -> Self {
        Self {
            storage: value.storage,
            deployment: value.deployment,
            hook: value.hook,
            compute: value.compute,
            event: value.event,
        }
    }
}

impl From<&IntegrationModel> for IntegrationModelResponse {
    fn from(value: &IntegrationModel) -> Self {
        Self {
            id: value.id().as_i64(),
            name: value.name().as_str().to_owned(),
            author: value.author().to_owned(),
            description: value.description().map(str::to_owned),
            public: value.is_public(),
            capabilities: value.capabilities().into(),
            default_config: config_to_dto(value.default_config()),
            public_configurations: value
                .public_configurations()
                .iter()
                .map(|(name, config)| (name.clone(), config_to_dto(config)))
                .collect(),
        }
    }
}

impl From<ProjectIntegration> for IntegrationResponse {
    fn from(value: ProjectIntegration) -> Self {
        Self {
            id: value.id().as_i64(),
            project_id: value.project_id().as_i64(),
            name: value.name().as_str().to_owned(),
            integration_model_id: value.integration_model_id().as_i64(),
            config: config_to_dto(value.config()),
            model: value.model().map(IntegrationModelResponse::from),
        }
    }
}
