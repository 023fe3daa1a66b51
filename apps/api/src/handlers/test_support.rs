use std::collections::BTreeMap;
use std::sync::Arc;

use lattice_application::{
    IntegrationModelService, IntegrationService, WorkflowIntegrationService,
};
use lattice_core::{AppResult, IntegrationModelId, ProjectId};
use lattice_domain::{
    IntegrationCapabilities, IntegrationConfig, IntegrationConfigType, IntegrationConfigValue,
    IntegrationModelInput,
};
use lattice_infrastructure::{
    AesHmacIntegrationCrypto, InMemoryIntegrationModelRepository, InMemoryIntegrationRepository,
};

use crate::dto::{CreateIntegrationRequest, IntegrationConfigValueDto};
use crate::state::AppState;

pub const PROJECT_KEY: &str = "WEB";
pub const ADMIN_TOKEN: &str = "test-admin-token-with-32-characters!";

pub struct TestApp {
    pub state: AppState,
    pub repository: Arc<InMemoryIntegrationRepository>,
    pub project_id: ProjectId,
    pub model_id: IntegrationModelId,
}

pub async fn test_app() -> AppResult<TestApp> {
    let crypto = Arc::new(AesHmacIntegrationCrypto::new(&[3u8; 32], &[4u8; 32]));
    let repository = Arc::new(InMemoryIntegrationRepository::new());
    let project_id = ProjectId::new(1)?;
    repository.register_project(PROJECT_KEY, project_id).await;

    let models = IntegrationModelService::new(
        Arc::new(InMemoryIntegrationModelRepository::new()),
        crypto.clone(),
    );
    let model = models
        .register_model(IntegrationModelInput {
            name: "artifactory".to_owned(),
            author: "platform".to_owned(),
            description: Some("artifact storage".to_owned()),
            default_config: IntegrationConfig::from_iter([
                (
                    "url".to_owned(),
                    IntegrationConfigValue::new(IntegrationConfigType::String, ""),
                ),
                (
                    "token".to_owned(),
                    IntegrationConfigValue::new(IntegrationConfigType::Password, ""),
                ),
            ]),
            public_configurations: BTreeMap::new(),
            public: true,
            capabilities: IntegrationCapabilities {
                storage: true,
                ..IntegrationCapabilities::default()
            },
        })
        .await?;

    let state = AppState {
        integration_service: IntegrationService::new(
            repository.clone(),
            models,
            crypto.clone(),
            crypto,
        ),
        workflow_integration_service: WorkflowIntegrationService::new(repository.clone()),
        admin_token: Arc::from(ADMIN_TOKEN),
    };

    Ok(TestApp {
        state,
        repository,
        project_id,
        model_id: model.id(),
    })
}

pub fn field(kind: &str, value: &str) -> IntegrationConfigValueDto {
    IntegrationConfigValueDto {
        value: value.to_owned(),
        kind: kind.to_owned(),
        description: None,
    }
}

pub fn create_request(app: &TestApp, name: &str, token: &str) -> CreateIntegrationRequest {
    CreateIntegrationRequest {
        project_id: app.project_id.as_i64(),
        name: name.to_owned(),
        integration_model_id: app.model_id.as_i64(),
        config: BTreeMap::from([
            ("url".to_owned(), field("string", "https://artifacts")),
            ("token".to_owned(), field("password", token)),
        ]),
    }
}
