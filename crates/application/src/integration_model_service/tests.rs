use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use lattice_core::{AppError, AppResult, IntegrationModelId};
use lattice_domain::{
    IntegrationCapabilities, IntegrationConfig, IntegrationConfigType, IntegrationConfigValue,
    IntegrationModelInput,
};
use tokio::sync::Mutex;

use crate::{FieldCipher, IntegrationModelRepository, NewStoredIntegrationModel, StoredIntegrationModel};

use super::IntegrationModelService;

struct PrefixCipher;

impl FieldCipher for PrefixCipher {
    fn seal(&self, plaintext: &str) -> AppResult<String> {
        Ok(format!("sealed:{plaintext}"))
    }

    fn open(&self, sealed: &str) -> AppResult<String> {
        sealed
            .strip_prefix("sealed:")
            .map(str::to_owned)
            .ok_or_else(|| AppError::Internal("value is not sealed".to_owned()))
    }
}

#[derive(Default)]
struct InMemoryModels {
    next_id: AtomicI64,
    models: Mutex<HashMap<IntegrationModelId, StoredIntegrationModel>>,
}

#[async_trait]
impl IntegrationModelRepository for InMemoryModels {
    async fn find_model(
        &self,
        model_id: IntegrationModelId,
    ) -> AppResult<Option<StoredIntegrationModel>> {
        Ok(self.models.lock().await.get(&model_id).cloned())
    }

    async fn insert_model(
        &self,
        model: NewStoredIntegrationModel,
    ) -> AppResult<StoredIntegrationModel> {
        let id = IntegrationModelId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)?;
        let stored = model.into_stored(id);
        self.models.lock().await.insert(id, stored.clone());
        Ok(stored)
    }
}

fn openstack_model() -> IntegrationModelInput {
    IntegrationModelInput {
        name: "openstack".to_owned(),
        author: "platform".to_owned(),
        description: Some("Compute provider".to_owned()),
        default_config: IntegrationConfig::from_iter([
            (
                "auth_url".to_owned(),
                IntegrationConfigValue::new(IntegrationConfigType::String, ""),
            ),
            (
                "password".to_owned(),
                IntegrationConfigValue::new(IntegrationConfigType::Password, ""),
            ),
        ]),
        public_configurations: BTreeMap::from([(
            "shared-tenant".to_owned(),
            IntegrationConfig::from_iter([
                (
                    "auth_url".to_owned(),
                    IntegrationConfigValue::new(IntegrationConfigType::String, "https://keystone"),
                ),
                (
                    // Typed as plain string; the model still declares it sensitive.
                    "password".to_owned(),
                    IntegrationConfigValue::new(IntegrationConfigType::String, "hunter2"),
                ),
            ]),
        )]),
        public: true,
        capabilities: IntegrationCapabilities {
            compute: true,
            ..IntegrationCapabilities::default()
        },
    }
}

fn shared_value(
    model: &lattice_domain::IntegrationModel,
    field: &str,
) -> Option<String> {
    model
        .public_configurations()
        .get("shared-tenant")
        .and_then(|configuration| configuration.get(field))
        .map(|value| value.value.clone())
}

#[tokio::test]
async fn register_model_seals_sensitive_public_values() {
    let repository = Arc::new(InMemoryModels::default());
    let service = IntegrationModelService::new(repository.clone(), Arc::new(PrefixCipher));

    let registered = service.register_model(openstack_model()).await;
    assert!(registered.is_ok());
    let registered = registered.unwrap_or_else(|_| unreachable!());

    let stored = repository.find_model(registered.id()).await;
    let stored = stored.unwrap_or_else(|_| unreachable!());
    let shared = stored
        .as_ref()
        .and_then(|model| model.public_configurations.get("shared-tenant"))
        .cloned()
        .unwrap_or_default();

    assert_eq!(
        shared.get("password").map(|value| (value.sealed, value.value.clone())),
        Some((true, "sealed:hunter2".to_owned()))
    );
    assert_eq!(
        shared.get("auth_url").map(|value| (value.sealed, value.value.clone())),
        Some((false, "https://keystone".to_owned()))
    );
}

#[tokio::test]
async fn resolve_redacts_unless_clear_requested() {
    let service = IntegrationModelService::new(
        Arc::new(InMemoryModels::default()),
        Arc::new(PrefixCipher),
    );
    let registered = service
        .register_model(openstack_model())
        .await
        .unwrap_or_else(|_| unreachable!());

    let redacted = service
        .resolve(registered.id(), false)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(shared_value(&redacted, "password").as_deref(), Some(""));
    assert_eq!(
        shared_value(&redacted, "auth_url").as_deref(),
        Some("https://keystone")
    );

    let clear = service
        .resolve(registered.id(), true)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(shared_value(&clear, "password").as_deref(), Some("hunter2"));
    assert!(clear.sensitive_fields().contains("password"));
    assert!(clear.capabilities().compute);
}

#[tokio::test]
async fn resolve_missing_model_is_not_found() {
    let service = IntegrationModelService::new(
        Arc::new(InMemoryModels::default()),
        Arc::new(PrefixCipher),
    );

    let resolved = service
        .resolve(
            IntegrationModelId::new(42).unwrap_or_else(|_| unreachable!()),
            false,
        )
        .await;

    assert!(
        matches!(resolved, Err(AppError::NotFound(message)) if message == "integration model '42' not found")
    );
}

#[tokio::test]
async fn register_model_requires_name() {
    let repository = Arc::new(InMemoryModels::default());
    let service = IntegrationModelService::new(repository.clone(), Arc::new(PrefixCipher));
    let mut input = openstack_model();
    input.name = "  ".to_owned();

    let registered = service.register_model(input).await;

    assert!(matches!(registered, Err(AppError::Validation(_))));
    assert!(repository.models.lock().await.is_empty());
}
