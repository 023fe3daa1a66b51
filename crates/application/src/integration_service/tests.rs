use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use lattice_core::{
    AppError, AppResult, IntegrationId, IntegrationModelId, ProjectId, WorkflowId,
};
use lattice_domain::{
    IntegrationCapabilities, IntegrationConfig, IntegrationConfigType, IntegrationConfigValue,
    IntegrationModelInput, ProjectIntegrationInput, WorkflowIntegrationLink,
};

use crate::{
    FetchedIntegration, FieldCipher, IntegrationModelRepository, IntegrationModelService,
    IntegrationQuery, IntegrationRepository, NewStoredIntegration, NewStoredIntegrationModel,
    RecordSigner, StoredIntegration, StoredIntegrationModel, WorkflowIntegrationRepository,
    WorkflowIntegrationService,
};

use super::IntegrationService;

#[derive(Default)]
struct FakeSigner {
    counter: AtomicU64,
}

impl RecordSigner for FakeSigner {
    fn sign(&self, canonical: &[u8]) -> AppResult<String> {
        let nonce = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{nonce}:{}", String::from_utf8_lossy(canonical)))
    }

    fn verify(&self, canonical: &[u8], signature: &str) -> AppResult<bool> {
        Ok(signature
            .split_once(':')
            .is_some_and(|(_, signed)| signed.as_bytes() == canonical))
    }
}

#[derive(Default)]
struct UnavailableVerifier {
    signer: FakeSigner,
}

impl RecordSigner for UnavailableVerifier {
    fn sign(&self, canonical: &[u8]) -> AppResult<String> {
        self.signer.sign(canonical)
    }

    fn verify(&self, _canonical: &[u8], _signature: &str) -> AppResult<bool> {
        Err(AppError::Internal("signing key unavailable".to_owned()))
    }
}

struct FakeCipher;

impl FieldCipher for FakeCipher {
    fn seal(&self, plaintext: &str) -> AppResult<String> {
        Ok(format!("enc:{}", plaintext.chars().rev().collect::<String>()))
    }

    fn open(&self, sealed: &str) -> AppResult<String> {
        sealed
            .strip_prefix("enc:")
            .map(|value| value.chars().rev().collect())
            .ok_or_else(|| AppError::Internal("value is not sealed".to_owned()))
    }
}

#[derive(Default)]
struct FakeModelRepository {
    next_id: AtomicI64,
    models: Mutex<HashMap<IntegrationModelId, StoredIntegrationModel>>,
}

#[async_trait]
impl IntegrationModelRepository for FakeModelRepository {
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

#[derive(Default)]
struct FakeIntegrationRepository {
    next_id: AtomicI64,
    projects: HashMap<String, ProjectId>,
    rows: Mutex<BTreeMap<IntegrationId, StoredIntegration>>,
    undecodable: Mutex<HashSet<IntegrationId>>,
    links: Mutex<HashSet<WorkflowIntegrationLink>>,
}

impl FakeIntegrationRepository {
    fn with_project(key: &str, project_id: ProjectId) -> Self {
        Self {
            projects: HashMap::from([(key.to_owned(), project_id)]),
            ..Self::default()
        }
    }

    async fn tamper(&self, id: IntegrationId, mutate: impl FnOnce(&mut StoredIntegration)) {
        if let Some(row) = self.rows.lock().await.get_mut(&id) {
            mutate(row);
        }
    }

    async fn break_encoding(&self, id: IntegrationId) {
        self.undecodable.lock().await.insert(id);
    }

    async fn stored(&self, id: IntegrationId) -> Option<StoredIntegration> {
        self.rows.lock().await.get(&id).cloned()
    }

    async fn matching(&self, query: &IntegrationQuery) -> Vec<FetchedIntegration> {
        let rows = self.rows.lock().await;
        let links = self.links.lock().await;
        let undecodable = self.undecodable.lock().await;
        let mut matching: Vec<StoredIntegration> = rows
            .values()
            .filter(|row| match query {
                IntegrationQuery::ById(id) => row.id == *id,
                IntegrationQuery::ByProjectKeyAndName { project_key, name } => {
                    self.projects.get(project_key) == Some(&row.project_id) && &row.name == name
                }
                IntegrationQuery::ByProjectId(project_id) => row.project_id == *project_id,
                IntegrationQuery::ByWorkflowId(workflow_id) => {
                    links.contains(&WorkflowIntegrationLink::new(*workflow_id, row.id))
                }
            })
            .cloned()
            .collect();
        matching.sort_by(|left, right| left.name.cmp(&right.name));
        matching
            .into_iter()
            .map(|row| {
                if undecodable.contains(&row.id) {
                    FetchedIntegration::Undecodable {
                        id: row.id.as_i64(),
                        reason: "unknown variant `bogus`".to_owned(),
                    }
                } else {
                    FetchedIntegration::Decoded(row)
                }
            })
            .collect()
    }
}

#[async_trait]
impl IntegrationRepository for FakeIntegrationRepository {
    async fn fetch_integration(
        &self,
        query: &IntegrationQuery,
    ) -> AppResult<Option<FetchedIntegration>> {
        Ok(self.matching(query).await.into_iter().next())
    }

    async fn fetch_integrations(
        &self,
        query: &IntegrationQuery,
    ) -> AppResult<Vec<FetchedIntegration>> {
        Ok(self.matching(query).await)
    }

    async fn insert_and_sign(
        &self,
        integration: NewStoredIntegration,
        signer: &dyn RecordSigner,
    ) -> AppResult<StoredIntegration> {
        let id = IntegrationId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)?;
        let mut stored = integration.into_stored(id, "");
        stored.signature = signer.sign(stored.canonical_bytes()?.as_slice())?;
        self.rows.lock().await.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_and_sign(
        &self,
        id: IntegrationId,
        integration: NewStoredIntegration,
        signer: &dyn RecordSigner,
    ) -> AppResult<StoredIntegration> {
        let mut rows = self.rows.lock().await;
        if !rows.contains_key(&id) {
            return Err(AppError::NotFound(format!("integration '{id}' not found")));
        }

        let mut stored = integration.into_stored(id, "");
        stored.signature = signer.sign(stored.canonical_bytes()?.as_slice())?;
        rows.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete_integration(&self, id: IntegrationId) -> AppResult<()> {
        self.rows
            .lock()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("integration '{id}' not found")))
    }
}

#[async_trait]
impl WorkflowIntegrationRepository for FakeIntegrationRepository {
    async fn add_link(&self, link: WorkflowIntegrationLink) -> AppResult<()> {
        self.links.lock().await.insert(link);
        Ok(())
    }

    async fn remove_link(&self, link: WorkflowIntegrationLink) -> AppResult<()> {
        self.links.lock().await.remove(&link);
        Ok(())
    }

    async fn remove_links_for_workflow(&self, workflow_id: WorkflowId) -> AppResult<u64> {
        let mut links = self.links.lock().await;
        let before = links.len();
        links.retain(|link| link.workflow_id != workflow_id);
        Ok(u64::try_from(before - links.len()).unwrap_or(u64::MAX))
    }
}

struct Harness {
    service: IntegrationService,
    workflow_service: WorkflowIntegrationService,
    repository: Arc<FakeIntegrationRepository>,
    model_service: IntegrationModelService,
    model_id: IntegrationModelId,
    project_id: ProjectId,
}

fn id<T>(value: AppResult<T>) -> T {
    value.unwrap_or_else(|_| unreachable!())
}

async fn harness_with_signer(signer: Arc<dyn RecordSigner>) -> Harness {
    let project_id = id(ProjectId::new(10));
    let repository = Arc::new(FakeIntegrationRepository::with_project("PROJ", project_id));
    let cipher: Arc<dyn FieldCipher> = Arc::new(FakeCipher);
    let model_service =
        IntegrationModelService::new(Arc::new(FakeModelRepository::default()), cipher.clone());

    let model = model_service
        .register_model(IntegrationModelInput {
            name: "artifact-store".to_owned(),
            author: "platform".to_owned(),
            description: None,
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
            public: false,
            capabilities: IntegrationCapabilities {
                storage: true,
                ..IntegrationCapabilities::default()
            },
        })
        .await;
    assert!(model.is_ok());

    Harness {
        service: IntegrationService::new(
            repository.clone(),
            model_service.clone(),
            signer,
            cipher,
        ),
        workflow_service: WorkflowIntegrationService::new(repository.clone()),
        repository,
        model_service,
        model_id: id(model).id(),
        project_id,
    }
}

async fn harness() -> Harness {
    harness_with_signer(Arc::new(FakeSigner::default())).await
}

fn integration_input(harness: &Harness, name: &str, token: &str) -> ProjectIntegrationInput {
    ProjectIntegrationInput {
        project_id: harness.project_id,
        name: name.to_owned(),
        integration_model_id: harness.model_id,
        config: IntegrationConfig::from_iter([
            (
                "url".to_owned(),
                IntegrationConfigValue::new(IntegrationConfigType::String, "https://store"),
            ),
            (
                // Typed as plain string here; the model still marks it sensitive.
                "token".to_owned(),
                IntegrationConfigValue::new(IntegrationConfigType::String, token),
            ),
        ]),
    }
}

fn config_value(integration: &lattice_domain::ProjectIntegration, name: &str) -> Option<String> {
    integration
        .config()
        .get(name)
        .map(|value| value.value.clone())
}

#[tokio::test]
async fn insert_seals_sensitive_fields_and_returns_signed_record() {
    let harness = harness().await;

    let inserted = harness
        .service
        .insert_integration(integration_input(&harness, "store", "s3cr3t"))
        .await;
    assert!(inserted.is_ok());
    let inserted = id(inserted);

    assert!(!inserted.signature().is_empty());
    assert_eq!(config_value(&inserted, "token").as_deref(), Some("s3cr3t"));
    assert!(inserted.model().is_some());

    let stored = harness.repository.stored(inserted.id()).await;
    let token = stored
        .as_ref()
        .and_then(|row| row.config.get("token"))
        .cloned();
    assert!(token.as_ref().is_some_and(|value| value.sealed));
    assert!(token.is_some_and(|value| value.value != "s3cr3t"));
    assert_eq!(
        stored.map(|row| row.signature),
        Some(inserted.signature().to_owned())
    );
}

#[tokio::test]
async fn clear_password_load_round_trips_secret() {
    let harness = harness().await;
    let inserted = id(harness
        .service
        .insert_integration(integration_input(&harness, "store", "s3cr3t"))
        .await);

    let loaded = harness.service.load_by_id(inserted.id(), true).await;
    assert!(loaded.is_ok());
    let loaded = id(loaded);

    assert_eq!(config_value(&loaded, "token").as_deref(), Some("s3cr3t"));
    assert_eq!(loaded.config(), inserted.config());
}

#[tokio::test]
async fn default_load_redacts_sensitive_fields() {
    let harness = harness().await;
    let inserted = id(harness
        .service
        .insert_integration(integration_input(&harness, "store", "s3cr3t"))
        .await);

    let loaded = id(harness.service.load_by_name("PROJ", "store", false).await);

    assert_eq!(loaded.id(), inserted.id());
    assert_eq!(config_value(&loaded, "token").as_deref(), Some(""));
    assert_eq!(
        config_value(&loaded, "url").as_deref(),
        Some("https://store")
    );
    assert_eq!(
        loaded.model().map(|model| model.id()),
        Some(harness.model_id)
    );
}

#[tokio::test]
async fn missing_record_is_not_found() {
    let harness = harness().await;

    let loaded = harness.service.load_by_name("PROJ", "absent", false).await;
    assert!(matches!(loaded, Err(AppError::NotFound(_))));

    let unknown_project = harness.service.load_by_name("OTHER", "store", false).await;
    assert!(matches!(unknown_project, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn tampered_record_loads_as_not_found() {
    let harness = harness().await;
    let inserted = id(harness
        .service
        .insert_integration(integration_input(&harness, "store", "s3cr3t"))
        .await);

    harness
        .repository
        .tamper(inserted.id(), |row| row.name = "renamed".to_owned())
        .await;

    let loaded = harness.service.load_by_id(inserted.id(), true).await;
    assert!(matches!(loaded, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn tampered_plain_field_is_detected() {
    let harness = harness().await;
    let inserted = id(harness
        .service
        .insert_integration(integration_input(&harness, "store", "s3cr3t"))
        .await);

    harness
        .repository
        .tamper(inserted.id(), |row| {
            if let Some(url) = row.config.get_mut("url") {
                url.value = "https://attacker".to_owned();
            }
        })
        .await;

    let loaded = harness.service.load_by_id(inserted.id(), false).await;
    assert!(matches!(loaded, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn batch_load_skips_corrupted_rows() {
    let harness = harness().await;
    let mut ids = Vec::new();
    for name in ["alpha", "bravo", "charlie"] {
        let inserted = id(harness
            .service
            .insert_integration(integration_input(&harness, name, "token"))
            .await);
        ids.push(inserted.id());
    }

    harness
        .repository
        .tamper(ids[1], |row| row.signature = "0:forged".to_owned())
        .await;

    let batch = harness
        .service
        .load_all(IntegrationQuery::ByProjectId(harness.project_id), false)
        .await;
    assert!(batch.is_ok());
    let batch = id(batch);

    assert_eq!(batch.skipped_corrupted, 1);
    let names: Vec<&str> = batch
        .integrations
        .iter()
        .map(|integration| integration.name().as_str())
        .collect();
    assert_eq!(names, vec!["alpha", "charlie"]);

    let listed = id(harness
        .service
        .list_for_project(harness.project_id, false)
        .await);
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn undecodable_row_is_skipped_in_batch_and_hidden_when_single() {
    let harness = harness().await;
    let mut ids = Vec::new();
    for name in ["alpha", "bravo", "charlie"] {
        let inserted = id(harness
            .service
            .insert_integration(integration_input(&harness, name, "token"))
            .await);
        ids.push(inserted.id());
    }

    harness.repository.break_encoding(ids[1]).await;

    let batch = id(harness
        .service
        .load_all(IntegrationQuery::ByProjectId(harness.project_id), true)
        .await);
    assert_eq!(batch.skipped_corrupted, 1);
    let names: Vec<&str> = batch
        .integrations
        .iter()
        .map(|integration| integration.name().as_str())
        .collect();
    assert_eq!(names, vec!["alpha", "charlie"]);

    let single = harness.service.load_by_id(ids[1], true).await;
    assert!(matches!(single, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn verifier_failure_is_a_verification_error() {
    let harness = harness_with_signer(Arc::new(UnavailableVerifier::default())).await;
    let inserted = id(harness
        .service
        .insert_integration(integration_input(&harness, "store", "token"))
        .await);

    let single = harness.service.load_by_id(inserted.id(), false).await;
    assert!(matches!(single, Err(AppError::Verification(_))));

    let batch = harness
        .service
        .list_for_project(harness.project_id, false)
        .await;
    assert!(matches!(batch, Err(AppError::Verification(_))));
}

#[tokio::test]
async fn unresolvable_model_fails_the_batch() {
    let harness = harness().await;
    let signer = FakeSigner::default();
    let orphan_model = id(IntegrationModelId::new(999));

    assert!(
        harness
            .service
            .insert_integration(integration_input(&harness, "alpha", "token"))
            .await
            .is_ok()
    );
    let orphan = harness
        .repository
        .insert_and_sign(
            NewStoredIntegration {
                project_id: harness.project_id,
                name: "orphan".to_owned(),
                integration_model_id: orphan_model,
                config: BTreeMap::new(),
            },
            &signer,
        )
        .await;
    assert!(orphan.is_ok());

    let batch = harness
        .service
        .list_for_project(harness.project_id, false)
        .await;
    assert!(matches!(batch, Err(AppError::NotFound(message)) if message.contains("model")));
}

#[tokio::test]
async fn insert_with_unknown_model_is_rejected() {
    let harness = harness().await;
    let mut input = integration_input(&harness, "store", "token");
    input.integration_model_id = id(IntegrationModelId::new(404));

    let inserted = harness.service.insert_integration(input).await;
    assert!(matches!(inserted, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn update_always_changes_signature() {
    let harness = harness().await;
    let inserted = id(harness
        .service
        .insert_integration(integration_input(&harness, "store", "s3cr3t"))
        .await);
    let loaded = id(harness.service.load_by_id(inserted.id(), true).await);

    let updated = harness.service.update_integration(loaded.clone()).await;
    assert!(updated.is_ok());
    let updated = id(updated);

    assert_ne!(updated.signature(), inserted.signature());
    assert_eq!(updated.config(), loaded.config());

    let reloaded = id(harness.service.load_by_id(inserted.id(), true).await);
    assert_eq!(reloaded.signature(), updated.signature());
    assert_eq!(config_value(&reloaded, "token").as_deref(), Some("s3cr3t"));
}

#[tokio::test]
async fn update_replaces_config_wholesale() {
    let harness = harness().await;
    let mut integration = id(harness
        .service
        .insert_integration(integration_input(&harness, "store", "s3cr3t"))
        .await);

    integration.replace_config(IntegrationConfig::from_iter([(
        "token".to_owned(),
        IntegrationConfigValue::new(IntegrationConfigType::Password, "rotated"),
    )]));
    assert!(
        harness
            .service
            .update_integration(integration.clone())
            .await
            .is_ok()
    );

    let reloaded = id(harness.service.load_by_id(integration.id(), true).await);
    assert_eq!(reloaded.config().len(), 1);
    assert_eq!(config_value(&reloaded, "token").as_deref(), Some("rotated"));
}

#[tokio::test]
async fn delete_leaves_workflow_links_untouched() {
    let harness = harness().await;
    let workflow_id = id(WorkflowId::new(5));
    let inserted = id(harness
        .service
        .insert_integration(integration_input(&harness, "store", "token"))
        .await);

    assert!(
        harness
            .workflow_service
            .add_to_workflow(workflow_id, inserted.id())
            .await
            .is_ok()
    );
    assert!(harness.service.delete_integration(inserted.id()).await.is_ok());

    assert_eq!(harness.repository.links.lock().await.len(), 1);
    let deleted_again = harness.service.delete_integration(inserted.id()).await;
    assert!(matches!(deleted_again, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn add_to_workflow_is_idempotent() {
    let harness = harness().await;
    let workflow_id = id(WorkflowId::new(5));
    let inserted = id(harness
        .service
        .insert_integration(integration_input(&harness, "store", "token"))
        .await);

    for _ in 0..2 {
        assert!(
            harness
                .workflow_service
                .add_to_workflow(workflow_id, inserted.id())
                .await
                .is_ok()
        );
    }

    assert_eq!(harness.repository.links.lock().await.len(), 1);
    let linked = id(harness.service.list_for_workflow(workflow_id, false).await);
    assert_eq!(linked.len(), 1);
}

#[tokio::test]
async fn remove_all_for_workflow_empties_workflow_listing() {
    let harness = harness().await;
    let workflow_id = id(WorkflowId::new(5));
    let other_workflow_id = id(WorkflowId::new(6));
    for name in ["alpha", "bravo"] {
        let inserted = id(harness
            .service
            .insert_integration(integration_input(&harness, name, "token"))
            .await);
        assert!(
            harness
                .workflow_service
                .add_to_workflow(workflow_id, inserted.id())
                .await
                .is_ok()
        );
        assert!(
            harness
                .workflow_service
                .add_to_workflow(other_workflow_id, inserted.id())
                .await
                .is_ok()
        );
    }

    let removed = harness
        .workflow_service
        .remove_all_for_workflow(workflow_id)
        .await;
    assert_eq!(removed.ok(), Some(2));

    let linked = id(harness.service.list_for_workflow(workflow_id, false).await);
    assert!(linked.is_empty());
    let other = id(harness
        .service
        .list_for_workflow(other_workflow_id, false)
        .await);
    assert_eq!(other.len(), 2);
}

#[tokio::test]
async fn removing_absent_link_is_not_an_error() {
    let harness = harness().await;

    let removed = harness
        .workflow_service
        .remove_from_workflow(id(WorkflowId::new(1)), id(IntegrationId::new(1)))
        .await;
    assert!(removed.is_ok());
}

#[tokio::test]
async fn model_is_resolved_once_per_batch_with_clear_flag() {
    let harness = harness().await;
    for name in ["alpha", "bravo"] {
        assert!(
            harness
                .service
                .insert_integration(integration_input(&harness, name, "token"))
                .await
                .is_ok()
        );
    }

    let listed = id(harness
        .service
        .list_for_project(harness.project_id, true)
        .await);
    assert!(listed.iter().all(|integration| {
        integration.model().map(|model| model.id()) == Some(harness.model_id)
            && config_value(integration, "token").as_deref() == Some("token")
    }));

    let direct = harness.model_service.resolve(harness.model_id, true).await;
    assert!(direct.is_ok());
}
