use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use lattice_application::{
    FetchedIntegration, IntegrationQuery, IntegrationRepository, NewStoredIntegration,
    RecordSigner, StoredIntegration, WorkflowIntegrationRepository,
};
use lattice_core::{AppError, AppResult, IntegrationId, ProjectId, WorkflowId};
use lattice_domain::WorkflowIntegrationLink;
use tokio::sync::RwLock;


/// In-memory integration record and workflow link repository.
#[derive(Debug, Default)]
pub struct InMemoryIntegrationRepository {
    next_id: AtomicI64,
    projects: RwLock<HashMap<String, ProjectId>>,
    integrations: RwLock<BTreeMap<IntegrationId, StoredIntegration>>,
    links: RwLock<HashSet<WorkflowIntegrationLink>>,
}

impl InMemoryIntegrationRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes a project addressable by its key.
    pub async fn register_project(&self, project_key: impl Into<String>, project_id: ProjectId) {
        self.projects
            .write()
            .await
            .insert(project_key.into(), project_id);
    }

    /// Replaces a stored row verbatim, signature included.
    ///
    /// Bypasses signing, so it can stand in for out-of-band storage edits.
    pub async fn overwrite_stored(&self, row: StoredIntegration) {
        self.integrations.write().await.insert(row.id, row);
    }

    /// Returns a stored row exactly as persisted.
    pub async fn stored(&self, id: IntegrationId) -> Option<StoredIntegration> {
        self.integrations.read().await.get(&id).cloned()
    }

    /// Returns the number of workflow links.
    pub async fn link_count(&self) -> usize {
        self.links.read().await.len()
    }

    async fn matching(&self, query: &IntegrationQuery) -> Vec<StoredIntegration> {
        let projects = self.projects.read().await;
        let integrations = self.integrations.read().await;
        let links = self.links.read().await;

        let mut rows: Vec<StoredIntegration> = integrations
            .values()
            .filter(|row| match query {
                IntegrationQuery::ById(id) => row.id == *id,
                IntegrationQuery::ByProjectKeyAndName { project_key, name } => {
                    projects.get(project_key) == Some(&row.project_id) && &row.name == name
                }
                IntegrationQuery::ByProjectId(project_id) => row.project_id == *project_id,
                IntegrationQuery::ByWorkflowId(workflow_id) => {
                    links.contains(&WorkflowIntegrationLink::new(*workflow_id, row.id))
                }
            })
            .cloned()
            .collect();
        rows.sort_by(|left, right| left.name.cmp(&right.name).then(left.id.cmp(&right.id)));

        rows
    }

    fn name_taken(
        integrations: &BTreeMap<IntegrationId, StoredIntegration>,
        integration: &NewStoredIntegration,
        except: Option<IntegrationId>,
    ) -> bool {
        integrations.values().any(|row| {
            Some(row.id) != except
                && row.project_id == integration.project_id
                && row.name == integration.name
        })
    }
}

fn conflict(integration: &NewStoredIntegration) -> AppError {
    AppError::Conflict(format!(
        "integration '{}' already exists in project '{}'",
        integration.name, integration.project_id
    ))
}

#[async_trait]
impl IntegrationRepository for InMemoryIntegrationRepository {
    async fn fetch_integration(
        &self,
        query: &IntegrationQuery,
    ) -> AppResult<Option<FetchedIntegration>> {
        Ok(self
            .matching(query)
            .await
            .into_iter()
            .next()
            .map(FetchedIntegration::from))
    }

    async fn fetch_integrations(
        &self,
        query: &IntegrationQuery,
    ) -> AppResult<Vec<FetchedIntegration>> {
        Ok(self
            .matching(query)
            .await
            .into_iter()
            .map(FetchedIntegration::from)
            .collect())
    }

    async fn insert_and_sign(
        &self,
        integration: NewStoredIntegration,
        signer: &dyn RecordSigner,
    ) -> AppResult<StoredIntegration> {
        let mut integrations = self.integrations.write().await;
        if Self::name_taken(&integrations, &integration, None) {
            return Err(conflict(&integration));
        }

        let id = IntegrationId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)?;
        let mut stored = integration.into_stored(id, "");
        stored.signature = signer.sign(stored.canonical_bytes()?.as_slice())?;

        integrations.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_and_sign(
        &self,
        id: IntegrationId,
        integration: NewStoredIntegration,
        signer: &dyn RecordSigner,
    ) -> AppResult<StoredIntegration> {
        let mut integrations = self.integrations.write().await;
        if !integrations.contains_key(&id) {
            return Err(AppError::NotFound(format!("integration '{id}' not found")));
        }
        if Self::name_taken(&integrations, &integration, Some(id)) {
            return Err(conflict(&integration));
        }

        let mut stored = integration.into_stored(id, "");
        stored.signature = signer.sign(stored.canonical_bytes()?.as_slice())?;

        integrations.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete_integration(&self, id: IntegrationId) -> AppResult<()> {
        self.integrations
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("integration '{id}' not found")))
    }
}

#[async_trait]
impl WorkflowIntegrationRepository for InMemoryIntegrationRepository {
    async fn add_link(&self, link: WorkflowIntegrationLink) -> AppResult<()> {
        self.links.write().await.insert(link);
        Ok(())
    }

    async fn remove_link(&self, link: WorkflowIntegrationLink) -> AppResult<()> {
        self.links.write().await.remove(&link);
        Ok(())
    }

    async fn remove_links_for_workflow(&self, workflow_id: WorkflowId) -> AppResult<u64> {
        let mut links = self.links.write().await;
        let before = links.len();
        links.retain(|link| link.workflow_id != workflow_id);

        u64::try_from(before - links.len())
            .map_err(|error| AppError::Internal(format!("link count overflow: {error}")))
    }
}
