use async_trait::async_trait;
use lattice_core::{AppResult, IntegrationId, WorkflowId};
use lattice_domain::WorkflowIntegrationLink;

use super::crypto::RecordSigner;
use super::query::IntegrationQuery;
use super::stored::{FetchedIntegration, NewStoredIntegration, StoredIntegration};

/// Repository port for signed integration rows.
///
/// Implementations never verify signatures; they return rows exactly as
/// persisted and leave verification to the record store.
#[async_trait]
pub trait IntegrationRepository: Send + Sync {
    /// Returns the first row matching the query.
    ///
    /// A row whose columns no longer decode is returned as
    /// [`FetchedIntegration::Undecodable`] rather than failing the read.
    async fn fetch_integration(
        &self,
        query: &IntegrationQuery,
    ) -> AppResult<Option<FetchedIntegration>>;

    /// Returns every row matching the query, ordered by name.
    async fn fetch_integrations(
        &self,
        query: &IntegrationQuery,
    ) -> AppResult<Vec<FetchedIntegration>>;

    /// Inserts a row, signs it once the identity is known and persists the
    /// signature in the same transaction.
    async fn insert_and_sign(
        &self,
        integration: NewStoredIntegration,
        signer: &dyn RecordSigner,
    ) -> AppResult<StoredIntegration>;

    /// Replaces every column of an existing row and re-signs it.
    async fn update_and_sign(
        &self,
        id: IntegrationId,
        integration: NewStoredIntegration,
        signer: &dyn RecordSigner,
    ) -> AppResult<StoredIntegration>;

    /// Deletes one row by identity.
    async fn delete_integration(&self, id: IntegrationId) -> AppResult<()>;
}

/// Repository port for the workflow/integration association table.
#[async_trait]
pub trait WorkflowIntegrationRepository: Send + Sync {
    /// Inserts the pair unless it already exists.
    async fn add_link(&self, link: WorkflowIntegrationLink) -> AppResult<()>;

    /// Deletes the pair if present.
    async fn remove_link(&self, link: WorkflowIntegrationLink) -> AppResult<()>;

    /// Deletes every pair of the workflow and returns how many were removed.
    async fn remove_links_for_workflow(&self, workflow_id: WorkflowId) -> AppResult<u64>;
}
