use lattice_application::WorkflowIntegrationRepository;
use lattice_core::WorkflowId;
use lattice_domain::WorkflowIntegrationLink;

use super::*;

#[async_trait]
impl WorkflowIntegrationRepository for PostgresIntegrationRepository {
    async fn add_link(&self, link: WorkflowIntegrationLink) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO workflow_project_integrations (workflow_id, project_integration_id)
            VALUES ($1, $2)
            ON CONFLICT (workflow_id, project_integration_id) DO NOTHING
            "#,
        )
        .bind(link.workflow_id.as_i64())
        .bind(link.integration_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to link integration '{}' to workflow '{}': {error}",
                link.integration_id, link.workflow_id
            ))
        })?;

        Ok(())
    }

    async fn remove_link(&self, link: WorkflowIntegrationLink) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM workflow_project_integrations
            WHERE workflow_id = $1 AND project_integration_id = $2
            "#,
        )
        .bind(link.workflow_id.as_i64())
        .bind(link.integration_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to unlink integration '{}' from workflow '{}': {error}",
                link.integration_id, link.workflow_id
            ))
        })?;

        Ok(())
    }

    async fn remove_links_for_workflow(&self, workflow_id: WorkflowId) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM workflow_project_integrations
            WHERE workflow_id = $1
            "#,
        )
        .bind(workflow_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to remove integration links of workflow '{workflow_id}': {error}"
            ))
        })?;

        Ok(result.rows_affected())
    }
}
