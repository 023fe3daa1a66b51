use async_trait::async_trait;
use lattice_application::{
    FetchedIntegration, IntegrationQuery, IntegrationRepository, NewStoredIntegration,
    RecordSigner, StoredIntegration, StoredIntegrationConfig,
};
use lattice_core::{AppError, AppResult, IntegrationId, IntegrationModelId, ProjectId};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

mod workflow_links;


/// PostgreSQL-backed integration record and workflow link repository.
#[derive(Clone)]
pub struct PostgresIntegrationRepository {
    pool: PgPool,
}

impl PostgresIntegrationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct IntegrationRow {
    id: i64,
    project_id: i64,
    name: String,
    integration_model_id: i64,
    config: Value,
    signature: String,
}

impl IntegrationRow {
    /// Decodes the row; column values that no longer decode mark it corrupted
    /// instead of failing the read.
    fn into_fetched(self) -> FetchedIntegration {
        let id = self.id;
        self.decode()
            .map(FetchedIntegration::Decoded)
            .unwrap_or_else(|error| FetchedIntegration::Undecodable {
                id,
                reason: error.to_string(),
            })
    }

    fn decode(self) -> AppResult<StoredIntegration> {
        let config: StoredIntegrationConfig =
            serde_json::from_value(self.config).map_err(|error| {
                AppError::Validation(format!("invalid persisted config: {error}"))
            })?;

        Ok(StoredIntegration {
            id: IntegrationId::new(self.id)?,
            project_id: ProjectId::new(self.project_id)?,
            name: self.name,
            integration_model_id: IntegrationModelId::new(self.integration_model_id)?,
            config,
            signature: self.signature,
        })
    }
}

fn select_integrations(query: &IntegrationQuery) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(
        r#"
        SELECT pi.id, pi.project_id, pi.name, pi.integration_model_id, pi.config, pi.signature
        FROM project_integrations pi
        "#,
    );

    match query {
        IntegrationQuery::ById(id) => {
            builder.push(" WHERE pi.id = ").push_bind(id.as_i64());
        }
        IntegrationQuery::ByProjectKeyAndName { project_key, name } => {
            builder
                .push(" JOIN projects p ON p.id = pi.project_id WHERE p.project_key = ")
                .push_bind(project_key.as_str())
                .push(" AND pi.name = ")
                .push_bind(name.as_str());
        }
        IntegrationQuery::ByProjectId(project_id) => {
            builder
                .push(" WHERE pi.project_id = ")
                .push_bind(project_id.as_i64());
        }
        IntegrationQuery::ByWorkflowId(workflow_id) => {
            builder
                .push(
                    " JOIN workflow_project_integrations wpi \
                     ON wpi.project_integration_id = pi.id \
                     WHERE wpi.workflow_id = ",
                )
                .push_bind(workflow_id.as_i64());
        }
    }

    builder.push(" ORDER BY pi.name, pi.id");
    builder
}

fn config_json(config: &StoredIntegrationConfig) -> AppResult<Value> {
    serde_json::to_value(config).map_err(|error| {
        AppError::Internal(format!("failed to serialize integration config: {error}"))
    })
}

fn write_error(error: sqlx::Error, integration: &NewStoredIntegration, action: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error {
        match database_error.code().as_deref() {
            Some("23505") => {
                return AppError::Conflict(format!(
                    "integration '{}' already exists in project '{}'",
                    integration.name, integration.project_id
                ));
            }
            Some("23503") => {
                return AppError::Validation(format!(
                    "integration '{}' references unknown project '{}' or model '{}'",
                    integration.name, integration.project_id, integration.integration_model_id
                ));
            }
            _ => {}
        }
    }

    AppError::Internal(format!(
        "failed to {action} integration '{}': {error}",
        integration.name
    ))
}

#[async_trait]
impl IntegrationRepository for PostgresIntegrationRepository {
    async fn fetch_integration(
        &self,
        query: &IntegrationQuery,
    ) -> AppResult<Option<FetchedIntegration>> {
        let row = select_integrations(query)
            .build_query_as::<IntegrationRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to fetch {query}: {error}")))?;

        Ok(row.map(IntegrationRow::into_fetched))
    }

    async fn fetch_integrations(
        &self,
        query: &IntegrationQuery,
    ) -> AppResult<Vec<FetchedIntegration>> {
        let rows = select_integrations(query)
            .build_query_as::<IntegrationRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to fetch {query}: {error}")))?;

        Ok(rows.into_iter().map(IntegrationRow::into_fetched).collect())
    }

    async fn insert_and_sign(
        &self,
        integration: NewStoredIntegration,
        signer: &dyn RecordSigner,
    ) -> AppResult<StoredIntegration> {
        let config = config_json(&integration.config)?;

        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO project_integrations (
                project_id,
                name,
                integration_model_id,
                config,
                signature
            )
            VALUES ($1, $2, $3, $4, '')
            RETURNING id
            "#,
        )
        .bind(integration.project_id.as_i64())
        .bind(integration.name.as_str())
        .bind(integration.integration_model_id.as_i64())
        .bind(config)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| write_error(error, &integration, "insert"))?;

        let mut stored = integration.into_stored(IntegrationId::new(id)?, "");
        stored.signature = signer.sign(stored.canonical_bytes()?.as_slice())?;

        sqlx::query(
            r#"
            UPDATE project_integrations
            SET signature = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(stored.signature.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to store signature of integration '{id}': {error}"
            ))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(stored)
    }

    async fn update_and_sign(
        &self,
        id: IntegrationId,
        integration: NewStoredIntegration,
        signer: &dyn RecordSigner,
    ) -> AppResult<StoredIntegration> {
        let config = config_json(&integration.config)?;
        let stored = {
            let mut stored = integration.clone().into_stored(id, "");
            stored.signature = signer.sign(stored.canonical_bytes()?.as_slice())?;
            stored
        };

        let result = sqlx::query(
            r#"
            UPDATE project_integrations
            SET project_id = $2,
                name = $3,
                integration_model_id = $4,
                config = $5,
                signature = $6,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .bind(stored.project_id.as_i64())
        .bind(stored.name.as_str())
        .bind(stored.integration_model_id.as_i64())
        .bind(config)
        .bind(stored.signature.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| write_error(error, &integration, "update"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("integration '{id}' not found")));
        }

        Ok(stored)
    }

    async fn delete_integration(&self, id: IntegrationId) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM project_integrations
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to delete integration '{id}': {error}"))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("integration '{id}' not found")));
        }

        Ok(())
    }
}
