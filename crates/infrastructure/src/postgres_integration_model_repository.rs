use std::collections::BTreeMap;

use async_trait::async_trait;
use lattice_application::{
    IntegrationModelRepository, NewStoredIntegrationModel, StoredIntegrationConfig,
    StoredIntegrationModel,
};
use lattice_core::{AppError, AppResult, IntegrationModelId};
use lattice_domain::{IntegrationCapabilities, IntegrationConfig};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed integration model repository.
#[derive(Clone)]
pub struct PostgresIntegrationModelRepository {
    pool: PgPool,
}

impl PostgresIntegrationModelRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct IntegrationModelRow {
    id: i64,
    name: String,
    author: String,
    description: Option<String>,
    default_config: Value,
    public_configurations: Value,
    public: bool,
    storage: bool,
    deployment: bool,
    hook: bool,
    compute: bool,
    event: bool,
}

impl IntegrationModelRow {
    fn into_stored(self) -> AppResult<StoredIntegrationModel> {
        let id = self.id;
        let invalid = move |column: &str, error: serde_json::Error| {
            AppError::Internal(format!(
                "persisted integration model '{id}' has an invalid {column}: {error}"
            ))
        };

        let default_config: IntegrationConfig =
            serde_json::from_value(self.default_config)
                .map_err(|error| invalid("default_config", error))?;
        let public_configurations: BTreeMap<String, StoredIntegrationConfig> =
            serde_json::from_value(self.public_configurations)
                .map_err(|error| invalid("public_configurations", error))?;

        Ok(StoredIntegrationModel {
            id: IntegrationModelId::new(id)?,
            name: self.name,
            author: self.author,
            description: self.description,
            default_config,
            public_configurations,
            public: self.public,
            capabilities: IntegrationCapabilities {
                storage: self.storage,
                deployment: self.deployment,
                hook: self.hook,
                compute: self.compute,
                event: self.event,
            },
        })
    }
}

#[async_trait]
impl IntegrationModelRepository for PostgresIntegrationModelRepository {
    async fn find_model(
        &self,
        model_id: IntegrationModelId,
    ) -> AppResult<Option<StoredIntegrationModel>> {
        let row = sqlx::query_as::<_, IntegrationModelRow>(
            r#"
            SELECT
                id,
                name,
                author,
                description,
                default_config,
                public_configurations,
                public,
                storage,
                deployment,
                hook,
                compute,
                event
            FROM integration_models
            WHERE id = $1
            "#,
        )
        .bind(model_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find integration model '{model_id}': {error}"
            ))
        })?;

        row.map(IntegrationModelRow::into_stored).transpose()
    }

    async fn insert_model(
        &self,
        model: NewStoredIntegrationModel,
    ) -> AppResult<StoredIntegrationModel> {
        let default_config = serde_json::to_value(&model.default_config).map_err(|error| {
            AppError::Internal(format!("failed to serialize default config: {error}"))
        })?;
        let public_configurations =
            serde_json::to_value(&model.public_configurations).map_err(|error| {
                AppError::Internal(format!(
                    "failed to serialize public configurations: {error}"
                ))
            })?;

        let result = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO integration_models (
                name,
                author,
                description,
                default_config,
                public_configurations,
                public,
                storage,
                deployment,
                hook,
                compute,
                event
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(model.name.as_str())
        .bind(model.author.as_str())
        .bind(model.description.as_deref())
        .bind(default_config)
        .bind(public_configurations)
        .bind(model.public)
        .bind(model.capabilities.storage)
        .bind(model.capabilities.deployment)
        .bind(model.capabilities.hook)
        .bind(model.capabilities.compute)
        .bind(model.capabilities.event)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(id) => Ok(model.into_stored(IntegrationModelId::new(id)?)),
            Err(error) => {
                if let sqlx::Error::Database(database_error) = &error
                    && database_error.code().as_deref() == Some("23505")
                {
                    return Err(AppError::Conflict(format!(
                        "integration model '{}' already exists",
                        model.name
                    )));
                }

                Err(AppError::Internal(format!(
                    "failed to insert integration model '{}': {error}",
                    model.name
                )))
            }
        }
    }
}
