//! Lattice API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use lattice_application::{
    IntegrationModelService, IntegrationService, WorkflowIntegrationService,
};
use lattice_core::AppError;
use lattice_infrastructure::{
    AesHmacIntegrationCrypto, PostgresIntegrationModelRepository, PostgresIntegrationRepository,
};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let crypto = Arc::new(AesHmacIntegrationCrypto::from_hex(
        config.integration_encryption_key.as_str(),
        config.integration_signing_key.as_str(),
    )?);
    let integration_repository = Arc::new(PostgresIntegrationRepository::new(pool.clone()));
    let model_service = IntegrationModelService::new(
        Arc::new(PostgresIntegrationModelRepository::new(pool)),
        crypto.clone(),
    );

    let app_state = AppState {
        integration_service: IntegrationService::new(
            integration_repository.clone(),
            model_service,
            crypto.clone(),
            crypto,
        ),
        workflow_integration_service: WorkflowIntegrationService::new(integration_repository),
        admin_token: Arc::from(config.admin_token.as_str()),
    };

    let app = api_router::build_router(app_state);
    let address = config.socket_address()?;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "lattice-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
