//! Lattice worker runtime.
//!
//! Serves the job-local endpoints a running job calls to provision key
//! material on the worker host.

#![forbid(unsafe_code)]

mod error;
mod key_install;
mod worker_config;

use std::sync::Arc;

use axum::Router;
use axum::routing::post;
use lattice_application::KeyInstallService;
use lattice_core::AppError;
use lattice_infrastructure::FilesystemKeyInstaller;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::key_install::{WorkerState, install_key_handler};
use crate::worker_config::{WorkerConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let job_secrets = config.load_job_secrets().await?;
    match job_secrets.as_ref() {
        Some(secrets) => info!(secret_count = secrets.len(), "job secrets loaded"),
        None => warn!("no job secrets configured; key installation is unavailable"),
    }

    let state = WorkerState {
        key_install_service: KeyInstallService::new(Arc::new(FilesystemKeyInstaller::new(
            config.keys_dir.clone(),
        ))),
        job_secrets: Arc::new(job_secrets),
    };

    let app = build_router(state);
    let address = config.socket_address()?;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(
        %address,
        keys_dir = %config.keys_dir.display(),
        "lattice-worker listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("worker server error: {error}")))
}

fn build_router(state: WorkerState) -> Router {
    Router::new()
        .route("/key/{key}/install", post(install_key_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
