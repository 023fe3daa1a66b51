use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use lattice_application::{KeyInstallRequest, KeyInstallService};
use lattice_core::{AppError, AppResult};
use lattice_domain::JobSecretSet;
use serde::{Deserialize, Serialize};

use crate::error::WorkerResult;


/// State shared by the worker's local endpoints.
#[derive(Clone)]
pub struct WorkerState {
    pub key_install_service: KeyInstallService,
    pub job_secrets: Arc<Option<JobSecretSet>>,
}

#[derive(Debug, Default, Deserialize)]
struct InstallKeyBody {
    #[serde(default)]
    file: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InstallKeyResponse {
    pub pkey: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

pub async fn install_key_handler(
    State(state): State<WorkerState>,
    Path(key): Path<String>,
    body: Bytes,
) -> WorkerResult<Json<InstallKeyResponse>> {
    let body = parse_body(&body)?;
    let installed = state
        .key_install_service
        .install(
            Option::as_ref(&state.job_secrets),
            KeyInstallRequest {
                key_name: key,
                destination: body.file,
            },
        )
        .await?;

    Ok(Json(InstallKeyResponse {
        pkey: installed.path.display().to_string(),
        kind: installed.kind.as_str(),
    }))
}

fn parse_body(body: &[u8]) -> AppResult<InstallKeyBody> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(InstallKeyBody::default());
    }

    serde_json::from_slice::<InstallKeyBody>(body)
        .map_err(|error| AppError::Validation(format!("invalid key install request: {error}")))
}
