use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use lattice_core::{IntegrationId, WorkflowId};

use crate::dto::RemovedLinksResponse;
use crate::error::ApiResult;
use crate::state::AppState;


pub async fn link_integration_handler(
    State(state): State<AppState>,
    Path((workflow_id, integration_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    state
        .workflow_integration_service
        .add_to_workflow(
            WorkflowId::new(workflow_id)?,
            IntegrationId::new(integration_id)?,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn unlink_integration_handler(
    State(state): State<AppState>,
    Path((workflow_id, integration_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    state
        .workflow_integration_service
        .remove_from_workflow(
            WorkflowId::new(workflow_id)?,
            IntegrationId::new(integration_id)?,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn unlink_all_integrations_handler(
    State(state): State<AppState>,
    Path(workflow_id): Path<i64>,
) -> ApiResult<Json<RemovedLinksResponse>> {
    let removed = state
        .workflow_integration_service
        .remove_all_for_workflow(WorkflowId::new(workflow_id)?)
        .await?;

    Ok(Json(RemovedLinksResponse { removed }))
}
