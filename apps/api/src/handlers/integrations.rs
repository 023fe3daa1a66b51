use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use lattice_core::IntegrationId;
use lattice_domain::ProjectIntegration;

use crate::dto::{
    CreateIntegrationRequest, IntegrationResponse, IntegrationScope, ListIntegrationsQuery,
    UpdateIntegrationRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;


pub async fn list_integrations_handler(
    State(state): State<AppState>,
    Query(query): Query<ListIntegrationsQuery>,
) -> ApiResult<Json<Vec<IntegrationResponse>>> {
    let integrations = match query.scope()? {
        IntegrationScope::Project(project_id) => {
            state
                .integration_service
                .list_for_project(project_id, false)
                .await?
        }
        IntegrationScope::Workflow(workflow_id) => {
            state
                .integration_service
                .list_for_workflow(workflow_id, false)
                .await?
        }
    };

    Ok(Json(
        integrations
            .into_iter()
            .map(IntegrationResponse::from)
            .collect(),
    ))
}

pub async fn create_integration_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateIntegrationRequest>,
) -> ApiResult<(StatusCode, Json<IntegrationResponse>)> {
    let integration = state
        .integration_service
        .insert_integration(payload.into_input()?)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(IntegrationResponse::from(redacted(integration))),
    ))
}

pub async fn get_integration_handler(
    State(state): State<AppState>,
    Path(integration_id): Path<i64>,
) -> ApiResult<Json<IntegrationResponse>> {
    let integration = state
        .integration_service
        .load_by_id(IntegrationId::new(integration_id)?, false)
        .await?;

    Ok(Json(IntegrationResponse::from(integration)))
}

pub async fn get_project_integration_handler(
    State(state): State<AppState>,
    Path((project_key, name)): Path<(String, String)>,
) -> ApiResult<Json<IntegrationResponse>> {
    let integration = state
        .integration_service
        .load_by_name(project_key.as_str(), name.as_str(), false)
        .await?;

    Ok(Json(IntegrationResponse::from(integration)))
}

/// Replaces name and configuration. Sensitive fields must be sent again,
/// since redacted reads never expose their stored values.
pub async fn update_integration_handler(
    State(state): State<AppState>,
    Path(integration_id): Path<i64>,
    Json(payload): Json<UpdateIntegrationRequest>,
) -> ApiResult<Json<IntegrationResponse>> {
    let mut integration = state
        .integration_service
        .load_by_id(IntegrationId::new(integration_id)?, false)
        .await?;
    payload.apply_to(&mut integration)?;

    let integration = state
        .integration_service
        .update_integration(integration)
        .await?;

    Ok(Json(IntegrationResponse::from(redacted(integration))))
}

pub async fn delete_integration_handler(
    State(state): State<AppState>,
    Path(integration_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state
        .integration_service
        .delete_integration(IntegrationId::new(integration_id)?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// Write paths hand back clear values; responses never carry them.
fn redacted(mut integration: ProjectIntegration) -> ProjectIntegration {
    if let Some(model) = integration.model().cloned() {
        integration.redact(&model);
    }

    integration
}
