use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, put};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

pub fn build_router(app_state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/api/integrations",
            get(handlers::integrations::list_integrations_handler)
                .post(handlers::integrations::create_integration_handler),
        )
        .route(
            "/api/integrations/{integration_id}",
            get(handlers::integrations::get_integration_handler)
                .put(handlers::integrations::update_integration_handler)
                .delete(handlers::integrations::delete_integration_handler),
        )
        .route(
            "/api/projects/{project_key}/integrations/{name}",
            get(handlers::integrations::get_project_integration_handler),
        )
        .route(
            "/api/workflows/{workflow_id}/integrations",
            delete(handlers::workflows::unlink_all_integrations_handler),
        )
        .route(
            "/api/workflows/{workflow_id}/integrations/{integration_id}",
            put(handlers::workflows::link_integration_handler)
                .delete(handlers::workflows::unlink_integration_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_admin_token,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
