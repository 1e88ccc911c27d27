use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Routes mounted under `/schedules`. Every route requires an authenticated
/// caller whose token carries an organization.
pub fn schedule_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        // Schedule management
        .route("/", post(handlers::create_schedule))
        .route("/", get(handlers::list_schedules))
        .route("/{schedule_id}", get(handlers::get_schedule))
        .route("/{schedule_id}", patch(handlers::update_schedule))

        // Bookable capacity for one provider and service over a date range
        .route("/{schedule_id}/availability", get(handlers::list_availability))

        // Provider membership
        .route("/{schedule_id}/providers", post(handlers::add_provider))
        .route("/{schedule_id}/providers", get(handlers::list_providers))
        .route("/{schedule_id}/providers/{provider_id}", delete(handlers::remove_provider))

        // Schedule-wide blackouts
        .route("/{schedule_id}/exceptions", post(handlers::create_schedule_exception))
        .route("/{schedule_id}/exceptions", get(handlers::list_schedule_exceptions))

        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}

/// Routes mounted under `/providers`: weekly windows and per-provider
/// exceptions.
pub fn provider_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/{provider_id}/windows", post(handlers::create_window))
        .route("/{provider_id}/windows", get(handlers::list_windows))
        .route("/{provider_id}/windows/{window_id}", delete(handlers::delete_window))

        .route("/{provider_id}/exceptions", post(handlers::create_provider_exception))
        .route("/{provider_id}/exceptions", get(handlers::list_provider_exceptions))
        .route("/{provider_id}/exceptions/{exception_id}", delete(handlers::delete_provider_exception))

        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}

/// Routes mounted under `/services`: the bookable service catalog.
pub fn service_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", post(handlers::create_service))
        .route("/", get(handlers::list_services))
        .route("/{service_id}", get(handlers::get_service))
        .route("/{service_id}", patch(handlers::update_service))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
