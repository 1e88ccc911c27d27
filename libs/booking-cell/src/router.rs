use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers::{self, BookingState};

/// Routes mounted under `/appointments`. Booking is open to any
/// authenticated member of the organization; the state machine and slot
/// checks do the gatekeeping.
pub fn appointment_routes(state: BookingState) -> Router {
    let protected_routes = Router::new()
        .route("/", post(handlers::create_appointment))
        .route("/", get(handlers::search_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/status", patch(handlers::transition_appointment))
        .route("/{appointment_id}/transitions", get(handlers::get_transitions))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new().merge(protected_routes).with_state(state)
}
