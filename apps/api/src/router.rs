use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use agenda_cell::router::{provider_routes, schedule_routes, service_routes};
use booking_cell::handlers::BookingState;
use booking_cell::router::appointment_routes;
use booking_cell::services::locks::SlotLockRegistry;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    // One registry for the whole process so every booking request for the
    // same provider and day contends on the same lock
    let booking_state = BookingState {
        config: state.clone(),
        slot_locks: SlotLockRegistry::new(),
    };

    Router::new()
        .route("/", get(|| async { "Atendo scheduling API is running!" }))
        .nest("/schedules", schedule_routes(state.clone()))
        .nest("/providers", provider_routes(state.clone()))
        .nest("/services", service_routes(state.clone()))
        .nest("/appointments", appointment_routes(booking_state))
}
