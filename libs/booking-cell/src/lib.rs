pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

// Re-export all models and services for external use
pub use models::*;
pub use services::*;

// Specifically re-export the types callers wire into state and tests
pub use handlers::BookingState;
pub use models::{
    Appointment, AppointmentStatus, BookingError, CreateAppointmentRequest, TransitionEvent,
    TransitionRequest,
};
