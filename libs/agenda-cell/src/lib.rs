pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

// Re-export all models and services for external use
pub use models::*;
pub use services::*;

// Specifically re-export the types the booking side works with
pub use models::{
    AgendaError, AvailabilityResponse, AvailabilityWindow, BookedSpan, Provider, Schedule,
    ScheduleException, Service, SlotStart,
};
