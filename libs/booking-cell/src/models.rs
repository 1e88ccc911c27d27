use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agenda_cell::models::AgendaError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Canceled,
    NoShow,
}

impl AppointmentStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed
                | AppointmentStatus::Canceled
                | AppointmentStatus::NoShow
        )
    }

    /// Scheduled and confirmed appointments hold their slot; terminal ones
    /// release it the moment the row is updated.
    pub fn blocks_slot(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Canceled => "canceled",
            AppointmentStatus::NoShow => "no_show",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub schedule_id: Uuid,
    pub provider_id: Uuid,
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    // Frozen at booking from the service duration; later edits to the
    // service never resize existing appointments.
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub has_videoconference: bool,
    pub chat_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub provider_id: Uuid,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub notes: Option<String>,
    pub chat_id: Option<Uuid>,
    pub has_videoconference: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub to_status: AppointmentStatus,
}

/// Emitted alongside every status change so calendars and notifiers can
/// react without re-reading the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub appointment_id: Uuid,
    pub from: AppointmentStatus,
    pub to: AppointmentStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentSearchFilters {
    pub provider_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    NotFound(String),

    #[error("Requested time is no longer available")]
    SlotConflict,

    #[error("Cannot transition appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<AgendaError> for BookingError {
    fn from(err: AgendaError) -> Self {
        match err {
            AgendaError::NotFound(msg) => BookingError::NotFound(msg),
            AgendaError::InvalidWindow(msg) => BookingError::Validation(msg),
            AgendaError::Validation(msg) => BookingError::Validation(msg),
            AgendaError::Database(msg) => BookingError::Database(msg),
            other @ AgendaError::RangeTooLarge { .. } => {
                BookingError::Validation(other.to_string())
            }
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match &err {
            BookingError::NotFound(_) => AppError::NotFound(err.to_string()),
            BookingError::SlotConflict => AppError::Conflict(err.to_string()),
            BookingError::InvalidTransition { .. } => AppError::Conflict(err.to_string()),
            BookingError::Validation(_) => AppError::BadRequest(err.to_string()),
            BookingError::Database(_) => AppError::Database(err.to_string()),
        }
    }
}
