use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::services::timewindow::TimeInterval;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub color: String,
    pub timezone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub schedule_id: Uuid,
    pub profile_id: Uuid,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub provider_id: Uuid,
    pub day_of_week: i32, // 0 = Sunday, 1 = Monday, etc.
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityWindow {
    pub fn interval(&self) -> TimeInterval {
        TimeInterval {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

/// Date-bound blackout. Scoped to one provider or to a whole schedule;
/// always removes capacity, never adds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleException {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub schedule_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ScheduleException {
    /// The blocked sub-interval for partial exceptions. A row without both
    /// bounds blocks the entire day.
    pub fn interval(&self) -> Option<TimeInterval> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(TimeInterval { start, end }),
            _ => None,
        }
    }

    pub fn is_whole_day(&self) -> bool {
        self.interval().is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Appointment span already holding capacity on a date; the resolver only
/// needs these three columns out of the appointment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookedSpan {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotStart {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub schedule_id: Uuid,
    pub provider_id: Uuid,
    pub service_id: Uuid,
    pub timezone: String,
    pub duration_minutes: i32,
    pub slots: Vec<SlotStart>,
}

/// Which calendar object an exception blocks out.
#[derive(Debug, Clone, Copy)]
pub enum ExceptionScope {
    Provider(Uuid),
    Schedule(Uuid),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub name: String,
    pub color: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub timezone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddProviderRequest {
    pub profile_id: Uuid,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServiceRequest {
    pub title: String,
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateServiceRequest {
    pub title: Option<String>,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWindowRequest {
    pub day_of_week: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExceptionRequest {
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum AgendaError {
    #[error("Invalid availability window: {0}")]
    InvalidWindow(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Requested range of {requested_days} days exceeds the {max_days} day limit")]
    RangeTooLarge { requested_days: i64, max_days: i64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<AgendaError> for AppError {
    fn from(err: AgendaError) -> Self {
        match &err {
            AgendaError::InvalidWindow(_) => AppError::BadRequest(err.to_string()),
            AgendaError::NotFound(_) => AppError::NotFound(err.to_string()),
            AgendaError::RangeTooLarge { .. } => AppError::BadRequest(err.to_string()),
            AgendaError::Validation(_) => AppError::BadRequest(err.to_string()),
            AgendaError::Database(_) => AppError::Database(err.to_string()),
        }
    }
}
