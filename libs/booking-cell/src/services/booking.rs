use std::sync::Arc;

use chrono::{NaiveTime, Timelike, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use agenda_cell::services::resolver::AvailabilityResolver;
use agenda_cell::services::timewindow::TimeInterval;
use shared_config::AppConfig;
use shared_database::postgrest::representation_headers;
use shared_database::PostgrestClient;

use crate::models::{
    Appointment, AppointmentSearchFilters, AppointmentStatus, BookingError,
    CreateAppointmentRequest, TransitionEvent,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::locks::SlotLockRegistry;

/// The frozen end time for a booking. `None` when the span would run past
/// midnight, which no window can contain.
fn appointment_end_time(start: NaiveTime, duration_minutes: i32) -> Option<NaiveTime> {
    if duration_minutes <= 0 {
        return None;
    }
    let end_seconds = start.num_seconds_from_midnight() + duration_minutes as u32 * 60;
    NaiveTime::from_num_seconds_from_midnight_opt(end_seconds, 0)
}

/// Write side of the calendar: creating appointments and moving them through
/// their lifecycle. The only component that mutates appointment rows.
pub struct BookingService {
    postgrest: Arc<PostgrestClient>,
    resolver: AvailabilityResolver,
    lifecycle: AppointmentLifecycleService,
    slot_locks: SlotLockRegistry,
}

impl BookingService {
    pub fn new(config: &AppConfig, slot_locks: SlotLockRegistry) -> Self {
        let postgrest = Arc::new(PostgrestClient::new(config));
        Self {
            resolver: AvailabilityResolver::with_client(
                postgrest.clone(),
                config.availability_max_range_days,
            ),
            postgrest,
            lifecycle: AppointmentLifecycleService::new(),
            slot_locks,
        }
    }

    /// Books a slot. The whole re-validate + insert sequence runs under the
    /// `(provider, date)` lock, so of two customers racing for the same slot
    /// the second one loses with `SlotConflict` instead of double-booking.
    pub async fn create_appointment(
        &self,
        organization_id: Uuid,
        request: CreateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        debug!(
            "Creating appointment for provider {} on {} at {}",
            request.provider_id, request.date, request.start_time
        );

        // Step 1: Serialize with other bookings for this provider and day
        let lock = self.slot_locks.lock_for(request.provider_id, request.date);
        let _guard = lock.lock().await;

        // Step 2: Resolve the calendar objects, all scoped to the organization
        let provider = self
            .resolver
            .fetch_provider(organization_id, request.provider_id, auth_token)
            .await?;
        let schedule = self
            .resolver
            .fetch_schedule(organization_id, provider.schedule_id, auth_token)
            .await?;
        if !schedule.is_active {
            return Err(BookingError::Validation(
                "Schedule is disabled and not accepting bookings".to_string(),
            ));
        }
        let service = self
            .resolver
            .fetch_service(organization_id, request.service_id, auth_token)
            .await?;

        // Step 3: Freeze the end time from the service duration
        let end_time = appointment_end_time(request.start_time, service.duration_minutes)
            .ok_or(BookingError::SlotConflict)?;
        let requested = TimeInterval {
            start: request.start_time,
            end: end_time,
        };

        // Step 4: Re-check capacity under the lock. The interval must sit
        // entirely inside a currently free interval.
        let free = self
            .resolver
            .free_intervals_for_day(organization_id, &provider, request.date, auth_token)
            .await?;
        if !free.iter().any(|interval| interval.contains(&requested)) {
            debug!(
                "Slot {} - {} on {} is no longer free for provider {}",
                requested.start, requested.end, request.date, provider.id
            );
            return Err(BookingError::SlotConflict);
        }

        // Step 5: Insert as scheduled
        let now = Utc::now().to_rfc3339();
        let appointment_data = json!({
            "organization_id": organization_id,
            "schedule_id": provider.schedule_id,
            "provider_id": provider.id,
            "customer_id": request.customer_id,
            "service_id": service.id,
            "date": request.date,
            "start_time": request.start_time,
            "end_time": end_time,
            "status": AppointmentStatus::Scheduled,
            "has_videoconference": request.has_videoconference.unwrap_or(false),
            "chat_id": request.chat_id,
            "notes": request.notes,
            "created_at": now,
            "updated_at": now,
        });

        let result: Vec<Value> = self
            .postgrest
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(appointment_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(BookingError::Database(
                "Failed to create appointment".to_string(),
            ));
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone())
            .map_err(|e| BookingError::Database(format!("Failed to parse appointment: {}", e)))?;

        info!(
            "Appointment {} created for provider {} on {} at {}",
            appointment.id, appointment.provider_id, appointment.date, appointment.start_time
        );
        Ok(appointment)
    }

    /// Moves an appointment through the state machine. The write only lands
    /// while the row still has the status the transition was validated
    /// against, so of two racing transitions the second is rejected against
    /// the fresh state. Canceling or no-showing frees the slot implicitly:
    /// the resolver only counts scheduled and confirmed rows.
    pub async fn transition_appointment(
        &self,
        organization_id: Uuid,
        appointment_id: Uuid,
        to_status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<(Appointment, TransitionEvent), BookingError> {
        // Step 1: Load the current row
        let appointment = self
            .get_appointment(organization_id, appointment_id, auth_token)
            .await?;
        let from = appointment.status;

        // Step 2: Enforce the transition matrix
        self.lifecycle.validate_status_transition(&from, &to_status)?;

        // Step 3: Persist the new status, guarded on the status we validated.
        // A concurrent transition that landed first leaves nothing to match.
        let update_data = json!({
            "status": to_status,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let path = format!(
            "/rest/v1/appointments?id=eq.{}&organization_id=eq.{}&status=eq.{}",
            appointment_id, organization_id, from
        );

        let result: Vec<Value> = self
            .postgrest
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(update_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        if result.is_empty() {
            // Lost a race with another transition; re-read and report the
            // row's current state.
            let current = self
                .get_appointment(organization_id, appointment_id, auth_token)
                .await?;
            return Err(BookingError::InvalidTransition {
                from: current.status,
                to: to_status,
            });
        }

        let updated: Appointment = serde_json::from_value(result[0].clone())
            .map_err(|e| BookingError::Database(format!("Failed to parse appointment: {}", e)))?;

        let event = TransitionEvent {
            appointment_id: updated.id,
            from,
            to: updated.status,
            occurred_at: updated.updated_at,
        };

        info!(
            "Appointment {} transitioned {} -> {}",
            updated.id, event.from, event.to
        );
        Ok((updated, event))
    }

    pub async fn get_appointment(
        &self,
        organization_id: Uuid,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&organization_id=eq.{}",
            appointment_id, organization_id
        );

        let result: Vec<Value> = self
            .postgrest
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(BookingError::NotFound("Appointment not found".to_string()));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| BookingError::Database(format!("Failed to parse appointment: {}", e)))
    }

    pub async fn search_appointments(
        &self,
        organization_id: Uuid,
        filters: AppointmentSearchFilters,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, BookingError> {
        let mut query_parts = vec![format!("organization_id=eq.{}", organization_id)];

        if let Some(provider_id) = filters.provider_id {
            query_parts.push(format!("provider_id=eq.{}", provider_id));
        }
        if let Some(customer_id) = filters.customer_id {
            query_parts.push(format!("customer_id=eq.{}", customer_id));
        }
        if let Some(status) = filters.status {
            query_parts.push(format!("status=eq.{}", status));
        }
        if let Some(from_date) = filters.from_date {
            query_parts.push(format!("date=gte.{}", from_date));
        }
        if let Some(to_date) = filters.to_date {
            query_parts.push(format!("date=lte.{}", to_date));
        }

        query_parts.push("order=date.asc,start_time.asc".to_string());
        query_parts.push(format!("limit={}", filters.limit.unwrap_or(50)));
        query_parts.push(format!("offset={}", filters.offset.unwrap_or(0)));

        let path = format!("/rest/v1/appointments?{}", query_parts.join("&"));

        let result: Vec<Value> = self
            .postgrest
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| {
                    BookingError::Database(format!("Failed to parse appointment: {}", e))
                })
            })
            .collect()
    }

    /// Legal next statuses for an appointment, for UIs that grey out actions.
    pub async fn get_valid_transitions(
        &self,
        organization_id: Uuid,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<AppointmentStatus>, BookingError> {
        let appointment = self
            .get_appointment(organization_id, appointment_id, auth_token)
            .await?;

        Ok(self.lifecycle.get_valid_transitions(&appointment.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_end_time_is_start_plus_duration() {
        assert_eq!(appointment_end_time(time(8, 30), 30), Some(time(9, 0)));
        assert_eq!(appointment_end_time(time(9, 0), 45), Some(time(9, 45)));
    }

    #[test]
    fn test_end_time_rejects_midnight_overflow() {
        assert_eq!(appointment_end_time(time(23, 45), 30), None);
        assert_eq!(appointment_end_time(time(23, 30), 30), None);
    }

    #[test]
    fn test_end_time_rejects_non_positive_duration() {
        assert_eq!(appointment_end_time(time(10, 0), 0), None);
        assert_eq!(appointment_end_time(time(10, 0), -30), None);
    }
}
