use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::PostgrestClient;

use crate::models::{
    AgendaError, AvailabilityResponse, AvailabilityWindow, BookedSpan, Provider, Schedule,
    ScheduleException, Service, SlotStart,
};
use crate::services::timewindow::{self, TimeInterval};

/// 0 = Sunday through 6 = Saturday, matching the `day_of_week` column on
/// availability windows.
pub fn weekday_index(date: NaiveDate) -> i32 {
    match date.weekday() {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

/// Interval math for one day over already-fetched rows: merge the day's
/// recurring windows, then carve out exceptions and booked appointments.
/// A whole-day exception empties the day before any merging happens.
pub fn free_intervals(
    windows: &[AvailabilityWindow],
    exceptions: &[ScheduleException],
    booked: &[BookedSpan],
) -> Vec<TimeInterval> {
    if windows.is_empty() {
        return Vec::new();
    }
    if exceptions.iter().any(|exception| exception.is_whole_day()) {
        return Vec::new();
    }

    let open = timewindow::normalize(windows.iter().map(|window| window.interval()).collect());

    let cuts: Vec<TimeInterval> = exceptions
        .iter()
        .filter_map(|exception| exception.interval())
        .collect();
    let open = timewindow::subtract(&open, &cuts);

    let taken: Vec<TimeInterval> = booked
        .iter()
        .map(|span| TimeInterval {
            start: span.start_time,
            end: span.end_time,
        })
        .collect();
    timewindow::subtract(&open, &taken)
}

/// Expands free intervals into concrete bookable starts for a date.
pub fn slot_starts(free: &[TimeInterval], date: NaiveDate, duration_minutes: i32) -> Vec<SlotStart> {
    timewindow::enumerate_starts(free, duration_minutes)
        .into_iter()
        .map(|start| SlotStart {
            date,
            start_time: start,
            end_time: start + Duration::minutes(duration_minutes as i64),
        })
        .collect()
}

/// Read path for bookable capacity. Works entirely on wall-clock times in
/// the schedule's own timezone; callers render them, they never convert.
pub struct AvailabilityResolver {
    postgrest: Arc<PostgrestClient>,
    max_range_days: i64,
}

impl AvailabilityResolver {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(
            Arc::new(PostgrestClient::new(config)),
            config.availability_max_range_days,
        )
    }

    /// Shares an existing PostgREST client, so the booking write path can
    /// re-check capacity through the same connection pool.
    pub fn with_client(postgrest: Arc<PostgrestClient>, max_range_days: i64) -> Self {
        Self {
            postgrest,
            max_range_days,
        }
    }

    /// Computes every bookable start for a provider and service across a
    /// date range. Two identical calls against unchanged data return the
    /// same ordered list.
    pub async fn list_availability(
        &self,
        organization_id: Uuid,
        schedule_id: Uuid,
        provider_id: Uuid,
        service_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        auth_token: &str,
    ) -> Result<AvailabilityResponse, AgendaError> {
        debug!(
            "Resolving availability for provider {} from {} to {}",
            provider_id, from, to
        );

        // Step 1: Validate the requested range
        if from > to {
            return Err(AgendaError::Validation(
                "'from' date must be on or before 'to' date".to_string(),
            ));
        }
        let requested_days = (to - from).num_days() + 1;
        if requested_days > self.max_range_days {
            return Err(AgendaError::RangeTooLarge {
                requested_days,
                max_days: self.max_range_days,
            });
        }

        // Step 2: Resolve the calendar objects, all scoped to the caller's organization
        let schedule = self
            .fetch_schedule(organization_id, schedule_id, auth_token)
            .await?;
        let provider = self
            .fetch_provider(organization_id, provider_id, auth_token)
            .await?;
        if provider.schedule_id != schedule.id {
            return Err(AgendaError::NotFound(
                "Provider is not part of this schedule".to_string(),
            ));
        }
        let service = self
            .fetch_service(organization_id, service_id, auth_token)
            .await?;

        // Step 3: A disabled schedule offers no capacity at all
        if !schedule.is_active {
            debug!("Schedule {} is disabled, reporting no capacity", schedule.id);
            return Ok(AvailabilityResponse {
                schedule_id: schedule.id,
                provider_id: provider.id,
                service_id: service.id,
                timezone: schedule.timezone,
                duration_minutes: service.duration_minutes,
                slots: Vec::new(),
            });
        }

        // Step 4: Fetch everything the range needs in three queries
        let windows = self
            .fetch_windows(organization_id, provider.id, auth_token)
            .await?;
        let exceptions = self
            .fetch_exceptions(organization_id, &provider, from, to, auth_token)
            .await?;
        let booked = self
            .fetch_booked_spans(organization_id, provider.id, from, to, auth_token)
            .await?;

        // Step 5: Walk the range day by day
        let mut slots = Vec::new();
        for offset in 0..requested_days {
            let date = from + Duration::days(offset);
            let day = weekday_index(date);

            let day_windows: Vec<AvailabilityWindow> = windows
                .iter()
                .filter(|window| window.day_of_week == day)
                .cloned()
                .collect();
            let day_exceptions: Vec<ScheduleException> = exceptions
                .iter()
                .filter(|exception| exception.date == date)
                .cloned()
                .collect();
            let day_booked: Vec<BookedSpan> = booked
                .iter()
                .filter(|span| span.date == date)
                .cloned()
                .collect();

            let free = free_intervals(&day_windows, &day_exceptions, &day_booked);
            slots.extend(slot_starts(&free, date, service.duration_minutes));
        }

        debug!(
            "Found {} bookable starts for provider {}",
            slots.len(),
            provider.id
        );

        Ok(AvailabilityResponse {
            schedule_id: schedule.id,
            provider_id: provider.id,
            service_id: service.id,
            timezone: schedule.timezone,
            duration_minutes: service.duration_minutes,
            slots,
        })
    }

    /// Free intervals for a single provider and date, used by the booking
    /// write path to re-check a slot right before inserting.
    pub async fn free_intervals_for_day(
        &self,
        organization_id: Uuid,
        provider: &Provider,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<TimeInterval>, AgendaError> {
        let windows = self
            .fetch_windows(organization_id, provider.id, auth_token)
            .await?;
        let exceptions = self
            .fetch_exceptions(organization_id, provider, date, date, auth_token)
            .await?;
        let booked = self
            .fetch_booked_spans(organization_id, provider.id, date, date, auth_token)
            .await?;

        let day = weekday_index(date);
        let day_windows: Vec<AvailabilityWindow> = windows
            .into_iter()
            .filter(|window| window.day_of_week == day)
            .collect();

        Ok(free_intervals(&day_windows, &exceptions, &booked))
    }

    pub async fn fetch_schedule(
        &self,
        organization_id: Uuid,
        schedule_id: Uuid,
        auth_token: &str,
    ) -> Result<Schedule, AgendaError> {
        let path = format!(
            "/rest/v1/schedules?id=eq.{}&organization_id=eq.{}",
            schedule_id, organization_id
        );

        let result: Vec<Value> = self
            .postgrest
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AgendaError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AgendaError::NotFound("Schedule not found".to_string()));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AgendaError::Database(format!("Failed to parse schedule: {}", e)))
    }

    pub async fn fetch_provider(
        &self,
        organization_id: Uuid,
        provider_id: Uuid,
        auth_token: &str,
    ) -> Result<Provider, AgendaError> {
        let path = format!(
            "/rest/v1/providers?id=eq.{}&organization_id=eq.{}",
            provider_id, organization_id
        );

        let result: Vec<Value> = self
            .postgrest
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AgendaError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AgendaError::NotFound("Provider not found".to_string()));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AgendaError::Database(format!("Failed to parse provider: {}", e)))
    }

    pub async fn fetch_service(
        &self,
        organization_id: Uuid,
        service_id: Uuid,
        auth_token: &str,
    ) -> Result<Service, AgendaError> {
        let path = format!(
            "/rest/v1/services?id=eq.{}&organization_id=eq.{}",
            service_id, organization_id
        );

        let result: Vec<Value> = self
            .postgrest
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AgendaError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AgendaError::NotFound("Service not found".to_string()));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AgendaError::Database(format!("Failed to parse service: {}", e)))
    }

    async fn fetch_windows(
        &self,
        organization_id: Uuid,
        provider_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<AvailabilityWindow>, AgendaError> {
        let path = format!(
            "/rest/v1/availability_windows?provider_id=eq.{}&organization_id=eq.{}&order=day_of_week.asc,start_time.asc",
            provider_id, organization_id
        );

        let result: Vec<Value> = self
            .postgrest
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AgendaError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| {
                    AgendaError::Database(format!("Failed to parse availability window: {}", e))
                })
            })
            .collect()
    }

    /// Exceptions apply whether they target the provider directly or the
    /// whole schedule the provider sits on.
    async fn fetch_exceptions(
        &self,
        organization_id: Uuid,
        provider: &Provider,
        from: NaiveDate,
        to: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<ScheduleException>, AgendaError> {
        let path = format!(
            "/rest/v1/schedule_exceptions?organization_id=eq.{}&or=(provider_id.eq.{},schedule_id.eq.{})&date=gte.{}&date=lte.{}&order=date.asc",
            organization_id, provider.id, provider.schedule_id, from, to
        );

        let result: Vec<Value> = self
            .postgrest
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AgendaError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| {
                    AgendaError::Database(format!("Failed to parse schedule exception: {}", e))
                })
            })
            .collect()
    }

    /// Only scheduled and confirmed appointments hold capacity. Terminal
    /// statuses release their slot the moment the row is updated.
    async fn fetch_booked_spans(
        &self,
        organization_id: Uuid,
        provider_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<BookedSpan>, AgendaError> {
        let path = format!(
            "/rest/v1/appointments?provider_id=eq.{}&organization_id=eq.{}&date=gte.{}&date=lte.{}&status=in.(scheduled,confirmed)&order=date.asc,start_time.asc",
            provider_id, organization_id, from, to
        );

        let result: Vec<Value> = self
            .postgrest
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AgendaError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| {
                    AgendaError::Database(format!("Failed to parse booked appointment: {}", e))
                })
            })
            .collect()
    }
}
