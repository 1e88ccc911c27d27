use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::postgrest::representation_headers;
use shared_database::PostgrestClient;

use crate::models::{
    AgendaError, AvailabilityWindow, CreateExceptionRequest, CreateWindowRequest, ExceptionScope,
    ScheduleException,
};

/// Authoring side of availability: recurring weekly windows per provider and
/// date-bound exceptions per provider or schedule.
pub struct WindowService {
    postgrest: Arc<PostgrestClient>,
}

impl WindowService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            postgrest: Arc::new(PostgrestClient::new(config)),
        }
    }

    /// Overlapping windows on the same day are allowed; the resolver merges
    /// them into a union at read time.
    pub async fn create_window(
        &self,
        organization_id: Uuid,
        provider_id: Uuid,
        request: CreateWindowRequest,
        auth_token: &str,
    ) -> Result<AvailabilityWindow, AgendaError> {
        if request.day_of_week < 0 || request.day_of_week > 6 {
            return Err(AgendaError::InvalidWindow(
                "Day of week must be between 0 (Sunday) and 6 (Saturday)".to_string(),
            ));
        }
        if request.start_time >= request.end_time {
            return Err(AgendaError::InvalidWindow(
                "Start time must be before end time".to_string(),
            ));
        }

        self.ensure_provider(organization_id, provider_id, auth_token)
            .await?;

        let window_data = json!({
            "organization_id": organization_id,
            "provider_id": provider_id,
            "day_of_week": request.day_of_week,
            "start_time": request.start_time,
            "end_time": request.end_time,
            "created_at": Utc::now().to_rfc3339(),
        });

        let result: Vec<Value> = self
            .postgrest
            .request_with_headers(
                Method::POST,
                "/rest/v1/availability_windows",
                Some(auth_token),
                Some(window_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| AgendaError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AgendaError::Database(
                "Failed to create availability window".to_string(),
            ));
        }

        let window: AvailabilityWindow = serde_json::from_value(result[0].clone())
            .map_err(|e| {
                AgendaError::Database(format!("Failed to parse availability window: {}", e))
            })?;

        info!(
            "Created availability window {} for provider {} (day {})",
            window.id, provider_id, window.day_of_week
        );
        Ok(window)
    }

    pub async fn list_windows(
        &self,
        organization_id: Uuid,
        provider_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<AvailabilityWindow>, AgendaError> {
        self.ensure_provider(organization_id, provider_id, auth_token)
            .await?;

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

    pub async fn delete_window(
        &self,
        organization_id: Uuid,
        provider_id: Uuid,
        window_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AgendaError> {
        let path = format!(
            "/rest/v1/availability_windows?id=eq.{}&provider_id=eq.{}&organization_id=eq.{}",
            window_id, provider_id, organization_id
        );

        let result: Vec<Value> = self
            .postgrest
            .request_with_headers(
                Method::DELETE,
                &path,
                Some(auth_token),
                None,
                Some(representation_headers()),
            )
            .await
            .map_err(|e| AgendaError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AgendaError::NotFound(
                "Availability window not found".to_string(),
            ));
        }

        info!("Deleted availability window {}", window_id);
        Ok(())
    }

    /// Whole-day exceptions omit both times; partial-day exceptions carry
    /// both. Exceptions only remove capacity, so stacking several on one
    /// date is fine.
    pub async fn create_exception(
        &self,
        organization_id: Uuid,
        scope: ExceptionScope,
        request: CreateExceptionRequest,
        auth_token: &str,
    ) -> Result<ScheduleException, AgendaError> {
        match (request.start_time, request.end_time) {
            (None, None) => {}
            (Some(start), Some(end)) => {
                if start >= end {
                    return Err(AgendaError::InvalidWindow(
                        "Exception start time must be before end time".to_string(),
                    ));
                }
            }
            _ => {
                return Err(AgendaError::InvalidWindow(
                    "Partial-day exceptions require both start and end times".to_string(),
                ));
            }
        }

        let (provider_id, schedule_id) = match scope {
            ExceptionScope::Provider(id) => {
                self.ensure_provider(organization_id, id, auth_token).await?;
                (Some(id), None)
            }
            ExceptionScope::Schedule(id) => {
                self.ensure_schedule(organization_id, id, auth_token).await?;
                (None, Some(id))
            }
        };

        let exception_data = json!({
            "organization_id": organization_id,
            "provider_id": provider_id,
            "schedule_id": schedule_id,
            "date": request.date,
            "start_time": request.start_time,
            "end_time": request.end_time,
            "reason": request.reason,
            "created_at": Utc::now().to_rfc3339(),
        });

        let result: Vec<Value> = self
            .postgrest
            .request_with_headers(
                Method::POST,
                "/rest/v1/schedule_exceptions",
                Some(auth_token),
                Some(exception_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| AgendaError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AgendaError::Database(
                "Failed to create schedule exception".to_string(),
            ));
        }

        let exception: ScheduleException = serde_json::from_value(result[0].clone())
            .map_err(|e| {
                AgendaError::Database(format!("Failed to parse schedule exception: {}", e))
            })?;

        info!(
            "Created {} exception {} on {}",
            if exception.is_whole_day() { "whole-day" } else { "partial-day" },
            exception.id,
            exception.date
        );
        Ok(exception)
    }

    pub async fn list_exceptions(
        &self,
        organization_id: Uuid,
        scope: ExceptionScope,
        auth_token: &str,
    ) -> Result<Vec<ScheduleException>, AgendaError> {
        let path = match scope {
            ExceptionScope::Provider(id) => format!(
                "/rest/v1/schedule_exceptions?provider_id=eq.{}&organization_id=eq.{}&order=date.asc",
                id, organization_id
            ),
            ExceptionScope::Schedule(id) => format!(
                "/rest/v1/schedule_exceptions?schedule_id=eq.{}&organization_id=eq.{}&order=date.asc",
                id, organization_id
            ),
        };

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

    pub async fn delete_exception(
        &self,
        organization_id: Uuid,
        exception_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AgendaError> {
        let path = format!(
            "/rest/v1/schedule_exceptions?id=eq.{}&organization_id=eq.{}",
            exception_id, organization_id
        );

        let result: Vec<Value> = self
            .postgrest
            .request_with_headers(
                Method::DELETE,
                &path,
                Some(auth_token),
                None,
                Some(representation_headers()),
            )
            .await
            .map_err(|e| AgendaError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AgendaError::NotFound(
                "Schedule exception not found".to_string(),
            ));
        }

        info!("Deleted schedule exception {}", exception_id);
        Ok(())
    }

    async fn ensure_provider(
        &self,
        organization_id: Uuid,
        provider_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AgendaError> {
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
            debug!("Provider {} not found in organization", provider_id);
            return Err(AgendaError::NotFound("Provider not found".to_string()));
        }
        Ok(())
    }

    async fn ensure_schedule(
        &self,
        organization_id: Uuid,
        schedule_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AgendaError> {
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
            debug!("Schedule {} not found in organization", schedule_id);
            return Err(AgendaError::NotFound("Schedule not found".to_string()));
        }
        Ok(())
    }
}
