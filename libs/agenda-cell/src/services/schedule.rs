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
    AddProviderRequest, AgendaError, CreateScheduleRequest, CreateServiceRequest, Provider,
    Schedule, Service, UpdateScheduleRequest, UpdateServiceRequest,
};

/// CRUD over the calendar reference data: schedules, the providers attached
/// to them, and the bookable service catalog.
pub struct ScheduleService {
    postgrest: Arc<PostgrestClient>,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            postgrest: Arc::new(PostgrestClient::new(config)),
        }
    }

    pub async fn create_schedule(
        &self,
        organization_id: Uuid,
        request: CreateScheduleRequest,
        auth_token: &str,
    ) -> Result<Schedule, AgendaError> {
        if request.name.trim().is_empty() {
            return Err(AgendaError::Validation(
                "Schedule name is required".to_string(),
            ));
        }

        let now = Utc::now().to_rfc3339();
        let schedule_data = json!({
            "organization_id": organization_id,
            "name": request.name,
            "color": request.color.unwrap_or_else(|| "#4f46e5".to_string()),
            "timezone": request.timezone.unwrap_or_else(|| "UTC".to_string()),
            "is_active": true,
            "created_at": now,
            "updated_at": now,
        });

        let result: Vec<Value> = self
            .postgrest
            .request_with_headers(
                Method::POST,
                "/rest/v1/schedules",
                Some(auth_token),
                Some(schedule_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| AgendaError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AgendaError::Database(
                "Failed to create schedule".to_string(),
            ));
        }

        let schedule: Schedule = serde_json::from_value(result[0].clone())
            .map_err(|e| AgendaError::Database(format!("Failed to parse schedule: {}", e)))?;

        info!("Created schedule {} ({})", schedule.id, schedule.name);
        Ok(schedule)
    }

    pub async fn list_schedules(
        &self,
        organization_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Schedule>, AgendaError> {
        let path = format!(
            "/rest/v1/schedules?organization_id=eq.{}&order=name.asc",
            organization_id
        );

        let result: Vec<Value> = self
            .postgrest
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AgendaError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| AgendaError::Database(format!("Failed to parse schedule: {}", e)))
            })
            .collect()
    }

    pub async fn get_schedule(
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

    /// Partial update. Setting `is_active: false` soft-disables the schedule:
    /// availability reads start returning empty and new bookings are refused,
    /// while existing appointments stay untouched.
    pub async fn update_schedule(
        &self,
        organization_id: Uuid,
        schedule_id: Uuid,
        request: UpdateScheduleRequest,
        auth_token: &str,
    ) -> Result<Schedule, AgendaError> {
        let mut update_data = serde_json::Map::new();

        if let Some(name) = request.name {
            if name.trim().is_empty() {
                return Err(AgendaError::Validation(
                    "Schedule name is required".to_string(),
                ));
            }
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(color) = request.color {
            update_data.insert("color".to_string(), json!(color));
        }
        if let Some(timezone) = request.timezone {
            update_data.insert("timezone".to_string(), json!(timezone));
        }
        if let Some(is_active) = request.is_active {
            update_data.insert("is_active".to_string(), json!(is_active));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!(
            "/rest/v1/schedules?id=eq.{}&organization_id=eq.{}",
            schedule_id, organization_id
        );

        let result: Vec<Value> = self
            .postgrest
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(Value::Object(update_data)),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| AgendaError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AgendaError::NotFound("Schedule not found".to_string()));
        }

        let schedule: Schedule = serde_json::from_value(result[0].clone())
            .map_err(|e| AgendaError::Database(format!("Failed to parse schedule: {}", e)))?;

        debug!("Updated schedule {}", schedule.id);
        Ok(schedule)
    }

    pub async fn add_provider(
        &self,
        organization_id: Uuid,
        schedule_id: Uuid,
        request: AddProviderRequest,
        auth_token: &str,
    ) -> Result<Provider, AgendaError> {
        if request.display_name.trim().is_empty() {
            return Err(AgendaError::Validation(
                "Provider display name is required".to_string(),
            ));
        }

        // The schedule must exist in this organization before anything hangs off it
        self.get_schedule(organization_id, schedule_id, auth_token)
            .await?;

        let provider_data = json!({
            "organization_id": organization_id,
            "schedule_id": schedule_id,
            "profile_id": request.profile_id,
            "display_name": request.display_name,
            "created_at": Utc::now().to_rfc3339(),
        });

        let result: Vec<Value> = self
            .postgrest
            .request_with_headers(
                Method::POST,
                "/rest/v1/providers",
                Some(auth_token),
                Some(provider_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| AgendaError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AgendaError::Database(
                "Failed to add provider".to_string(),
            ));
        }

        let provider: Provider = serde_json::from_value(result[0].clone())
            .map_err(|e| AgendaError::Database(format!("Failed to parse provider: {}", e)))?;

        info!(
            "Added provider {} to schedule {}",
            provider.id, schedule_id
        );
        Ok(provider)
    }

    pub async fn list_providers(
        &self,
        organization_id: Uuid,
        schedule_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Provider>, AgendaError> {
        let path = format!(
            "/rest/v1/providers?schedule_id=eq.{}&organization_id=eq.{}&order=display_name.asc",
            schedule_id, organization_id
        );

        let result: Vec<Value> = self
            .postgrest
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AgendaError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| AgendaError::Database(format!("Failed to parse provider: {}", e)))
            })
            .collect()
    }

    pub async fn remove_provider(
        &self,
        organization_id: Uuid,
        schedule_id: Uuid,
        provider_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AgendaError> {
        let path = format!(
            "/rest/v1/providers?id=eq.{}&schedule_id=eq.{}&organization_id=eq.{}",
            provider_id, schedule_id, organization_id
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
                "Provider not found on this schedule".to_string(),
            ));
        }

        info!("Removed provider {} from schedule {}", provider_id, schedule_id);
        Ok(())
    }

    pub async fn create_service(
        &self,
        organization_id: Uuid,
        request: CreateServiceRequest,
        auth_token: &str,
    ) -> Result<Service, AgendaError> {
        if request.title.trim().is_empty() {
            return Err(AgendaError::Validation(
                "Service title is required".to_string(),
            ));
        }
        if request.duration_minutes <= 0 {
            return Err(AgendaError::Validation(
                "Service duration must be a positive number of minutes".to_string(),
            ));
        }

        let now = Utc::now().to_rfc3339();
        let service_data = json!({
            "organization_id": organization_id,
            "title": request.title,
            "duration_minutes": request.duration_minutes,
            "created_at": now,
            "updated_at": now,
        });

        let result: Vec<Value> = self
            .postgrest
            .request_with_headers(
                Method::POST,
                "/rest/v1/services",
                Some(auth_token),
                Some(service_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| AgendaError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AgendaError::Database(
                "Failed to create service".to_string(),
            ));
        }

        let service: Service = serde_json::from_value(result[0].clone())
            .map_err(|e| AgendaError::Database(format!("Failed to parse service: {}", e)))?;

        info!("Created service {} ({})", service.id, service.title);
        Ok(service)
    }

    pub async fn list_services(
        &self,
        organization_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Service>, AgendaError> {
        let path = format!(
            "/rest/v1/services?organization_id=eq.{}&order=title.asc",
            organization_id
        );

        let result: Vec<Value> = self
            .postgrest
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AgendaError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| AgendaError::Database(format!("Failed to parse service: {}", e)))
            })
            .collect()
    }

    pub async fn get_service(
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

    /// Changing the duration only affects slots computed from now on.
    /// Existing appointments keep the end time frozen at booking.
    pub async fn update_service(
        &self,
        organization_id: Uuid,
        service_id: Uuid,
        request: UpdateServiceRequest,
        auth_token: &str,
    ) -> Result<Service, AgendaError> {
        let mut update_data = serde_json::Map::new();

        if let Some(title) = request.title {
            if title.trim().is_empty() {
                return Err(AgendaError::Validation(
                    "Service title is required".to_string(),
                ));
            }
            update_data.insert("title".to_string(), json!(title));
        }
        if let Some(duration_minutes) = request.duration_minutes {
            if duration_minutes <= 0 {
                return Err(AgendaError::Validation(
                    "Service duration must be a positive number of minutes".to_string(),
                ));
            }
            update_data.insert("duration_minutes".to_string(), json!(duration_minutes));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!(
            "/rest/v1/services?id=eq.{}&organization_id=eq.{}",
            service_id, organization_id
        );

        let result: Vec<Value> = self
            .postgrest
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(Value::Object(update_data)),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| AgendaError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AgendaError::NotFound("Service not found".to_string()));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AgendaError::Database(format!("Failed to parse service: {}", e)))
    }
}
