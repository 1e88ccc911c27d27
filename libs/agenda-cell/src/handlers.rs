use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AddProviderRequest, CreateExceptionRequest, CreateScheduleRequest, CreateServiceRequest,
    CreateWindowRequest, ExceptionScope, UpdateScheduleRequest, UpdateServiceRequest,
};
use crate::services::{
    resolver::AvailabilityResolver, schedule::ScheduleService, windows::WindowService,
};

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub provider_id: Uuid,
    pub service_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

// ==============================================================================
// SCHEDULE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_schedule(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    // Only owners and admins manage schedule configuration
    if !matches!(user.role.as_deref(), Some("owner") | Some("admin")) {
        return Err(AppError::Auth(
            "Only administrators can create schedules".to_string(),
        ));
    }

    let schedule_service = ScheduleService::new(&state);

    let schedule = schedule_service
        .create_schedule(organization_id, request, token)
        .await?;

    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn list_schedules(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    let schedule_service = ScheduleService::new(&state);

    let schedules = schedule_service
        .list_schedules(organization_id, token)
        .await?;

    Ok(Json(json!({
        "schedules": schedules,
        "total": schedules.len()
    })))
}

#[axum::debug_handler]
pub async fn get_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(schedule_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    let schedule_service = ScheduleService::new(&state);

    let schedule = schedule_service
        .get_schedule(organization_id, schedule_id, token)
        .await?;

    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn update_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(schedule_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    if !matches!(user.role.as_deref(), Some("owner") | Some("admin")) {
        return Err(AppError::Auth(
            "Only administrators can update schedules".to_string(),
        ));
    }

    let schedule_service = ScheduleService::new(&state);

    let schedule = schedule_service
        .update_schedule(organization_id, schedule_id, request, token)
        .await?;

    Ok(Json(json!(schedule)))
}

// ==============================================================================
// AVAILABILITY RESOLUTION
// ==============================================================================

#[axum::debug_handler]
pub async fn list_availability(
    State(state): State<Arc<AppConfig>>,
    Path(schedule_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    let resolver = AvailabilityResolver::new(&state);

    let availability = resolver
        .list_availability(
            organization_id,
            schedule_id,
            query.provider_id,
            query.service_id,
            query.from,
            query.to,
            token,
        )
        .await?;

    Ok(Json(json!({
        "availability": availability,
        "total": availability.slots.len()
    })))
}

// ==============================================================================
// PROVIDER MEMBERSHIP HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn add_provider(
    State(state): State<Arc<AppConfig>>,
    Path(schedule_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<AddProviderRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    if !matches!(user.role.as_deref(), Some("owner") | Some("admin")) {
        return Err(AppError::Auth(
            "Only administrators can add providers".to_string(),
        ));
    }

    let schedule_service = ScheduleService::new(&state);

    let provider = schedule_service
        .add_provider(organization_id, schedule_id, request, token)
        .await?;

    Ok(Json(json!(provider)))
}

#[axum::debug_handler]
pub async fn list_providers(
    State(state): State<Arc<AppConfig>>,
    Path(schedule_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    let schedule_service = ScheduleService::new(&state);

    let providers = schedule_service
        .list_providers(organization_id, schedule_id, token)
        .await?;

    Ok(Json(json!({
        "providers": providers,
        "total": providers.len()
    })))
}

#[axum::debug_handler]
pub async fn remove_provider(
    State(state): State<Arc<AppConfig>>,
    Path((schedule_id, provider_id)): Path<(Uuid, Uuid)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    if !matches!(user.role.as_deref(), Some("owner") | Some("admin")) {
        return Err(AppError::Auth(
            "Only administrators can remove providers".to_string(),
        ));
    }

    let schedule_service = ScheduleService::new(&state);

    schedule_service
        .remove_provider(organization_id, schedule_id, provider_id, token)
        .await?;

    Ok(Json(json!({ "success": true })))
}

// ==============================================================================
// AVAILABILITY WINDOW HANDLERS (Provider Configuration)
// ==============================================================================

#[axum::debug_handler]
pub async fn create_window(
    State(state): State<Arc<AppConfig>>,
    Path(provider_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateWindowRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    if !matches!(user.role.as_deref(), Some("owner") | Some("admin")) {
        return Err(AppError::Auth(
            "Only administrators can configure availability".to_string(),
        ));
    }

    let window_service = WindowService::new(&state);

    let window = window_service
        .create_window(organization_id, provider_id, request, token)
        .await?;

    Ok(Json(json!(window)))
}

#[axum::debug_handler]
pub async fn list_windows(
    State(state): State<Arc<AppConfig>>,
    Path(provider_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    let window_service = WindowService::new(&state);

    let windows = window_service
        .list_windows(organization_id, provider_id, token)
        .await?;

    Ok(Json(json!({
        "windows": windows,
        "total": windows.len()
    })))
}

#[axum::debug_handler]
pub async fn delete_window(
    State(state): State<Arc<AppConfig>>,
    Path((provider_id, window_id)): Path<(Uuid, Uuid)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    if !matches!(user.role.as_deref(), Some("owner") | Some("admin")) {
        return Err(AppError::Auth(
            "Only administrators can configure availability".to_string(),
        ));
    }

    let window_service = WindowService::new(&state);

    window_service
        .delete_window(organization_id, provider_id, window_id, token)
        .await?;

    Ok(Json(json!({ "success": true })))
}

// ==============================================================================
// EXCEPTION HANDLERS (Provider- and Schedule-Scoped)
// ==============================================================================

#[axum::debug_handler]
pub async fn create_provider_exception(
    State(state): State<Arc<AppConfig>>,
    Path(provider_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateExceptionRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    if !matches!(user.role.as_deref(), Some("owner") | Some("admin")) {
        return Err(AppError::Auth(
            "Only administrators can configure availability".to_string(),
        ));
    }

    let window_service = WindowService::new(&state);

    let exception = window_service
        .create_exception(
            organization_id,
            ExceptionScope::Provider(provider_id),
            request,
            token,
        )
        .await?;

    Ok(Json(json!(exception)))
}

#[axum::debug_handler]
pub async fn list_provider_exceptions(
    State(state): State<Arc<AppConfig>>,
    Path(provider_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    let window_service = WindowService::new(&state);

    let exceptions = window_service
        .list_exceptions(
            organization_id,
            ExceptionScope::Provider(provider_id),
            token,
        )
        .await?;

    Ok(Json(json!({
        "exceptions": exceptions,
        "total": exceptions.len()
    })))
}

#[axum::debug_handler]
pub async fn delete_provider_exception(
    State(state): State<Arc<AppConfig>>,
    Path((_provider_id, exception_id)): Path<(Uuid, Uuid)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    if !matches!(user.role.as_deref(), Some("owner") | Some("admin")) {
        return Err(AppError::Auth(
            "Only administrators can configure availability".to_string(),
        ));
    }

    let window_service = WindowService::new(&state);

    window_service
        .delete_exception(organization_id, exception_id, token)
        .await?;

    Ok(Json(json!({ "success": true })))
}

#[axum::debug_handler]
pub async fn create_schedule_exception(
    State(state): State<Arc<AppConfig>>,
    Path(schedule_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateExceptionRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    if !matches!(user.role.as_deref(), Some("owner") | Some("admin")) {
        return Err(AppError::Auth(
            "Only administrators can configure availability".to_string(),
        ));
    }

    let window_service = WindowService::new(&state);

    let exception = window_service
        .create_exception(
            organization_id,
            ExceptionScope::Schedule(schedule_id),
            request,
            token,
        )
        .await?;

    Ok(Json(json!(exception)))
}

#[axum::debug_handler]
pub async fn list_schedule_exceptions(
    State(state): State<Arc<AppConfig>>,
    Path(schedule_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    let window_service = WindowService::new(&state);

    let exceptions = window_service
        .list_exceptions(
            organization_id,
            ExceptionScope::Schedule(schedule_id),
            token,
        )
        .await?;

    Ok(Json(json!({
        "exceptions": exceptions,
        "total": exceptions.len()
    })))
}

// ==============================================================================
// SERVICE CATALOG HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_service(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    if !matches!(user.role.as_deref(), Some("owner") | Some("admin")) {
        return Err(AppError::Auth(
            "Only administrators can manage services".to_string(),
        ));
    }

    let schedule_service = ScheduleService::new(&state);

    let service = schedule_service
        .create_service(organization_id, request, token)
        .await?;

    Ok(Json(json!(service)))
}

#[axum::debug_handler]
pub async fn list_services(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    let schedule_service = ScheduleService::new(&state);

    let services = schedule_service.list_services(organization_id, token).await?;

    Ok(Json(json!({
        "services": services,
        "total": services.len()
    })))
}

#[axum::debug_handler]
pub async fn get_service(
    State(state): State<Arc<AppConfig>>,
    Path(service_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    let schedule_service = ScheduleService::new(&state);

    let service = schedule_service
        .get_service(organization_id, service_id, token)
        .await?;

    Ok(Json(json!(service)))
}

#[axum::debug_handler]
pub async fn update_service(
    State(state): State<Arc<AppConfig>>,
    Path(service_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateServiceRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    if !matches!(user.role.as_deref(), Some("owner") | Some("admin")) {
        return Err(AppError::Auth(
            "Only administrators can manage services".to_string(),
        ));
    }

    let schedule_service = ScheduleService::new(&state);

    let service = schedule_service
        .update_service(organization_id, service_id, request, token)
        .await?;

    Ok(Json(json!(service)))
}
