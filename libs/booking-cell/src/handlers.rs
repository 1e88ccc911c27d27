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
    AppointmentSearchFilters, AppointmentStatus, CreateAppointmentRequest, TransitionRequest,
};
use crate::services::booking::BookingService;
use crate::services::locks::SlotLockRegistry;

/// Shared state for the booking routes. The lock registry must outlive any
/// single request, so it lives here instead of inside the service.
#[derive(Clone)]
pub struct BookingState {
    pub config: Arc<AppConfig>,
    pub slot_locks: SlotLockRegistry,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentSearchQuery {
    pub provider_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<BookingState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    let booking_service = BookingService::new(&state.config, state.slot_locks.clone());

    let appointment = booking_service
        .create_appointment(organization_id, request, token)
        .await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn search_appointments(
    State(state): State<BookingState>,
    Query(query): Query<AppointmentSearchQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    let booking_service = BookingService::new(&state.config, state.slot_locks.clone());

    let filters = AppointmentSearchFilters {
        provider_id: query.provider_id,
        customer_id: query.customer_id,
        status: query.status,
        from_date: query.from_date,
        to_date: query.to_date,
        limit: query.limit,
        offset: query.offset,
    };

    let appointments = booking_service
        .search_appointments(organization_id, filters, token)
        .await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<BookingState>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    let booking_service = BookingService::new(&state.config, state.slot_locks.clone());

    let appointment = booking_service
        .get_appointment(organization_id, appointment_id, token)
        .await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn transition_appointment(
    State(state): State<BookingState>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    let booking_service = BookingService::new(&state.config, state.slot_locks.clone());

    let (appointment, event) = booking_service
        .transition_appointment(organization_id, appointment_id, request.to_status, token)
        .await?;

    Ok(Json(json!({
        "appointment": appointment,
        "event": event
    })))
}

#[axum::debug_handler]
pub async fn get_transitions(
    State(state): State<BookingState>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let organization_id = user.require_organization()?;

    let booking_service = BookingService::new(&state.config, state.slot_locks.clone());

    let transitions = booking_service
        .get_valid_transitions(organization_id, appointment_id, token)
        .await?;

    Ok(Json(json!({
        "appointment_id": appointment_id,
        "valid_transitions": transitions
    })))
}
