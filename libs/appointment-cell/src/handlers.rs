use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::{ActorRole, AuthUser};
use shared_models::error::AppError;
use shared_utils::extractor::require_clinician;

use crate::models::{AppointmentError, BookAppointmentRequest, DirectBookingRequest};
use crate::services::booking::SchedulerService;

fn map_err(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::MissingFields(_)
        | AppointmentError::EmergencyOnly
        | AppointmentError::PastSlot => AppError::BadRequest(e.to_string()),
        AppointmentError::NoDoctorsRegistered => AppError::Unavailable(e.to_string()),
        AppointmentError::SlotUnavailable => AppError::Conflict(e.to_string()),
        AppointmentError::PatientNotFound | AppointmentError::NotFound => {
            AppError::NotFound(e.to_string())
        }
        AppointmentError::Storage(msg) => AppError::Database(msg),
    }
}

/// Patient books an emergency appointment; a doctor is auto-assigned.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if user.role != ActorRole::Patient {
        return Err(AppError::Auth("Only patients can use self-service booking".to_string()));
    }

    let scheduler = SchedulerService::new(Arc::clone(&state.store));
    let appointment = scheduler
        .book_emergency(user.id, request)
        .await
        .map_err(map_err)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Emergency appointment booked successfully. A doctor has been assigned.",
            "appointment": appointment
        })),
    ))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let scheduler = SchedulerService::new(Arc::clone(&state.store));
    let appointments = scheduler.list_for(user.party()).await.map_err(map_err)?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let scheduler = SchedulerService::new(Arc::clone(&state.store));
    let appointment = scheduler
        .get_for(user.party(), appointment_id)
        .await
        .map_err(map_err)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

/// Works for both sides: patients cancel their own bookings, clinicians
/// cancel appointments assigned to them.
#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let scheduler = SchedulerService::new(Arc::clone(&state.store));
    scheduler
        .cancel(user.party(), appointment_id)
        .await
        .map_err(map_err)?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment cancelled"
    })))
}

/// Clinician books directly for a named patient. No auto-assignment: the
/// caller is the assigned doctor.
#[axum::debug_handler]
pub async fn book_for_patient(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<DirectBookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_clinician(&user)?;

    let scheduler = SchedulerService::new(Arc::clone(&state.store));
    let appointment = scheduler
        .book_for_patient(user.id, request)
        .await
        .map_err(map_err)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Appointment booked and patient notified",
            "appointment": appointment
        })),
    ))
}

#[axum::debug_handler]
pub async fn approve_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    require_clinician(&user)?;

    let scheduler = SchedulerService::new(Arc::clone(&state.store));
    scheduler
        .approve(user.id, appointment_id)
        .await
        .map_err(map_err)?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment confirmed"
    })))
}

#[axum::debug_handler]
pub async fn reject_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    require_clinician(&user)?;

    let scheduler = SchedulerService::new(Arc::clone(&state.store));
    scheduler
        .reject(user.id, appointment_id)
        .await
        .map_err(map_err)?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment rejected"
    })))
}
