use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::auth::{ActorRole, AuthUser};
use shared_models::error::AppError;
use shared_utils::jwt::issue_token;

use crate::models::{
    EnrollmentError, LoginIdentity, LoginRequest, ProfileError, RegisterClinicianRequest,
    RegisterPatientRequest,
};
use crate::services::enrollment::EnrollmentService;
use crate::services::profile::ProfileService;

fn map_enrollment_err(e: EnrollmentError) -> AppError {
    match e {
        EnrollmentError::MissingFields
        | EnrollmentError::DuplicatePatientId
        | EnrollmentError::DuplicateStaffId
        | EnrollmentError::InvalidRole => AppError::BadRequest(e.to_string()),
        EnrollmentError::InvalidCredentials => AppError::Auth(e.to_string()),
        EnrollmentError::Hashing => AppError::Internal(e.to_string()),
        EnrollmentError::Storage(msg) => AppError::Database(msg),
    }
}

fn map_profile_err(e: ProfileError) -> AppError {
    match e {
        ProfileError::NotFound => AppError::NotFound(e.to_string()),
        ProfileError::Storage(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn register_patient(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = EnrollmentService::new(Arc::clone(&state.store));
    let patient = service
        .register_patient(request)
        .await
        .map_err(map_enrollment_err)?;

    let token = issue_token(patient.id, ActorRole::Patient, &state.config.jwt_secret)
        .map_err(AppError::Internal)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Patient registration successful",
            "user": {
                "id": patient.id,
                "patientId": patient.patient_code,
                "firstName": patient.first_name,
                "lastName": patient.last_name,
                "role": "patient"
            },
            "token": token
        })),
    ))
}

#[axum::debug_handler]
pub async fn register_clinician(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterClinicianRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = EnrollmentService::new(Arc::clone(&state.store));
    let doctor = service
        .register_clinician(request)
        .await
        .map_err(map_enrollment_err)?;

    let token = issue_token(doctor.id, doctor.role, &state.config.jwt_secret)
        .map_err(AppError::Internal)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Clinician registration successful",
            "user": {
                "id": doctor.id,
                "staffId": doctor.staff_code,
                "firstName": doctor.first_name,
                "lastName": doctor.last_name,
                "role": doctor.role
            },
            "token": token
        })),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let service = EnrollmentService::new(Arc::clone(&state.store));
    let identity = service.login(request).await.map_err(map_enrollment_err)?;

    let (user, token) = match identity {
        LoginIdentity::Patient(patient) => {
            let token = issue_token(patient.id, ActorRole::Patient, &state.config.jwt_secret)
                .map_err(AppError::Internal)?;
            (
                json!({
                    "id": patient.id,
                    "name": patient.full_name(),
                    "role": "patient",
                    "patientId": patient.patient_code
                }),
                token,
            )
        }
        LoginIdentity::Clinician(doctor) => {
            let token = issue_token(doctor.id, doctor.role, &state.config.jwt_secret)
                .map_err(AppError::Internal)?;
            (
                json!({
                    "id": doctor.id,
                    "name": format!("{} {}", doctor.first_name, doctor.last_name),
                    "role": doctor.role,
                    "staffId": doctor.staff_code
                }),
                token,
            )
        }
    };

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "user": user,
        "token": token
    })))
}

/// Profile fetch. For patients this is where lazy doctor assignment happens.
#[axum::debug_handler]
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(Arc::clone(&state.store));

    if user.role == ActorRole::Patient {
        let profile = service
            .patient_profile(user.id)
            .await
            .map_err(map_profile_err)?;
        let patient = profile.patient;

        return Ok(Json(json!({
            "success": true,
            "user": {
                "id": patient.id,
                "name": patient.full_name(),
                "firstName": patient.first_name,
                "lastName": patient.last_name,
                "email": patient.email,
                "phone": patient.phone,
                "role": "patient",
                "assignedDoctor": profile.assigned_doctor.map(|d| d.display_name()),
                "patientId": patient.patient_code
            }
        })));
    }

    let doctor = service
        .clinician_profile(user.id)
        .await
        .map_err(map_profile_err)?;

    Ok(Json(json!({
        "success": true,
        "user": {
            "id": doctor.id,
            "name": format!("{} {}", doctor.first_name, doctor.last_name),
            "firstName": doctor.first_name,
            "lastName": doctor.last_name,
            "email": doctor.email,
            "phone": doctor.phone,
            "role": doctor.role,
            "staffId": doctor.staff_code
        }
    })))
}
