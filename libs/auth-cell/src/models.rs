use serde::Deserialize;
use thiserror::Error;

use shared_database::StoreError;
use shared_models::auth::ActorRole;
use shared_models::directory::{Doctor, Patient};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPatientRequest {
    pub first_name: String,
    pub last_name: String,
    pub patient_id: String,
    pub password: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterClinicianRequest {
    pub first_name: String,
    pub last_name: String,
    pub staff_id: String,
    pub password: String,
    pub role: Option<ActorRole>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_id: String,
    pub password: String,
    pub role: ActorRole,
}

/// Who logged in, with their full directory record for the response body.
#[derive(Debug, Clone)]
pub enum LoginIdentity {
    Patient(Patient),
    Clinician(Doctor),
}

/// A patient profile enriched with the assigned doctor, resolved lazily if
/// the patient was registered while the directory was empty.
#[derive(Debug, Clone)]
pub struct PatientProfile {
    pub patient: Patient,
    pub assigned_doctor: Option<Doctor>,
}

#[derive(Debug, Error)]
pub enum EnrollmentError {
    #[error("Please fill in all required fields")]
    MissingFields,

    #[error("Patient ID already registered")]
    DuplicatePatientId,

    #[error("Staff ID already registered")]
    DuplicateStaffId,

    #[error("Clinician registration requires a clinician role")]
    InvalidRole,

    #[error("Invalid ID or password")]
    InvalidCredentials,

    #[error("Password hashing failed")]
    Hashing,

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for EnrollmentError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate("patient_code") => EnrollmentError::DuplicatePatientId,
            StoreError::Duplicate("staff_code") => EnrollmentError::DuplicateStaffId,
            other => EnrollmentError::Storage(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("User not found")]
    NotFound,

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for ProfileError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ProfileError::NotFound,
            other => ProfileError::Storage(other.to_string()),
        }
    }
}
