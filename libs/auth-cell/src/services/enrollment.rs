use std::sync::Arc;

use tracing::{info, warn};

use doctor_cell::services::assignment;
use shared_database::PharmacyStore;
use shared_models::auth::ActorRole;
use shared_models::directory::{Doctor, NewDoctor, NewPatient, Patient};
use shared_utils::password::PasswordService;

use crate::models::{
    EnrollmentError, LoginIdentity, LoginRequest, RegisterClinicianRequest,
    RegisterPatientRequest,
};

pub struct EnrollmentService {
    store: Arc<dyn PharmacyStore>,
}

impl EnrollmentService {
    pub fn new(store: Arc<dyn PharmacyStore>) -> Self {
        Self { store }
    }

    /// Register a patient and assign them the least-loaded doctor. An empty
    /// directory (or a failed load read) registers the patient unassigned;
    /// the profile fetch will assign lazily once a doctor exists.
    pub async fn register_patient(
        &self,
        request: RegisterPatientRequest,
    ) -> Result<Patient, EnrollmentError> {
        if request.first_name.trim().is_empty()
            || request.last_name.trim().is_empty()
            || request.patient_id.trim().is_empty()
            || request.password.is_empty()
        {
            return Err(EnrollmentError::MissingFields);
        }

        if self
            .store
            .find_patient_by_code(&request.patient_id)
            .await?
            .is_some()
        {
            return Err(EnrollmentError::DuplicatePatientId);
        }

        let password_hash = PasswordService::hash_password(&request.password)
            .map_err(|_| EnrollmentError::Hashing)?;

        let assigned_doctor_id = match self.store.doctor_loads().await {
            Ok(loads) => assignment::least_loaded(&loads).map(|d| d.id),
            Err(e) => {
                warn!("Doctor assignment skipped at registration: {}", e);
                None
            }
        };

        let patient = self
            .store
            .insert_patient(NewPatient {
                patient_code: request.patient_id,
                first_name: request.first_name,
                last_name: request.last_name,
                password_hash,
                phone: request.phone,
                email: request.email,
                assigned_doctor_id,
            })
            .await?;

        info!(
            "Patient {} registered (assigned doctor: {:?})",
            patient.id, patient.assigned_doctor_id
        );
        Ok(patient)
    }

    pub async fn register_clinician(
        &self,
        request: RegisterClinicianRequest,
    ) -> Result<Doctor, EnrollmentError> {
        if request.first_name.trim().is_empty()
            || request.last_name.trim().is_empty()
            || request.staff_id.trim().is_empty()
            || request.password.is_empty()
        {
            return Err(EnrollmentError::MissingFields);
        }

        let role = request.role.unwrap_or(ActorRole::Pharmacist);
        if !role.can_handle_appointments() {
            return Err(EnrollmentError::InvalidRole);
        }

        if self
            .store
            .find_doctor_by_staff_code(&request.staff_id)
            .await?
            .is_some()
        {
            return Err(EnrollmentError::DuplicateStaffId);
        }

        let password_hash = PasswordService::hash_password(&request.password)
            .map_err(|_| EnrollmentError::Hashing)?;

        let doctor = self
            .store
            .insert_doctor(NewDoctor {
                staff_code: request.staff_id,
                first_name: request.first_name,
                last_name: request.last_name,
                role,
                password_hash,
                phone: request.phone,
                email: request.email,
            })
            .await?;

        info!("Clinician {} registered with role {}", doctor.id, doctor.role);
        Ok(doctor)
    }

    /// Verify credentials. Unknown ids and wrong passwords are deliberately
    /// the same error.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginIdentity, EnrollmentError> {
        if request.user_id.trim().is_empty() || request.password.is_empty() {
            return Err(EnrollmentError::MissingFields);
        }

        match request.role {
            ActorRole::Patient => {
                let patient = self
                    .store
                    .find_patient_by_code(&request.user_id)
                    .await?
                    .ok_or(EnrollmentError::InvalidCredentials)?;
                let ok = PasswordService::verify_password(&request.password, &patient.password_hash)
                    .map_err(|_| EnrollmentError::Hashing)?;
                if !ok {
                    return Err(EnrollmentError::InvalidCredentials);
                }
                Ok(LoginIdentity::Patient(patient))
            }
            ActorRole::Doctor | ActorRole::Pharmacist => {
                let doctor = self
                    .store
                    .find_doctor_by_staff_code(&request.user_id)
                    .await?
                    .ok_or(EnrollmentError::InvalidCredentials)?;
                let ok = PasswordService::verify_password(&request.password, &doctor.password_hash)
                    .map_err(|_| EnrollmentError::Hashing)?;
                if !ok {
                    return Err(EnrollmentError::InvalidCredentials);
                }
                Ok(LoginIdentity::Clinician(doctor))
            }
        }
    }
}
