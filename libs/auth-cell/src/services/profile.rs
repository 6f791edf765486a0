use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use doctor_cell::services::assignment;
use shared_database::PharmacyStore;
use shared_models::directory::{Doctor, Patient};

use crate::models::{PatientProfile, ProfileError};

pub struct ProfileService {
    store: Arc<dyn PharmacyStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn PharmacyStore>) -> Self {
        Self { store }
    }

    /// Fetch a patient profile, lazily assigning a doctor if none is set.
    /// The assignment write is compare-and-swap, so concurrent profile reads
    /// assign at most once; later reads see the stored value and skip the
    /// whole branch.
    pub async fn patient_profile(&self, patient_id: Uuid) -> Result<PatientProfile, ProfileError> {
        let patient = self.store.get_patient(patient_id).await?;

        let assigned_doctor = match patient.assigned_doctor_id {
            Some(doctor_id) => self.resolve_doctor(doctor_id).await,
            None => self.ensure_assigned(&patient).await,
        };

        Ok(PatientProfile {
            patient,
            assigned_doctor,
        })
    }

    pub async fn clinician_profile(&self, doctor_id: Uuid) -> Result<Doctor, ProfileError> {
        Ok(self.store.get_doctor(doctor_id).await?)
    }

    async fn resolve_doctor(&self, doctor_id: Uuid) -> Option<Doctor> {
        match self.store.get_doctor(doctor_id).await {
            Ok(doctor) => Some(doctor),
            Err(e) => {
                warn!("Assigned doctor {} could not be resolved: {}", doctor_id, e);
                None
            }
        }
    }

    /// Read-triggered assignment. Failures are logged and leave the profile
    /// unassigned rather than failing the read.
    async fn ensure_assigned(&self, patient: &Patient) -> Option<Doctor> {
        let loads = match self.store.doctor_loads().await {
            Ok(loads) => loads,
            Err(e) => {
                warn!("Lazy doctor assignment skipped: {}", e);
                return None;
            }
        };

        let choice = assignment::least_loaded(&loads)?.clone();

        match self
            .store
            .assign_doctor_if_unassigned(patient.id, choice.id)
            .await
        {
            Ok(true) => {
                info!("Patient {} lazily assigned doctor {}", patient.id, choice.id);
                Some(choice)
            }
            Ok(false) => {
                // Lost a concurrent race; read back whoever won.
                match self.store.get_patient(patient.id).await {
                    Ok(fresh) => match fresh.assigned_doctor_id {
                        Some(doctor_id) => self.resolve_doctor(doctor_id).await,
                        None => None,
                    },
                    Err(e) => {
                        warn!("Could not re-read patient after assignment race: {}", e);
                        None
                    }
                }
            }
            Err(e) => {
                warn!("Lazy doctor assignment failed: {}", e);
                None
            }
        }
    }
}
