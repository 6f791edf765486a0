use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::services::assignment;
use shared_database::{PharmacyStore, StoreError};
use shared_models::directory::{
    Appointment, AppointmentStatus, NewAppointment, NewNotification, Party, Slot,
};

use crate::models::{AppointmentError, BookAppointmentRequest, DirectBookingRequest};
use crate::services::lifecycle;

const EMERGENCY_REASON: &str = "Emergency Consultation";
const DIRECT_REASON: &str = "Doctor initiated consultation";

/// The appointment scheduler: validates booking requests, drives doctor
/// assignment, persists the appointment and fans out notifications.
pub struct SchedulerService {
    store: Arc<dyn PharmacyStore>,
}

impl SchedulerService {
    pub fn new(store: Arc<dyn PharmacyStore>) -> Self {
        Self { store }
    }

    /// Patient self-service emergency booking.
    ///
    /// Validation runs in a fixed order (missing fields, emergency policy,
    /// past slot) before any storage read; the first failure wins. Doctor
    /// assignment is greedy first-fit, retried against the next candidate
    /// whenever the store reports the slot was taken underneath us.
    pub async fn book_emergency(
        &self,
        patient_id: Uuid,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let (date, time) = match (request.date, request.time) {
            (Some(date), Some(time)) => (date, time),
            _ => return Err(AppointmentError::MissingFields("Date and time are required")),
        };

        if !request.is_emergency {
            return Err(AppointmentError::EmergencyOnly);
        }

        let slot = Slot { date, time };
        if slot.instant() < Utc::now() {
            return Err(AppointmentError::PastSlot);
        }

        let doctors = self.store.list_doctors().await?;
        if doctors.is_empty() {
            return Err(AppointmentError::NoDoctorsRegistered);
        }

        let busy = self.store.doctors_booked_at(slot).await?;
        let reason = request
            .reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| EMERGENCY_REASON.to_string());

        for doctor in assignment::slot_candidates(&doctors, &busy) {
            let new = NewAppointment {
                patient_id,
                doctor_id: doctor.id,
                slot,
                reason: reason.clone(),
                is_emergency: true,
                status: AppointmentStatus::Scheduled,
            };

            match self.store.insert_appointment(new).await {
                Ok(appointment) => {
                    info!(
                        "Emergency appointment {} booked for patient {} with doctor {}",
                        appointment.id, patient_id, doctor.id
                    );
                    self.notify(
                        Party::Doctor(doctor.id),
                        format!("New EMERGENCY appointment booked for {}", slot),
                        Some(appointment.id),
                    )
                    .await;
                    return Ok(appointment);
                }
                Err(StoreError::SlotTaken) => {
                    debug!(
                        "Doctor {} lost the race for {}, trying next candidate",
                        doctor.id, slot
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppointmentError::SlotUnavailable)
    }

    /// Clinician booking for a named patient. The clinician is the assigned
    /// doctor, so the conflict search is skipped - the store still refuses a
    /// double booking. Created `pending` until the clinician confirms.
    pub async fn book_for_patient(
        &self,
        doctor_id: Uuid,
        request: DirectBookingRequest,
    ) -> Result<Appointment, AppointmentError> {
        let (patient_code, date, time) = match (request.patient_id, request.date, request.time) {
            (Some(code), Some(date), Some(time)) => (code, date, time),
            _ => {
                return Err(AppointmentError::MissingFields(
                    "Please provide Patient ID, Date, and Time",
                ))
            }
        };

        let slot = Slot { date, time };
        if slot.instant() < Utc::now() {
            return Err(AppointmentError::PastSlot);
        }

        let patient = self
            .store
            .find_patient_by_code(&patient_code)
            .await?
            .ok_or(AppointmentError::PatientNotFound)?;

        let doctor = self
            .store
            .get_doctor(doctor_id)
            .await
            .map_err(|e| AppointmentError::Storage(format!("doctor record missing: {}", e)))?;

        let new = NewAppointment {
            patient_id: patient.id,
            doctor_id,
            slot,
            reason: request
                .reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DIRECT_REASON.to_string()),
            is_emergency: false,
            status: AppointmentStatus::Pending,
        };

        let appointment = self.store.insert_appointment(new).await?;

        info!(
            "Appointment {} created by doctor {} for patient {}",
            appointment.id, doctor_id, patient.id
        );
        self.notify(
            Party::Patient(patient.id),
            format!(
                "{} has scheduled an appointment with you on {}.",
                doctor.display_name(),
                slot
            ),
            Some(appointment.id),
        )
        .await;

        Ok(appointment)
    }

    /// Cancel an appointment the caller owns (as patient or assigned
    /// doctor). Unknown ids, other people's appointments and repeat
    /// cancellations all read as not-found.
    pub async fn cancel(&self, caller: Party, id: Uuid) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .store
            .transition_appointment(caller, id, lifecycle::cancellable(), AppointmentStatus::Cancelled)
            .await?;

        let (recipient, message) = match caller {
            Party::Patient(_) => (
                Party::Doctor(appointment.doctor_id),
                format!("Appointment on {} was cancelled by the patient.", appointment.slot()),
            ),
            Party::Doctor(_) => (
                Party::Patient(appointment.patient_id),
                format!("Your appointment on {} has been cancelled.", appointment.slot()),
            ),
        };
        self.notify(recipient, message, Some(appointment.id)).await;

        Ok(appointment)
    }

    /// Clinician confirms a pending appointment.
    pub async fn approve(
        &self,
        doctor_id: Uuid,
        id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .store
            .transition_appointment(
                Party::Doctor(doctor_id),
                id,
                lifecycle::awaiting_decision(),
                AppointmentStatus::Scheduled,
            )
            .await?;

        self.notify(
            Party::Patient(appointment.patient_id),
            format!("Your appointment on {} has been confirmed.", appointment.slot()),
            Some(appointment.id),
        )
        .await;

        Ok(appointment)
    }

    /// Clinician declines a pending appointment.
    pub async fn reject(
        &self,
        doctor_id: Uuid,
        id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .store
            .transition_appointment(
                Party::Doctor(doctor_id),
                id,
                lifecycle::awaiting_decision(),
                AppointmentStatus::Cancelled,
            )
            .await?;

        self.notify(
            Party::Patient(appointment.patient_id),
            format!(
                "Your appointment on {} has been DECLINED by the doctor.",
                appointment.slot()
            ),
            Some(appointment.id),
        )
        .await;

        Ok(appointment)
    }

    pub async fn list_for(&self, party: Party) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self.store.appointments_for(party).await?)
    }

    pub async fn get_for(&self, party: Party, id: Uuid) -> Result<Appointment, AppointmentError> {
        Ok(self.store.get_appointment_for(party, id).await?)
    }

    /// Notification writes are fire-and-forget: a failed write is logged and
    /// never surfaces as a booking failure.
    async fn notify(&self, recipient: Party, message: String, appointment_id: Option<Uuid>) {
        let new = NewNotification {
            recipient,
            message,
            appointment_id,
        };
        if let Err(e) = self.store.insert_notification(new).await {
            warn!("Notification write failed (ignored): {}", e);
        }
    }
}
