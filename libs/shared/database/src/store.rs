use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use shared_models::directory::{
    Appointment, AppointmentStatus, Doctor, DoctorLoad, NewAppointment, NewDoctor,
    NewNotification, NewPatient, Notification, Party, Patient, Slot,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("duplicate {0}")]
    Duplicate(&'static str),

    #[error("slot already booked for this doctor")]
    SlotTaken,

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Read/write access to the directory of doctors, patients and appointments.
///
/// Ordering contract: `list_doctors` and `doctor_loads` return doctors in
/// ascending id order, so doctor-selection strategies are deterministic.
///
/// Consistency contract: `insert_appointment` atomically enforces the
/// at-most-one non-cancelled appointment per (doctor, date, time) invariant
/// and fails with [`StoreError::SlotTaken`] when it would be violated. The
/// caller is expected to retry with another doctor.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn insert_doctor(&self, new: NewDoctor) -> Result<Doctor, StoreError>;
    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError>;
    async fn get_doctor(&self, id: Uuid) -> Result<Doctor, StoreError>;
    async fn find_doctor_by_staff_code(&self, code: &str) -> Result<Option<Doctor>, StoreError>;

    async fn insert_patient(&self, new: NewPatient) -> Result<Patient, StoreError>;
    async fn get_patient(&self, id: Uuid) -> Result<Patient, StoreError>;
    async fn find_patient_by_code(&self, code: &str) -> Result<Option<Patient>, StoreError>;

    /// Doctors with their current assigned-patient counts, ascending id order.
    async fn doctor_loads(&self) -> Result<Vec<DoctorLoad>, StoreError>;

    /// Compare-and-swap doctor assignment: writes only if the patient is
    /// still unassigned. Returns whether the write happened.
    async fn assign_doctor_if_unassigned(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
    ) -> Result<bool, StoreError>;

    async fn insert_appointment(&self, new: NewAppointment) -> Result<Appointment, StoreError>;
    async fn get_appointment(&self, id: Uuid) -> Result<Appointment, StoreError>;

    /// The appointment, scoped to its owning patient or assigned doctor.
    /// Anything outside the caller's ownership reads as not-found.
    async fn get_appointment_for(&self, party: Party, id: Uuid)
        -> Result<Appointment, StoreError>;

    /// All appointments for one party, newest slot first.
    async fn appointments_for(&self, party: Party) -> Result<Vec<Appointment>, StoreError>;

    /// Ids of doctors holding a non-cancelled appointment at the slot.
    async fn doctors_booked_at(&self, slot: Slot) -> Result<HashSet<Uuid>, StoreError>;

    /// Guarded status transition: applies only when the appointment belongs
    /// to `party` and its current status is one of `expected`; otherwise
    /// not-found. This is what makes repeated cancellation a no-op.
    async fn transition_appointment(
        &self,
        party: Party,
        id: Uuid,
        expected: &[AppointmentStatus],
        next: AppointmentStatus,
    ) -> Result<Appointment, StoreError>;
}

/// Write/read access to the notification inbox.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn insert_notification(&self, new: NewNotification)
        -> Result<Notification, StoreError>;

    /// All notifications for one party, newest first.
    async fn notifications_for(&self, party: Party) -> Result<Vec<Notification>, StoreError>;

    async fn get_notification(&self, party: Party, id: Uuid)
        -> Result<Notification, StoreError>;

    /// Mark one (or, with `None`, all) of the party's notifications read.
    async fn mark_notifications_read(
        &self,
        party: Party,
        id: Option<Uuid>,
    ) -> Result<(), StoreError>;

    async fn delete_notification(&self, party: Party, id: Uuid) -> Result<(), StoreError>;
}
