use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_models::directory::{
    Appointment, AppointmentStatus, Doctor, DoctorLoad, NewAppointment, NewDoctor,
    NewNotification, NewPatient, Notification, Party, Patient, Slot,
};

use crate::store::{DirectoryStore, NotificationSink, StoreError};

#[derive(Default)]
struct Inner {
    doctors: Vec<Doctor>,
    patients: Vec<Patient>,
    appointments: Vec<Appointment>,
    notifications: Vec<Notification>,
}

/// In-memory backend. Used as the development fallback and by tests.
///
/// Every mutation runs under a single write lock, so the check-then-insert
/// inside `insert_appointment` is atomic and the slot invariant holds under
/// concurrent bookings.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn slot_conflicts(appointment: &Appointment, doctor_id: Uuid, slot: Slot) -> bool {
    appointment.doctor_id == doctor_id
        && appointment.slot() == slot
        && appointment.status != AppointmentStatus::Cancelled
}

fn owned_by(appointment: &Appointment, party: Party) -> bool {
    match party {
        Party::Patient(id) => appointment.patient_id == id,
        Party::Doctor(id) => appointment.doctor_id == id,
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn insert_doctor(&self, new: NewDoctor) -> Result<Doctor, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.doctors.iter().any(|d| d.staff_code == new.staff_code) {
            return Err(StoreError::Duplicate("staff_code"));
        }
        let doctor = Doctor {
            id: Uuid::new_v4(),
            staff_code: new.staff_code,
            first_name: new.first_name,
            last_name: new.last_name,
            role: new.role,
            password_hash: new.password_hash,
            phone: new.phone,
            email: new.email,
            created_at: Utc::now(),
        };
        inner.doctors.push(doctor.clone());
        Ok(doctor)
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError> {
        let inner = self.inner.read().await;
        let mut doctors = inner.doctors.clone();
        doctors.sort_by_key(|d| d.id);
        Ok(doctors)
    }

    async fn get_doctor(&self, id: Uuid) -> Result<Doctor, StoreError> {
        let inner = self.inner.read().await;
        inner
            .doctors
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_doctor_by_staff_code(&self, code: &str) -> Result<Option<Doctor>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.doctors.iter().find(|d| d.staff_code == code).cloned())
    }

    async fn insert_patient(&self, new: NewPatient) -> Result<Patient, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.patients.iter().any(|p| p.patient_code == new.patient_code) {
            return Err(StoreError::Duplicate("patient_code"));
        }
        let patient = Patient {
            id: Uuid::new_v4(),
            patient_code: new.patient_code,
            first_name: new.first_name,
            last_name: new.last_name,
            password_hash: new.password_hash,
            phone: new.phone,
            email: new.email,
            assigned_doctor_id: new.assigned_doctor_id,
            created_at: Utc::now(),
        };
        inner.patients.push(patient.clone());
        Ok(patient)
    }

    async fn get_patient(&self, id: Uuid) -> Result<Patient, StoreError> {
        let inner = self.inner.read().await;
        inner
            .patients
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_patient_by_code(&self, code: &str) -> Result<Option<Patient>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.patients.iter().find(|p| p.patient_code == code).cloned())
    }

    async fn doctor_loads(&self) -> Result<Vec<DoctorLoad>, StoreError> {
        let inner = self.inner.read().await;
        let mut loads: Vec<DoctorLoad> = inner
            .doctors
            .iter()
            .map(|doctor| DoctorLoad {
                patient_count: inner
                    .patients
                    .iter()
                    .filter(|p| p.assigned_doctor_id == Some(doctor.id))
                    .count() as i64,
                doctor: doctor.clone(),
            })
            .collect();
        loads.sort_by_key(|l| l.doctor.id);
        Ok(loads)
    }

    async fn assign_doctor_if_unassigned(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let patient = inner
            .patients
            .iter_mut()
            .find(|p| p.id == patient_id)
            .ok_or(StoreError::NotFound)?;
        if patient.assigned_doctor_id.is_some() {
            return Ok(false);
        }
        patient.assigned_doctor_id = Some(doctor_id);
        Ok(true)
    }

    async fn insert_appointment(&self, new: NewAppointment) -> Result<Appointment, StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .appointments
            .iter()
            .any(|a| slot_conflicts(a, new.doctor_id, new.slot))
        {
            return Err(StoreError::SlotTaken);
        }
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: new.patient_id,
            doctor_id: new.doctor_id,
            date: new.slot.date,
            time: new.slot.time,
            reason: new.reason,
            is_emergency: new.is_emergency,
            status: new.status,
            created_at: Utc::now(),
        };
        inner.appointments.push(appointment.clone());
        Ok(appointment)
    }

    async fn get_appointment(&self, id: Uuid) -> Result<Appointment, StoreError> {
        let inner = self.inner.read().await;
        inner
            .appointments
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_appointment_for(
        &self,
        party: Party,
        id: Uuid,
    ) -> Result<Appointment, StoreError> {
        let inner = self.inner.read().await;
        inner
            .appointments
            .iter()
            .find(|a| a.id == id && owned_by(a, party))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn appointments_for(&self, party: Party) -> Result<Vec<Appointment>, StoreError> {
        let inner = self.inner.read().await;
        let mut appointments: Vec<Appointment> = inner
            .appointments
            .iter()
            .filter(|a| owned_by(a, party))
            .cloned()
            .collect();
        appointments.sort_by(|a, b| (b.date, b.time).cmp(&(a.date, a.time)));
        Ok(appointments)
    }

    async fn doctors_booked_at(&self, slot: Slot) -> Result<HashSet<Uuid>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .appointments
            .iter()
            .filter(|a| a.slot() == slot && a.status != AppointmentStatus::Cancelled)
            .map(|a| a.doctor_id)
            .collect())
    }

    async fn transition_appointment(
        &self,
        party: Party,
        id: Uuid,
        expected: &[AppointmentStatus],
        next: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        let mut inner = self.inner.write().await;
        let appointment = inner
            .appointments
            .iter_mut()
            .find(|a| a.id == id && owned_by(a, party) && expected.contains(&a.status))
            .ok_or(StoreError::NotFound)?;
        appointment.status = next;
        Ok(appointment.clone())
    }
}

#[async_trait]
impl NotificationSink for MemoryStore {
    async fn insert_notification(
        &self,
        new: NewNotification,
    ) -> Result<Notification, StoreError> {
        let mut inner = self.inner.write().await;
        let (patient_id, doctor_id) = match new.recipient {
            Party::Patient(id) => (Some(id), None),
            Party::Doctor(id) => (None, Some(id)),
        };
        let notification = Notification {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            message: new.message,
            is_read: false,
            appointment_id: new.appointment_id,
            created_at: Utc::now(),
        };
        inner.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn notifications_for(&self, party: Party) -> Result<Vec<Notification>, StoreError> {
        let inner = self.inner.read().await;
        let mut notifications: Vec<Notification> = inner
            .notifications
            .iter()
            .filter(|n| n.belongs_to(party))
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn get_notification(
        &self,
        party: Party,
        id: Uuid,
    ) -> Result<Notification, StoreError> {
        let inner = self.inner.read().await;
        inner
            .notifications
            .iter()
            .find(|n| n.id == id && n.belongs_to(party))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn mark_notifications_read(
        &self,
        party: Party,
        id: Option<Uuid>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        for notification in inner
            .notifications
            .iter_mut()
            .filter(|n| n.belongs_to(party) && id.map_or(true, |id| n.id == id))
        {
            notification.is_read = true;
        }
        Ok(())
    }

    async fn delete_notification(&self, party: Party, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.notifications.len();
        inner
            .notifications
            .retain(|n| !(n.id == id && n.belongs_to(party)));
        if inner.notifications.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
