use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::ActorRole;

// ==============================================================================
// DIRECTORY RECORDS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub staff_code: String,
    pub first_name: String,
    pub last_name: String,
    pub role: ActorRole,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Doctor {
    pub fn display_name(&self) -> String {
        format!("Dr. {} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone)]
pub struct NewDoctor {
    pub staff_code: String,
    pub first_name: String,
    pub last_name: String,
    pub role: ActorRole,
    pub password_hash: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// A doctor together with the number of patients currently assigned to them.
/// Snapshot input for the load-balancing assignment strategy.
#[derive(Debug, Clone)]
pub struct DoctorLoad {
    pub doctor: Doctor,
    pub patient_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub patient_code: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub assigned_doctor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone)]
pub struct NewPatient {
    pub patient_code: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub assigned_doctor_id: Option<Uuid>,
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

/// A calendar position an appointment can occupy. Slot granularity is the
/// caller's business; the core only ever compares slots for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl Slot {
    /// The slot as a UTC instant, for past/future comparisons.
    pub fn instant(&self) -> DateTime<Utc> {
        self.date.and_time(self.time).and_utc()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.date, self.time.format("%H:%M"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Scheduled,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reason: String,
    pub is_emergency: bool,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn slot(&self) -> Slot {
        Slot { date: self.date, time: self.time }
    }
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub slot: Slot,
    pub reason: String,
    pub is_emergency: bool,
    pub status: AppointmentStatus,
}

// ==============================================================================
// NOTIFICATIONS
// ==============================================================================

/// One side of the doctor/patient relationship, used to scope reads and
/// ownership checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Party {
    Patient(Uuid),
    Doctor(Uuid),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub message: String,
    pub is_read: bool,
    pub appointment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn belongs_to(&self, party: Party) -> bool {
        match party {
            Party::Patient(id) => self.patient_id == Some(id),
            Party::Doctor(id) => self.doctor_id == Some(id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient: Party,
    pub message: String,
    pub appointment_id: Option<Uuid>,
}
