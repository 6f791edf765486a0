use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use shared_database::StoreError;

pub use shared_models::directory::{Appointment, AppointmentStatus, Slot};

/// Patient self-service booking. Only emergency bookings are accepted on
/// this path; everything else goes through a clinician.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "flexible_time")]
    pub time: Option<NaiveTime>,
    pub reason: Option<String>,
    #[serde(default)]
    pub is_emergency: bool,
}

/// Clinician booking on behalf of a named patient.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectBookingRequest {
    pub patient_id: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "flexible_time")]
    pub time: Option<NaiveTime>,
    pub reason: Option<String>,
}

// Browser time inputs send "HH:MM"; accept that alongside "HH:MM:SS".
fn flexible_time<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(raw) => NaiveTime::parse_from_str(&raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("{0}")]
    MissingFields(&'static str),

    #[error("Only emergency appointments can be booked at this time.")]
    EmergencyOnly,

    #[error("Cannot book appointment in the past")]
    PastSlot,

    #[error("No doctors available in the system.")]
    NoDoctorsRegistered,

    #[error("No doctors available at this specific time. Please choose another slot.")]
    SlotUnavailable,

    #[error("Patient ID not found")]
    PatientNotFound,

    #[error("Appointment not found")]
    NotFound,

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for AppointmentError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AppointmentError::NotFound,
            StoreError::SlotTaken => AppointmentError::SlotUnavailable,
            other => AppointmentError::Storage(other.to_string()),
        }
    }
}
