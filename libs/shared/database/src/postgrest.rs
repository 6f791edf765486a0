use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::directory::{
    Appointment, AppointmentStatus, Doctor, DoctorLoad, NewAppointment, NewDoctor,
    NewNotification, NewPatient, Notification, Party, Patient, Slot,
};

use crate::store::{DirectoryStore, NotificationSink, StoreError};

/// PostgREST-backed store. The slot invariant is delegated to a partial
/// unique index on appointments (doctor_id, date, time) where status is not
/// cancelled; the server answers 409 when it would be violated.
pub struct PostgrestStore {
    client: Client,
    base_url: String,
    service_key: String,
}

impl PostgrestStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.database_url.clone(),
            service_key: config.database_service_key.clone(),
        }
    }

    fn headers(&self, representation: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(&self.service_key).unwrap());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.service_key)).unwrap(),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if representation {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }
        headers
    }

    async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        representation: bool,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Store request to {}", url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.headers(representation));
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Store error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                404 => StoreError::NotFound,
                409 => StoreError::Duplicate("unique constraint"),
                _ => StoreError::Backend(format!("{}: {}", status, error_text)),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Backend(format!("response parse failure: {}", e)))
    }

    async fn single<T>(&self, path: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let mut rows: Vec<T> = self.request(Method::GET, path, None, false).await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(rows.remove(0))
    }
}

fn party_filter(party: Party) -> String {
    match party {
        Party::Patient(id) => format!("patient_id=eq.{}", id),
        Party::Doctor(id) => format!("doctor_id=eq.{}", id),
    }
}

fn date_param(slot: &Slot) -> String {
    slot.date.format("%Y-%m-%d").to_string()
}

fn time_param(slot: &Slot) -> String {
    slot.time.format("%H:%M:%S").to_string()
}

#[async_trait]
impl DirectoryStore for PostgrestStore {
    async fn insert_doctor(&self, new: NewDoctor) -> Result<Doctor, StoreError> {
        let body = json!({
            "staff_code": new.staff_code,
            "first_name": new.first_name,
            "last_name": new.last_name,
            "role": new.role,
            "password_hash": new.password_hash,
            "phone": new.phone,
            "email": new.email,
        });
        let mut rows: Vec<Doctor> = self
            .request(Method::POST, "/rest/v1/doctors", Some(body), true)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => StoreError::Duplicate("staff_code"),
                other => other,
            })?;
        if rows.is_empty() {
            return Err(StoreError::Backend("insert returned no row".to_string()));
        }
        Ok(rows.remove(0))
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError> {
        self.request(Method::GET, "/rest/v1/doctors?order=id.asc", None, false)
            .await
    }

    async fn get_doctor(&self, id: Uuid) -> Result<Doctor, StoreError> {
        self.single(&format!("/rest/v1/doctors?id=eq.{}", id)).await
    }

    async fn find_doctor_by_staff_code(&self, code: &str) -> Result<Option<Doctor>, StoreError> {
        let path = format!(
            "/rest/v1/doctors?staff_code=eq.{}",
            urlencoding::encode(code)
        );
        let rows: Vec<Doctor> = self.request(Method::GET, &path, None, false).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_patient(&self, new: NewPatient) -> Result<Patient, StoreError> {
        let body = json!({
            "patient_code": new.patient_code,
            "first_name": new.first_name,
            "last_name": new.last_name,
            "password_hash": new.password_hash,
            "phone": new.phone,
            "email": new.email,
            "assigned_doctor_id": new.assigned_doctor_id,
        });
        let mut rows: Vec<Patient> = self
            .request(Method::POST, "/rest/v1/patients", Some(body), true)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => StoreError::Duplicate("patient_code"),
                other => other,
            })?;
        if rows.is_empty() {
            return Err(StoreError::Backend("insert returned no row".to_string()));
        }
        Ok(rows.remove(0))
    }

    async fn get_patient(&self, id: Uuid) -> Result<Patient, StoreError> {
        self.single(&format!("/rest/v1/patients?id=eq.{}", id)).await
    }

    async fn find_patient_by_code(&self, code: &str) -> Result<Option<Patient>, StoreError> {
        let path = format!(
            "/rest/v1/patients?patient_code=eq.{}",
            urlencoding::encode(code)
        );
        let rows: Vec<Patient> = self.request(Method::GET, &path, None, false).await?;
        Ok(rows.into_iter().next())
    }

    async fn doctor_loads(&self) -> Result<Vec<DoctorLoad>, StoreError> {
        let doctors = self.list_doctors().await?;
        let assigned: Vec<Value> = self
            .request(
                Method::GET,
                "/rest/v1/patients?select=assigned_doctor_id&assigned_doctor_id=not.is.null",
                None,
                false,
            )
            .await?;

        let assigned_ids: Vec<Uuid> = assigned
            .iter()
            .filter_map(|row| row["assigned_doctor_id"].as_str())
            .filter_map(|s| s.parse().ok())
            .collect();

        Ok(doctors
            .into_iter()
            .map(|doctor| DoctorLoad {
                patient_count: assigned_ids.iter().filter(|id| **id == doctor.id).count()
                    as i64,
                doctor,
            })
            .collect())
    }

    async fn assign_doctor_if_unassigned(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
    ) -> Result<bool, StoreError> {
        // The is.null filter makes this a server-side compare-and-swap.
        let path = format!(
            "/rest/v1/patients?id=eq.{}&assigned_doctor_id=is.null",
            patient_id
        );
        let rows: Vec<Patient> = self
            .request(
                Method::PATCH,
                &path,
                Some(json!({ "assigned_doctor_id": doctor_id })),
                true,
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn insert_appointment(&self, new: NewAppointment) -> Result<Appointment, StoreError> {
        let body = json!({
            "patient_id": new.patient_id,
            "doctor_id": new.doctor_id,
            "date": date_param(&new.slot),
            "time": time_param(&new.slot),
            "reason": new.reason,
            "is_emergency": new.is_emergency,
            "status": new.status,
        });
        let mut rows: Vec<Appointment> = self
            .request(Method::POST, "/rest/v1/appointments", Some(body), true)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => StoreError::SlotTaken,
                other => other,
            })?;
        if rows.is_empty() {
            return Err(StoreError::Backend("insert returned no row".to_string()));
        }
        Ok(rows.remove(0))
    }

    async fn get_appointment(&self, id: Uuid) -> Result<Appointment, StoreError> {
        self.single(&format!("/rest/v1/appointments?id=eq.{}", id))
            .await
    }

    async fn get_appointment_for(
        &self,
        party: Party,
        id: Uuid,
    ) -> Result<Appointment, StoreError> {
        self.single(&format!(
            "/rest/v1/appointments?id=eq.{}&{}",
            id,
            party_filter(party)
        ))
        .await
    }

    async fn appointments_for(&self, party: Party) -> Result<Vec<Appointment>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?{}&order=date.desc,time.desc",
            party_filter(party)
        );
        self.request(Method::GET, &path, None, false).await
    }

    async fn doctors_booked_at(&self, slot: Slot) -> Result<HashSet<Uuid>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?select=doctor_id&date=eq.{}&time=eq.{}&status=neq.cancelled",
            date_param(&slot),
            time_param(&slot)
        );
        let rows: Vec<Value> = self.request(Method::GET, &path, None, false).await?;
        Ok(rows
            .iter()
            .filter_map(|row| row["doctor_id"].as_str())
            .filter_map(|s| s.parse().ok())
            .collect())
    }

    async fn transition_appointment(
        &self,
        party: Party,
        id: Uuid,
        expected: &[AppointmentStatus],
        next: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        let statuses = expected
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&{}&status=in.({})",
            id,
            party_filter(party),
            statuses
        );
        let mut rows: Vec<Appointment> = self
            .request(Method::PATCH, &path, Some(json!({ "status": next })), true)
            .await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(rows.remove(0))
    }
}

#[async_trait]
impl NotificationSink for PostgrestStore {
    async fn insert_notification(
        &self,
        new: NewNotification,
    ) -> Result<Notification, StoreError> {
        let (patient_id, doctor_id) = match new.recipient {
            Party::Patient(id) => (Some(id), None),
            Party::Doctor(id) => (None, Some(id)),
        };
        let body = json!({
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "message": new.message,
            "is_read": false,
            "appointment_id": new.appointment_id,
        });
        let mut rows: Vec<Notification> = self
            .request(Method::POST, "/rest/v1/notifications", Some(body), true)
            .await?;
        if rows.is_empty() {
            return Err(StoreError::Backend("insert returned no row".to_string()));
        }
        Ok(rows.remove(0))
    }

    async fn notifications_for(&self, party: Party) -> Result<Vec<Notification>, StoreError> {
        let path = format!(
            "/rest/v1/notifications?{}&order=created_at.desc",
            party_filter(party)
        );
        self.request(Method::GET, &path, None, false).await
    }

    async fn get_notification(
        &self,
        party: Party,
        id: Uuid,
    ) -> Result<Notification, StoreError> {
        self.single(&format!(
            "/rest/v1/notifications?id=eq.{}&{}",
            id,
            party_filter(party)
        ))
        .await
    }

    async fn mark_notifications_read(
        &self,
        party: Party,
        id: Option<Uuid>,
    ) -> Result<(), StoreError> {
        let mut path = format!("/rest/v1/notifications?{}", party_filter(party));
        if let Some(id) = id {
            path.push_str(&format!("&id=eq.{}", id));
        }
        let _: Vec<Notification> = self
            .request(Method::PATCH, &path, Some(json!({ "is_read": true })), true)
            .await?;
        Ok(())
    }

    async fn delete_notification(&self, party: Party, id: Uuid) -> Result<(), StoreError> {
        let path = format!(
            "/rest/v1/notifications?id=eq.{}&{}",
            id,
            party_filter(party)
        );
        let rows: Vec<Notification> = self.request(Method::DELETE, &path, None, true).await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
