use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_database::{DirectoryStore, PostgrestStore, StoreError};
use shared_models::directory::{AppointmentStatus, NewAppointment, Party, Slot};

fn test_config(mock_server: &MockServer) -> AppConfig {
    AppConfig {
        database_url: mock_server.uri(),
        database_service_key: "test-service-key".to_string(),
        jwt_secret: "test-secret".to_string(),
        port: 3000,
    }
}

fn doctor_row(id: Uuid) -> serde_json::Value {
    json!({
        "id": id,
        "staff_code": "DOC-1",
        "first_name": "Amina",
        "last_name": "Otieno",
        "role": "doctor",
        "password_hash": "hash",
        "phone": null,
        "email": null,
        "created_at": "2024-01-01T08:00:00Z"
    })
}

fn slot() -> Slot {
    Slot {
        date: NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
        time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
    }
}

#[tokio::test]
async fn list_doctors_requests_stable_ordering() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("order", "id.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor_row(doctor_id)])))
        .mount(&mock_server)
        .await;

    let store = PostgrestStore::new(&test_config(&mock_server));
    let doctors = store.list_doctors().await.unwrap();

    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0].id, doctor_id);
}

#[tokio::test]
async fn unique_violation_on_insert_maps_to_slot_taken() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint"
        })))
        .mount(&mock_server)
        .await;

    let store = PostgrestStore::new(&test_config(&mock_server));
    let result = store
        .insert_appointment(NewAppointment {
            patient_id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            slot: slot(),
            reason: "Emergency Consultation".to_string(),
            is_emergency: true,
            status: AppointmentStatus::Scheduled,
        })
        .await;

    assert_matches!(result, Err(StoreError::SlotTaken));
}

#[tokio::test]
async fn transition_with_no_matching_row_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let store = PostgrestStore::new(&test_config(&mock_server));
    let result = store
        .transition_appointment(
            Party::Patient(Uuid::new_v4()),
            Uuid::new_v4(),
            &[AppointmentStatus::Scheduled],
            AppointmentStatus::Cancelled,
        )
        .await;

    assert_matches!(result, Err(StoreError::NotFound));
}

#[tokio::test]
async fn assignment_cas_reports_lost_race() {
    let mock_server = MockServer::start().await;

    // No row matched the assigned_doctor_id=is.null filter.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patients"))
        .and(query_param("assigned_doctor_id", "is.null"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let store = PostgrestStore::new(&test_config(&mock_server));
    let wrote = store
        .assign_doctor_if_unassigned(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap();

    assert!(!wrote);
}

#[tokio::test]
async fn booked_doctors_query_filters_cancelled() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.cancelled"))
        .and(query_param("date", "eq.2099-01-01"))
        .and(query_param("time", "eq.10:00:00"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "doctor_id": doctor_id }])),
        )
        .mount(&mock_server)
        .await;

    let store = PostgrestStore::new(&test_config(&mock_server));
    let busy = store.doctors_booked_at(slot()).await.unwrap();

    assert!(busy.contains(&doctor_id));
}
