use std::sync::Arc;

use assert_matches::assert_matches;
use uuid::Uuid;

use auth_cell::models::{
    EnrollmentError, LoginIdentity, LoginRequest, RegisterClinicianRequest,
    RegisterPatientRequest,
};
use auth_cell::services::enrollment::EnrollmentService;
use auth_cell::services::profile::ProfileService;
use shared_database::{DirectoryStore, MemoryStore};
use shared_models::auth::ActorRole;
use shared_models::directory::{NewPatient, Patient};

fn clinician_request(staff_id: &str, role: ActorRole) -> RegisterClinicianRequest {
    RegisterClinicianRequest {
        first_name: "Grace".to_string(),
        last_name: "Wanjiru".to_string(),
        staff_id: staff_id.to_string(),
        password: "hunter22".to_string(),
        role: Some(role),
        phone: None,
        email: None,
    }
}

fn patient_request(patient_id: &str) -> RegisterPatientRequest {
    RegisterPatientRequest {
        first_name: "Brian".to_string(),
        last_name: "Mwangi".to_string(),
        patient_id: patient_id.to_string(),
        password: "hunter22".to_string(),
        phone: Some("0712345678".to_string()),
        email: None,
    }
}

#[tokio::test]
async fn registration_assigns_least_loaded_doctor() {
    let store = Arc::new(MemoryStore::new());
    let enrollment = EnrollmentService::new(store.clone());

    let first = enrollment
        .register_clinician(clinician_request("PH-001", ActorRole::Doctor))
        .await
        .unwrap();
    let second = enrollment
        .register_clinician(clinician_request("PH-002", ActorRole::Pharmacist))
        .await
        .unwrap();

    // First doctor registered earlier, so the tie at zero patients goes to them.
    let p1 = enrollment.register_patient(patient_request("PT-001")).await.unwrap();
    assert_eq!(p1.assigned_doctor_id, Some(first.id));

    // Now the second doctor is the lighter one.
    let p2 = enrollment.register_patient(patient_request("PT-002")).await.unwrap();
    assert_eq!(p2.assigned_doctor_id, Some(second.id));
}

#[tokio::test]
async fn registration_without_doctors_leaves_patient_unassigned() {
    let store = Arc::new(MemoryStore::new());
    let enrollment = EnrollmentService::new(store.clone());

    let patient = enrollment.register_patient(patient_request("PT-001")).await.unwrap();
    assert_eq!(patient.assigned_doctor_id, None);
}

#[tokio::test]
async fn duplicate_patient_id_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let enrollment = EnrollmentService::new(store.clone());

    enrollment.register_patient(patient_request("PT-001")).await.unwrap();
    let duplicate = enrollment.register_patient(patient_request("PT-001")).await;
    assert_matches!(duplicate, Err(EnrollmentError::DuplicatePatientId));
}

#[tokio::test]
async fn registration_requires_all_fields() {
    let store = Arc::new(MemoryStore::new());
    let enrollment = EnrollmentService::new(store.clone());

    let mut request = patient_request("PT-001");
    request.password = String::new();
    let result = enrollment.register_patient(request).await;
    assert_matches!(result, Err(EnrollmentError::MissingFields));
}

#[tokio::test]
async fn clinician_registration_rejects_patient_role() {
    let store = Arc::new(MemoryStore::new());
    let enrollment = EnrollmentService::new(store.clone());

    let mut request = clinician_request("PH-001", ActorRole::Doctor);
    request.role = Some(ActorRole::Patient);
    let result = enrollment.register_clinician(request).await;
    assert_matches!(result, Err(EnrollmentError::InvalidRole));
}

#[tokio::test]
async fn login_verifies_credentials_per_role() {
    let store = Arc::new(MemoryStore::new());
    let enrollment = EnrollmentService::new(store.clone());

    enrollment
        .register_clinician(clinician_request("PH-001", ActorRole::Pharmacist))
        .await
        .unwrap();
    enrollment.register_patient(patient_request("PT-001")).await.unwrap();

    let identity = enrollment
        .login(LoginRequest {
            user_id: "PT-001".to_string(),
            password: "hunter22".to_string(),
            role: ActorRole::Patient,
        })
        .await
        .unwrap();
    assert_matches!(identity, LoginIdentity::Patient(_));

    let identity = enrollment
        .login(LoginRequest {
            user_id: "PH-001".to_string(),
            password: "hunter22".to_string(),
            role: ActorRole::Pharmacist,
        })
        .await
        .unwrap();
    assert_matches!(identity, LoginIdentity::Clinician(_));

    // Wrong password and unknown id are indistinguishable.
    let bad_password = enrollment
        .login(LoginRequest {
            user_id: "PT-001".to_string(),
            password: "wrong".to_string(),
            role: ActorRole::Patient,
        })
        .await;
    assert_matches!(bad_password, Err(EnrollmentError::InvalidCredentials));

    let unknown = enrollment
        .login(LoginRequest {
            user_id: "PT-404".to_string(),
            password: "hunter22".to_string(),
            role: ActorRole::Patient,
        })
        .await;
    assert_matches!(unknown, Err(EnrollmentError::InvalidCredentials));
}

async fn unassigned_patient(store: &MemoryStore, code: &str) -> Patient {
    store
        .insert_patient(NewPatient {
            patient_code: code.to_string(),
            first_name: "Brian".to_string(),
            last_name: "Mwangi".to_string(),
            password_hash: "hash".to_string(),
            phone: None,
            email: None,
            assigned_doctor_id: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn profile_read_assigns_lazily_exactly_once() {
    let store = Arc::new(MemoryStore::new());
    let enrollment = EnrollmentService::new(store.clone());
    let profiles = ProfileService::new(store.clone());

    // Patient registered before any doctor existed.
    let patient = unassigned_patient(&store, "PT-001").await;

    let doctor = enrollment
        .register_clinician(clinician_request("PH-001", ActorRole::Doctor))
        .await
        .unwrap();

    let first_read = profiles.patient_profile(patient.id).await.unwrap();
    let assigned = first_read.assigned_doctor.expect("doctor assigned on read");
    assert_eq!(assigned.id, doctor.id);
    assert_eq!(assigned.display_name(), "Dr. Grace Wanjiru");

    // The write stuck, and later reads take the stored value.
    let stored = store.get_patient(patient.id).await.unwrap();
    assert_eq!(stored.assigned_doctor_id, Some(doctor.id));

    let second_read = profiles.patient_profile(patient.id).await.unwrap();
    assert_eq!(second_read.assigned_doctor.unwrap().id, doctor.id);
}

#[tokio::test]
async fn concurrent_profile_reads_assign_a_single_doctor() {
    let store = Arc::new(MemoryStore::new());
    let enrollment = EnrollmentService::new(store.clone());

    let patient = unassigned_patient(&store, "PT-001").await;
    enrollment
        .register_clinician(clinician_request("PH-001", ActorRole::Doctor))
        .await
        .unwrap();
    enrollment
        .register_clinician(clinician_request("PH-002", ActorRole::Doctor))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        let patient_id = patient.id;
        handles.push(tokio::spawn(async move {
            ProfileService::new(store).patient_profile(patient_id).await
        }));
    }

    let mut seen: Vec<Uuid> = Vec::new();
    for handle in handles {
        let profile = handle.await.unwrap().unwrap();
        seen.push(profile.assigned_doctor.expect("every read sees an assignment").id);
    }

    // All readers converged on one doctor.
    assert!(seen.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn profile_read_without_doctors_stays_unassigned() {
    let store = Arc::new(MemoryStore::new());
    let profiles = ProfileService::new(store.clone());

    let patient = unassigned_patient(&store, "PT-001").await;
    let profile = profiles.patient_profile(patient.id).await.unwrap();
    assert!(profile.assigned_doctor.is_none());
}
