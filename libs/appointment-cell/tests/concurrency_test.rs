use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use appointment_cell::models::{AppointmentError, BookAppointmentRequest};
use appointment_cell::services::booking::SchedulerService;
use shared_database::{DirectoryStore, MemoryStore};
use shared_models::auth::ActorRole;
use shared_models::directory::{NewDoctor, NewPatient, Party};

fn emergency_request() -> BookAppointmentRequest {
    BookAppointmentRequest {
        date: NaiveDate::from_ymd_opt(2099, 6, 1),
        time: NaiveTime::from_hms_opt(10, 0, 0),
        reason: None,
        is_emergency: true,
    }
}

async fn seed(store: &MemoryStore, doctors: usize, patients: usize) -> Vec<Uuid> {
    for i in 0..doctors {
        store
            .insert_doctor(NewDoctor {
                staff_code: format!("PH-{:03}", i),
                first_name: "Grace".to_string(),
                last_name: format!("Wanjiru{}", i),
                role: ActorRole::Pharmacist,
                password_hash: "hash".to_string(),
                phone: None,
                email: None,
            })
            .await
            .unwrap();
    }

    let mut patient_ids = Vec::with_capacity(patients);
    for i in 0..patients {
        let patient = store
            .insert_patient(NewPatient {
                patient_code: format!("PT-{:03}", i),
                first_name: "Brian".to_string(),
                last_name: format!("Mwangi{}", i),
                password_hash: "hash".to_string(),
                phone: None,
                email: None,
                assigned_doctor_id: None,
            })
            .await
            .unwrap();
        patient_ids.push(patient.id);
    }
    patient_ids
}

/// N concurrent bookings for the identical slot with exactly N doctors must
/// produce N successes with N distinct doctors and zero double-bookings.
#[tokio::test]
async fn concurrent_bookings_fill_every_doctor_exactly_once() {
    const N: usize = 8;

    let store = Arc::new(MemoryStore::new());
    let patient_ids = seed(&store, N, N).await;
    let scheduler = Arc::new(SchedulerService::new(store.clone()));

    let mut handles = Vec::with_capacity(N);
    for patient_id in patient_ids {
        let scheduler = Arc::clone(&scheduler);
        handles.push(tokio::spawn(async move {
            scheduler.book_emergency(patient_id, emergency_request()).await
        }));
    }

    let mut assigned = HashSet::new();
    for handle in handles {
        let appointment = handle.await.unwrap().unwrap();
        assert!(
            assigned.insert(appointment.doctor_id),
            "doctor {} double-booked",
            appointment.doctor_id
        );
    }
    assert_eq!(assigned.len(), N);
}

/// With fewer doctors than requests, the surplus must fail with the
/// slot-exhausted conflict and never a double booking.
#[tokio::test]
async fn surplus_concurrent_bookings_conflict_cleanly() {
    const DOCTORS: usize = 3;
    const REQUESTS: usize = 7;

    let store = Arc::new(MemoryStore::new());
    let patient_ids = seed(&store, DOCTORS, REQUESTS).await;
    let scheduler = Arc::new(SchedulerService::new(store.clone()));

    let mut handles = Vec::with_capacity(REQUESTS);
    for patient_id in patient_ids.clone() {
        let scheduler = Arc::clone(&scheduler);
        handles.push(tokio::spawn(async move {
            scheduler.book_emergency(patient_id, emergency_request()).await
        }));
    }

    let mut successes = Vec::new();
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(appointment) => successes.push(appointment),
            Err(AppointmentError::SlotUnavailable) => conflicts += 1,
            Err(other) => panic!("unexpected booking error: {}", other),
        }
    }

    assert_eq!(successes.len(), DOCTORS);
    assert_eq!(conflicts, REQUESTS - DOCTORS);

    let distinct: HashSet<Uuid> = successes.iter().map(|a| a.doctor_id).collect();
    assert_eq!(distinct.len(), DOCTORS);

    // The store agrees: every patient holds at most one appointment.
    for patient_id in patient_ids {
        let count = store
            .appointments_for(Party::Patient(patient_id))
            .await
            .unwrap()
            .len();
        assert!(count <= 1);
    }
}
