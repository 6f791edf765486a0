//! Doctor selection strategies.
//!
//! Both strategies are pure functions over a snapshot of directory data: they
//! never touch storage and never mutate anything. The caller persists the
//! outcome and must treat it as provisional until the write lands - under
//! concurrency the chosen doctor may lose the slot, in which case the caller
//! walks to the next candidate.

use std::collections::HashSet;

use uuid::Uuid;

use crate::models::{Doctor, DoctorLoad};

/// Load-balancing assignment, used at patient registration.
///
/// Picks the doctor with the fewest assigned patients; ties go to the doctor
/// registered earliest, then to the smaller id so the result is total. `None`
/// on an empty directory - registration proceeds unassigned rather than
/// failing.
pub fn least_loaded(loads: &[DoctorLoad]) -> Option<&Doctor> {
    loads
        .iter()
        .min_by(|a, b| {
            a.patient_count
                .cmp(&b.patient_count)
                .then_with(|| a.doctor.created_at.cmp(&b.doctor.created_at))
                .then_with(|| a.doctor.id.cmp(&b.doctor.id))
        })
        .map(|load| &load.doctor)
}

/// Conflict-avoidance assignment, used at appointment booking.
///
/// Greedy first-fit: doctors in ascending id order, filtered to those without
/// a non-cancelled appointment at the target slot. The caller takes the
/// candidates front-to-back; an empty result means every doctor is booked.
pub fn slot_candidates<'a>(doctors: &'a [Doctor], busy: &HashSet<Uuid>) -> Vec<&'a Doctor> {
    let mut free: Vec<&Doctor> = doctors.iter().filter(|d| !busy.contains(&d.id)).collect();
    free.sort_by_key(|d| d.id);
    free
}
