use shared_models::directory::AppointmentStatus;

/// Statuses a cancellation may start from. `cancelled` is terminal, so a
/// repeat cancellation falls outside this set and reads as not-found.
pub fn cancellable() -> &'static [AppointmentStatus] {
    &[AppointmentStatus::Pending, AppointmentStatus::Scheduled]
}

/// Statuses a clinician decision (approve/reject) may start from.
pub fn awaiting_decision() -> &'static [AppointmentStatus] {
    &[AppointmentStatus::Pending]
}

/// The full transition table. Kept alongside the guard sets above so the two
/// can't drift apart.
pub fn can_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    use AppointmentStatus::*;
    matches!((from, to), (Pending, Scheduled) | (Pending, Cancelled) | (Scheduled, Cancelled))
}
