// The doctor directory records live in shared-models so the storage boundary
// can speak the same types; this cell re-exports the ones it consumes.
pub use shared_models::directory::{Doctor, DoctorLoad};
