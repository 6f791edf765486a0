use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;

pub use shared_models::directory::Notification;

#[derive(Debug, Clone, Deserialize)]
pub struct MarkReadRequest {
    pub id: Option<Uuid>,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification not found")]
    NotFound,

    #[error("Cannot clear until appointment time has passed")]
    NotYetClearable,

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for NotificationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => NotificationError::NotFound,
            other => NotificationError::Storage(other.to_string()),
        }
    }
}
