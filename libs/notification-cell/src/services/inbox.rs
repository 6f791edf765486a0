use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::PharmacyStore;
use shared_models::directory::Party;

use crate::models::{Notification, NotificationError};

pub struct InboxService {
    store: Arc<dyn PharmacyStore>,
}

impl InboxService {
    pub fn new(store: Arc<dyn PharmacyStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, party: Party) -> Result<Vec<Notification>, NotificationError> {
        Ok(self.store.notifications_for(party).await?)
    }

    pub async fn mark_read(
        &self,
        party: Party,
        id: Option<Uuid>,
    ) -> Result<(), NotificationError> {
        Ok(self.store.mark_notifications_read(party, id).await?)
    }

    /// Delete a notification. One linked to an appointment stays in the
    /// inbox until the appointment's slot has passed, so reminders cannot be
    /// cleared ahead of time.
    pub async fn clear(&self, party: Party, id: Uuid) -> Result<(), NotificationError> {
        let notification = self.store.get_notification(party, id).await?;

        if let Some(appointment_id) = notification.appointment_id {
            match self.store.get_appointment(appointment_id).await {
                Ok(appointment) => {
                    if appointment.slot().instant() > Utc::now() {
                        return Err(NotificationError::NotYetClearable);
                    }
                }
                Err(e) => {
                    // Dangling reference: the guard has nothing to protect.
                    warn!("Linked appointment {} unavailable: {}", appointment_id, e);
                }
            }
        }

        self.store.delete_notification(party, id).await?;
        debug!("Notification {} cleared", id);
        Ok(())
    }
}
