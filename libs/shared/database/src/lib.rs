pub mod memory;
pub mod postgrest;
pub mod store;

use std::sync::Arc;

use shared_config::AppConfig;

pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;
pub use store::{DirectoryStore, NotificationSink, StoreError};

/// Everything the scheduling core needs from storage. Implemented by every
/// backend; handlers only ever see this trait object.
pub trait PharmacyStore: DirectoryStore + NotificationSink {}

impl<T: DirectoryStore + NotificationSink> PharmacyStore for T {}

/// Process-wide state, constructed once by the entry point and injected into
/// every cell. No cell opens its own storage handle.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn PharmacyStore>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn PharmacyStore>) -> Self {
        Self { config, store }
    }
}
