use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_service_key: String,
    pub jwt_secret: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("DATABASE_URL not set, using empty value");
                    String::new()
                }),
            database_service_key: env::var("DATABASE_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("DATABASE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using development default");
                    "change-this-secret-in-production".to_string()
                }),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
        };

        if !config.is_database_configured() {
            warn!("No database configured - falling back to the in-memory store");
        }

        config
    }

    pub fn is_database_configured(&self) -> bool {
        !self.database_url.is_empty() && !self.database_service_key.is_empty()
    }
}
