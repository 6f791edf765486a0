use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::{appointment_routes, clinician_routes};
use auth_cell::router::auth_routes;
use notification_cell::router::notification_routes;
use shared_database::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Pharmacy API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/doctor/appointments", clinician_routes(state.clone()))
        .nest("/notifications", notification_routes(state.clone()))
}
