use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Patient-facing appointment routes.
pub fn appointment_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route(
            "/",
            post(handlers::book_appointment).get(handlers::list_appointments),
        )
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}

/// Clinician-facing appointment routes (direct booking and the
/// pending-confirmation flow).
pub fn clinician_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route(
            "/",
            post(handlers::book_for_patient).get(handlers::list_appointments),
        )
        .route("/{appointment_id}/approve", post(handlers::approve_appointment))
        .route("/{appointment_id}/reject", post(handlers::reject_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
