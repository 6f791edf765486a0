use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::{MarkReadRequest, NotificationError};
use crate::services::inbox::InboxService;

fn map_err(e: NotificationError) -> AppError {
    match e {
        NotificationError::NotFound => AppError::NotFound(e.to_string()),
        NotificationError::NotYetClearable => AppError::BadRequest(e.to_string()),
        NotificationError::Storage(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let inbox = InboxService::new(Arc::clone(&state.store));
    let notifications = inbox.list(user.party()).await.map_err(map_err)?;

    Ok(Json(json!({
        "success": true,
        "notifications": notifications
    })))
}

#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<MarkReadRequest>,
) -> Result<Json<Value>, AppError> {
    let inbox = InboxService::new(Arc::clone(&state.store));
    inbox
        .mark_read(user.party(), request.id)
        .await
        .map_err(map_err)?;

    Ok(Json(json!({
        "success": true,
        "message": "Notifications marked as read"
    })))
}

#[axum::debug_handler]
pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Path(notification_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let inbox = InboxService::new(Arc::clone(&state.store));
    inbox
        .clear(user.party(), notification_id)
        .await
        .map_err(map_err)?;

    Ok(Json(json!({
        "success": true,
        "message": "Notification cleared"
    })))
}
