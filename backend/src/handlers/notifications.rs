use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::error::DateCardError;
use crate::models::Notification;
use crate::state::AppState;

pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Notification>>, DateCardError> {
    Ok(Json(state.inbox.list_for_user(&user_id).await?))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path((user_id, notification_id)): Path<(String, Uuid)>,
) -> Result<StatusCode, DateCardError> {
    if state.inbox.mark_read(&user_id, notification_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(DateCardError::NotFound(format!("Notification {}", notification_id)))
    }
}
