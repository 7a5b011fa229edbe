//! Routes for in-app notifications.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::notification::Notification;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

pub async fn list_unread_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Notification>>>, ApiError> {
    let notifications = Notification::find_unread_by_user(&state.db().pool, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(notifications)))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if !Notification::mark_read(&state.db().pool, notification_id).await? {
        return Err(ApiError::NotFound);
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/users/{user_id}/notifications",
            get(list_unread_notifications),
        )
        .route(
            "/notifications/{notification_id}/read",
            post(mark_notification_read),
        )
}
