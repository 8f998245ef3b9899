//! Notification API handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use common::model::notification::Notification;
use uuid::Uuid;

use crate::api::response::ApiListResponse;
use crate::error::ApiError;
use crate::AppState;

/// Get stored notifications for a user
#[utoipa::path(
    get,
    path = "/api/v1/notifications/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Notifications retrieved successfully")
    ),
    tag = "notification"
)]
pub async fn get_notifications(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<ApiListResponse<Notification>, ApiError> {
    Ok(ApiListResponse::new(state.notifications.notifications_for(user_id)))
}
