//! Review API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use common::model::review::Review;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::response::ApiResponse;
use crate::error::ApiError;
use crate::AppState;

/// Submit review request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitReviewRequest {
    /// Acting customer
    pub actor_id: Uuid,
    /// Completed booking being reviewed
    pub booking_id: Uuid,
    /// Star rating, 1 to 5
    pub rating: u8,
    /// Free-form comment
    #[serde(default)]
    pub comment: String,
}

/// Provider response request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RespondToReviewRequest {
    /// Acting provider
    pub actor_id: Uuid,
    /// Public response text
    pub response: String,
}

/// Submit a review for a completed booking
#[utoipa::path(
    post,
    path = "/api/v1/reviews",
    request_body = SubmitReviewRequest,
    responses(
        (status = 200, description = "Review recorded"),
        (status = 400, description = "Booking not completed or rating out of range"),
        (status = 403, description = "Actor is not the booking's customer"),
        (status = 409, description = "Booking already has a review"),
        (status = 404, description = "Booking not found")
    ),
    tag = "review"
)]
pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitReviewRequest>,
) -> Result<ApiResponse<Review>, ApiError> {
    let review = state
        .review_service
        .submit_review(request.actor_id, request.booking_id, request.rating, request.comment)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(review))
}

/// Provider responds to a review
#[utoipa::path(
    put,
    path = "/api/v1/reviews/{id}/response",
    params(
        ("id" = Uuid, Path, description = "Review ID")
    ),
    request_body = RespondToReviewRequest,
    responses(
        (status = 200, description = "Response recorded"),
        (status = 403, description = "Actor is not the reviewed provider"),
        (status = 404, description = "Review not found")
    ),
    tag = "review"
)]
pub async fn respond_to_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<RespondToReviewRequest>,
) -> Result<ApiResponse<Review>, ApiError> {
    let review = state
        .review_service
        .respond_to_review(request.actor_id, id, request.response)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(review))
}
