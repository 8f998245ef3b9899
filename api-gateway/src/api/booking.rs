//! Booking API handlers
//!
//! Handlers for the booking lifecycle:
//! - Create a booking request
//! - Provider decisions (accept, decline, start, complete)
//! - Customer actions (cancel, reschedule)
//! - Provider profile lookup

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use booking_service::NewBooking;
use chrono::{NaiveDate, NaiveTime};
use common::model::booking::{Booking, PaymentMethod};
use common::model::provider::ProviderProfile;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::response::ApiResponse;
use crate::error::ApiError;
use crate::AppState;

/// Create booking request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    /// Acting customer
    pub actor_id: Uuid,
    /// Service offering to book
    pub service_id: Uuid,
    /// Requested date
    pub scheduled_date: NaiveDate,
    /// Requested time of day
    pub scheduled_time: NaiveTime,
    /// Payment instrument
    pub payment_method: PaymentMethod,
    /// Notes for the provider
    #[serde(default)]
    pub notes: String,
}

/// Request carrying only the acting user
#[derive(Debug, Deserialize, ToSchema)]
pub struct ActorRequest {
    /// Acting user
    pub actor_id: Uuid,
}

/// Reschedule request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RescheduleRequest {
    /// Acting customer
    pub actor_id: Uuid,
    /// New date
    pub scheduled_date: NaiveDate,
    /// New time of day
    pub scheduled_time: NaiveTime,
}

/// Create a new booking
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 200, description = "Booking created successfully"),
        (status = 404, description = "Service not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "booking"
)]
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<ApiResponse<Booking>, ApiError> {
    let booking = state
        .booking_service
        .create_booking(
            request.actor_id,
            NewBooking {
                service_id: request.service_id,
                scheduled_date: request.scheduled_date,
                scheduled_time: request.scheduled_time,
                payment_method: request.payment_method,
                notes: request.notes,
            },
        )
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(booking))
}

/// Get a booking by ID
#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking details retrieved successfully"),
        (status = 404, description = "Booking not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "booking"
)]
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Booking>, ApiError> {
    let booking = state
        .booking_service
        .get_booking(id)
        .await
        .map_err(ApiError::Common)?
        .ok_or_else(|| ApiError::NotFound(format!("Booking not found: {}", id)))?;

    Ok(ApiResponse::new(booking))
}

/// Provider accepts a pending booking
#[utoipa::path(
    put,
    path = "/api/v1/bookings/{id}/accept",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = ActorRequest,
    responses(
        (status = 200, description = "Booking accepted"),
        (status = 403, description = "Actor is not the provider"),
        (status = 409, description = "Booking is not pending"),
        (status = 404, description = "Booking not found")
    ),
    tag = "booking"
)]
pub async fn accept_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ActorRequest>,
) -> Result<ApiResponse<Booking>, ApiError> {
    let booking = state
        .booking_service
        .accept(id, request.actor_id)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(booking))
}

/// Provider declines a pending booking
#[utoipa::path(
    put,
    path = "/api/v1/bookings/{id}/decline",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = ActorRequest,
    responses(
        (status = 200, description = "Booking declined"),
        (status = 403, description = "Actor is not the provider"),
        (status = 409, description = "Booking is not pending"),
        (status = 404, description = "Booking not found")
    ),
    tag = "booking"
)]
pub async fn decline_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ActorRequest>,
) -> Result<ApiResponse<Booking>, ApiError> {
    let booking = state
        .booking_service
        .decline(id, request.actor_id)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(booking))
}

/// Provider marks a confirmed booking as started
#[utoipa::path(
    put,
    path = "/api/v1/bookings/{id}/start",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = ActorRequest,
    responses(
        (status = 200, description = "Booking started"),
        (status = 409, description = "Booking is not confirmed"),
        (status = 404, description = "Booking not found")
    ),
    tag = "booking"
)]
pub async fn start_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ActorRequest>,
) -> Result<ApiResponse<Booking>, ApiError> {
    let booking = state
        .booking_service
        .start(id, request.actor_id)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(booking))
}

/// Provider completes a booking
#[utoipa::path(
    put,
    path = "/api/v1/bookings/{id}/complete",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = ActorRequest,
    responses(
        (status = 200, description = "Booking completed"),
        (status = 409, description = "Booking cannot be completed from its current state"),
        (status = 404, description = "Booking not found")
    ),
    tag = "booking"
)]
pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ActorRequest>,
) -> Result<ApiResponse<Booking>, ApiError> {
    let booking = state
        .booking_service
        .complete(id, request.actor_id)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(booking))
}

/// Customer or provider cancels a booking
#[utoipa::path(
    put,
    path = "/api/v1/bookings/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = ActorRequest,
    responses(
        (status = 200, description = "Booking cancelled"),
        (status = 403, description = "Actor is not part of the booking"),
        (status = 409, description = "Booking already reached a terminal state"),
        (status = 404, description = "Booking not found")
    ),
    tag = "booking"
)]
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ActorRequest>,
) -> Result<ApiResponse<Booking>, ApiError> {
    let booking = state
        .booking_service
        .cancel(id, request.actor_id)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(booking))
}

/// Customer reschedules a booking
#[utoipa::path(
    put,
    path = "/api/v1/bookings/{id}/reschedule",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = RescheduleRequest,
    responses(
        (status = 200, description = "Booking rescheduled"),
        (status = 403, description = "Actor is not the customer"),
        (status = 409, description = "Booking can no longer be rescheduled"),
        (status = 404, description = "Booking not found")
    ),
    tag = "booking"
)]
pub async fn reschedule_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<RescheduleRequest>,
) -> Result<ApiResponse<Booking>, ApiError> {
    let booking = state
        .booking_service
        .reschedule(id, request.scheduled_date, request.scheduled_time, request.actor_id)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(booking))
}

/// Get a provider's aggregate profile
#[utoipa::path(
    get,
    path = "/api/v1/providers/{id}/profile",
    params(
        ("id" = Uuid, Path, description = "Provider user ID")
    ),
    responses(
        (status = 200, description = "Provider profile retrieved successfully"),
        (status = 500, description = "Internal server error")
    ),
    tag = "booking"
)]
pub async fn get_provider_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<ProviderProfile>, ApiError> {
    let profile = state
        .booking_service
        .provider_profile(id)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(profile))
}
