//! Payment API handlers
//!
//! Handlers for payment processing and refunds. Payment strategy selection
//! (credits, installments, gateway) happens in the orchestrator; these
//! handlers only translate between HTTP and the service contract.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use common::decimal::Amount;
use common::model::booking::PaymentMethod;
use common::model::payment::{Payment, PaymentType};
use payment_service::{PaymentOutcome, PaymentRequest};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::response::ApiResponse;
use crate::error::ApiError;
use crate::AppState;

/// Process payment request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProcessPaymentRequest {
    /// Acting customer
    pub actor_id: Uuid,
    /// Booking to pay for
    pub booking_id: Uuid,
    /// Payment modality
    pub payment_type: PaymentType,
    /// Payment instrument
    pub payment_method: PaymentMethod,
    /// Number of installments (2-12), for installment payments
    pub installment_count: Option<u32>,
    /// Gateway customer reference or saved-method token
    pub gateway_token: Option<String>,
}

/// Refund request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefundRequest {
    /// Acting customer
    pub actor_id: Uuid,
    /// Partial refund amount; omit for a full refund
    pub amount: Option<Amount>,
}

/// Process a payment for a booking
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    request_body = ProcessPaymentRequest,
    responses(
        (status = 200, description = "Payment processed"),
        (status = 400, description = "Invalid request or insufficient credits"),
        (status = 409, description = "Booking is already paid"),
        (status = 404, description = "Booking not found"),
        (status = 502, description = "Payment gateway failure")
    ),
    tag = "payment"
)]
pub async fn process_payment(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProcessPaymentRequest>,
) -> Result<ApiResponse<PaymentOutcome>, ApiError> {
    let outcome = state
        .payment_orchestrator
        .process_payment(
            request.actor_id,
            PaymentRequest {
                booking_id: request.booking_id,
                payment_type: request.payment_type,
                payment_method: request.payment_method,
                installment_count: request.installment_count,
                gateway_token: request.gateway_token,
            },
        )
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(outcome))
}

/// Get a payment by ID
#[utoipa::path(
    get,
    path = "/api/v1/payments/{id}",
    params(
        ("id" = Uuid, Path, description = "Payment ID")
    ),
    responses(
        (status = 200, description = "Payment retrieved successfully"),
        (status = 404, description = "Payment not found")
    ),
    tag = "payment"
)]
pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Payment>, ApiError> {
    let payment = state
        .payment_orchestrator
        .get_payment(id)
        .await
        .map_err(ApiError::Common)?
        .ok_or_else(|| ApiError::NotFound(format!("Payment not found: {}", id)))?;

    Ok(ApiResponse::new(payment))
}

/// Refund a completed payment
#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/refund",
    params(
        ("id" = Uuid, Path, description = "Payment ID")
    ),
    request_body = RefundRequest,
    responses(
        (status = 200, description = "Refund processed"),
        (status = 409, description = "Payment already refunded"),
        (status = 400, description = "Payment is not refundable"),
        (status = 404, description = "Payment not found"),
        (status = 502, description = "Payment gateway failure")
    ),
    tag = "payment"
)]
pub async fn refund_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<RefundRequest>,
) -> Result<ApiResponse<Payment>, ApiError> {
    let payment = state
        .payment_orchestrator
        .refund_payment(request.actor_id, id, request.amount)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(payment))
}
