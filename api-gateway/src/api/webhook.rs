//! Gateway webhook handler
//!
//! The gateway delivers events at-least-once and authenticates them with an
//! HMAC-SHA256 signature over the raw body. An unverifiable signature is
//! reported back with a non-2xx status so the gateway retries; reconciliation
//! errors for unknown state are swallowed inside the orchestrator.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use payment_service::gateway::verify_event;
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

/// Header carrying the webhook signature
pub const SIGNATURE_HEADER: &str = "x-gateway-signature";

/// Receive and reconcile a gateway webhook event
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/gateway",
    responses(
        (status = 200, description = "Event accepted"),
        (status = 400, description = "Missing or invalid signature"),
        (status = 500, description = "Reconciliation failure, gateway should retry")
    ),
    tag = "webhook"
)]
pub async fn gateway_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing webhook signature".to_string()))?;

    let event = verify_event(&state.webhook_secret, &body, signature).map_err(|e| {
        warn!("Rejected webhook: {}", e);
        ApiError::BadRequest(e.to_string())
    })?;

    state
        .payment_orchestrator
        .handle_webhook(event)
        .await
        .map_err(ApiError::Common)?;

    Ok(StatusCode::OK)
}
