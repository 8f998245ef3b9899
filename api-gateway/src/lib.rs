// api-gateway/src/lib.rs
pub mod api;
pub mod error;
pub mod config;
pub mod docs;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use booking_service::{BookingService, ReviewService};
use common::notify::InMemoryDispatcher;
use credit_ledger::CreditLedger;
use payment_service::PaymentOrchestrator;

/// App state shared across handlers
pub struct AppState {
    /// Booking lifecycle service
    pub booking_service: Arc<BookingService>,
    /// Review service
    pub review_service: Arc<ReviewService>,
    /// Payment orchestrator
    pub payment_orchestrator: Arc<PaymentOrchestrator>,
    /// Credit ledger
    pub credit_ledger: Arc<CreditLedger>,
    /// Stored notifications
    pub notifications: Arc<InMemoryDispatcher>,
    /// Shared secret for gateway webhook signatures
    pub webhook_secret: String,
}

/// Build the versioned API router over the shared state
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Booking routes
        .route("/bookings", post(api::booking::create_booking))
        .route("/bookings/:id", get(api::booking::get_booking))
        .route("/bookings/:id/accept", put(api::booking::accept_booking))
        .route("/bookings/:id/decline", put(api::booking::decline_booking))
        .route("/bookings/:id/start", put(api::booking::start_booking))
        .route("/bookings/:id/complete", put(api::booking::complete_booking))
        .route("/bookings/:id/cancel", put(api::booking::cancel_booking))
        .route("/bookings/:id/reschedule", put(api::booking::reschedule_booking))
        .route("/providers/:id/profile", get(api::booking::get_provider_profile))

        // Payment routes
        .route("/payments", post(api::payment::process_payment))
        .route("/payments/:id", get(api::payment::get_payment))
        .route("/payments/:id/refund", post(api::payment::refund_payment))

        // Credit routes
        .route("/credits/:user_id/balance", get(api::credits::get_balance))
        .route("/credits/purchase", post(api::credits::purchase_credits))

        // Review routes
        .route("/reviews", post(api::review::submit_review))
        .route("/reviews/:id/response", put(api::review::respond_to_review))

        // Notification routes
        .route("/notifications/:user_id", get(api::notification::get_notifications))

        // Gateway webhook
        .route("/webhooks/gateway", post(api::webhook::gateway_webhook))
}
