//! OpenAPI documentation assembly

use utoipa::OpenApi;

use crate::api;

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Booking routes
        api::booking::create_booking,
        api::booking::get_booking,
        api::booking::accept_booking,
        api::booking::decline_booking,
        api::booking::start_booking,
        api::booking::complete_booking,
        api::booking::cancel_booking,
        api::booking::reschedule_booking,
        api::booking::get_provider_profile,
        // Payment routes
        api::payment::process_payment,
        api::payment::get_payment,
        api::payment::refund_payment,
        // Credit routes
        api::credits::get_balance,
        api::credits::purchase_credits,
        // Review routes
        api::review::submit_review,
        api::review::respond_to_review,
        // Notification routes
        api::notification::get_notifications,
        // Webhook
        api::webhook::gateway_webhook,
    ),
    components(
        schemas(
            // Booking API
            api::booking::CreateBookingRequest,
            api::booking::ActorRequest,
            api::booking::RescheduleRequest,
            common::model::booking::Booking,
            common::model::booking::BookingStatus,
            common::model::booking::PaymentMethod,
            common::model::provider::ProviderProfile,

            // Payment API
            api::payment::ProcessPaymentRequest,
            api::payment::RefundRequest,
            common::model::payment::Payment,
            common::model::payment::PaymentStatus,
            common::model::payment::PaymentType,
            common::model::payment::Installment,
            common::model::payment::InstallmentStatus,

            // Credits API
            api::credits::CreditBalance,
            api::credits::PurchaseCreditsRequest,
            common::model::credits::CreditEntry,
            common::model::credits::CreditTransactionType,

            // Review API
            api::review::SubmitReviewRequest,
            api::review::RespondToReviewRequest,
            common::model::review::Review,

            // Notification API
            common::model::notification::Notification,
            common::model::notification::NotificationKind,

            // Response models
            api::response::ApiResponse<common::model::booking::Booking>,
            api::response::ApiResponse<common::model::payment::Payment>,
            api::response::ApiResponse<common::model::review::Review>,
            api::response::ApiResponse<common::model::credits::CreditEntry>,
            api::response::ApiListResponse<common::model::notification::Notification>,
            api::response::ResponseMetadata
        )
    ),
    tags(
        (name = "booking", description = "Booking lifecycle endpoints"),
        (name = "payment", description = "Payment and refund endpoints"),
        (name = "credits", description = "Credit ledger endpoints"),
        (name = "review", description = "Review endpoints"),
        (name = "notification", description = "Stored notification endpoints"),
        (name = "webhook", description = "Gateway webhook endpoint")
    ),
    info(
        title = "Servana Marketplace API",
        version = "1.0.0",
        description = "API for the marketplace backend covering bookings, payments, credits and reviews"
    )
)]
pub struct ApiDoc;
