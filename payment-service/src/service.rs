//! Payment orchestration service implementation
//!
//! Selects the payment strategy for each request (credits, installment plan,
//! gateway-immediate, gateway-deferred), records Payment and Installment
//! rows, and reconciles asynchronous gateway webhook events back into
//! payment and booking state. Webhook reconciliation is idempotent: the
//! gateway delivers at-least-once, and a replay must never double-apply.

use std::sync::Arc;

use booking_service::BookingService;
use chrono::{Duration, Utc};
use common::decimal::{precision, Amount};
use common::directory::Directory;
use common::error::{Error, Result, ErrorExt};
use common::model::booking::{Booking, PaymentMethod};
use common::model::notification::NotificationKind;
use common::model::payment::{Installment, Payment, PaymentStatus, PaymentType};
use common::notify::NotificationDispatcher;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::gateway::{GatewayEvent, GatewayEventType, PaymentGateway, INTENT_SUCCEEDED};
use crate::repository::PaymentRepository;

/// Smallest allowed installment plan
const MIN_INSTALLMENTS: u32 = 2;
/// Largest allowed installment plan
const MAX_INSTALLMENTS: u32 = 12;
/// Default plan size when the request does not specify one
const DEFAULT_INSTALLMENTS: u32 = 3;
/// Days between consecutive installment due dates
const INSTALLMENT_INTERVAL_DAYS: i64 = 30;

/// Payment request payload
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
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

/// Result of a processed payment request
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    /// The recorded payment
    pub payment: Payment,
    /// Installment plan, when one was created
    pub installments: Vec<Installment>,
    /// Client secret for deferred gateway confirmation
    pub client_secret: Option<String>,
}

impl PaymentOutcome {
    fn settled(payment: Payment) -> Self {
        Self {
            payment,
            installments: Vec::new(),
            client_secret: None,
        }
    }
}

/// Payment orchestration service
pub struct PaymentOrchestrator {
    /// Repository for payment data
    repo: Arc<dyn PaymentRepository>,
    /// Booking lifecycle service
    bookings: Arc<BookingService>,
    /// Credit ledger for credits payments
    ledger: Arc<credit_ledger::CreditLedger>,
    /// Read-only user/service directory
    directory: Arc<dyn Directory>,
    /// External payment gateway client
    gateway: Arc<dyn PaymentGateway>,
    /// Notification fan-out
    notifier: Arc<dyn NotificationDispatcher>,
    /// Currency passed to the gateway
    currency: String,
}

impl PaymentOrchestrator {
    /// Create a new payment orchestrator
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: Arc<dyn PaymentRepository>,
        bookings: Arc<BookingService>,
        ledger: Arc<credit_ledger::CreditLedger>,
        directory: Arc<dyn Directory>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationDispatcher>,
        currency: String,
    ) -> Self {
        Self {
            repo,
            bookings,
            ledger,
            directory,
            gateway,
            notifier,
            currency,
        }
    }

    /// Get a payment by ID
    pub async fn get_payment(&self, id: Uuid) -> Result<Option<Payment>> {
        self.repo.get_payment(id).await
    }

    /// Installments of a payment, ordered by number
    pub async fn installments(&self, payment_id: Uuid) -> Result<Vec<Installment>> {
        self.repo.installments_for_payment(payment_id).await
    }

    /// All payments recorded against a booking
    pub async fn payments_for_booking(&self, booking_id: Uuid) -> Result<Vec<Payment>> {
        self.repo.payments_for_booking(booking_id).await
    }

    /// Process a payment request for a booking
    pub async fn process_payment(&self, actor: Uuid, request: PaymentRequest) -> Result<PaymentOutcome> {
        let booking = self
            .bookings
            .get_booking(request.booking_id)
            .await?
            .ok_or_else(|| Error::BookingNotFound(format!("Booking not found: {}", request.booking_id)))?;

        if actor != booking.customer_id {
            return Err(Error::NotAuthorized(format!(
                "User {} is not the customer of booking {}",
                actor, booking.id
            )));
        }

        if booking.is_paid {
            return Err(Error::AlreadyPaid(format!("Booking {} is already paid", booking.id)));
        }

        info!(
            "Processing {} payment for booking {} via {}",
            request.payment_type.as_str(),
            booking.id,
            request.payment_method.as_str()
        );

        if request.payment_method == PaymentMethod::Credits {
            return self.pay_with_credits(&booking, &request).await;
        }

        match request.payment_type {
            PaymentType::Installment => self.create_installment_plan(&booking, &request).await,
            PaymentType::Immediate => self.charge_immediate(&booking, &request).await,
            PaymentType::Later => self.charge_later(&booking, &request).await,
            PaymentType::Credits => Err(Error::ValidationError(
                "Credits payments must use the credits payment method".to_string(),
            )),
        }
    }

    /// Settle a booking from the customer's credit balance
    ///
    /// The ledger debit, the Payment row and the booking's paid flag are one
    /// atomic unit; the debit is validated first so an insufficient balance
    /// leaves every table untouched.
    async fn pay_with_credits(&self, booking: &Booking, request: &PaymentRequest) -> Result<PaymentOutcome> {
        let service = self
            .directory
            .get_service(booking.service_id)
            .await?
            .ok_or_else(|| Error::ServiceNotFound(format!("Service not found: {}", booking.service_id)))?;

        let transaction = self.repo.begin_transaction().await
            .with_context(|| format!("Failed to start transaction for booking {}", booking.id))?;

        let transaction_result = async {
            // Debit first: it performs the balance check and fails before
            // anything else is written
            self.ledger
                .debit(booking.customer_id, service.credits_required, booking.id)
                .await?;

            let payment = Payment::new(
                booking.id,
                booking.customer_id,
                booking.total_amount,
                request.payment_type,
                PaymentMethod::Credits,
            )
            .with_status(PaymentStatus::Completed);

            let payment = self.repo.insert_payment(payment).await
                .with_context(|| format!("Failed to insert credits payment for booking {}", booking.id))?;

            self.bookings.mark_paid(booking.id).await
                .with_context(|| format!("Failed to mark booking {} paid", booking.id))?;

            Ok(payment)
        }
        .await;

        match transaction_result {
            Ok(payment) => {
                transaction.commit().await
                    .with_context(|| format!("Failed to commit credits payment for booking {}", booking.id))?;

                info!("Booking {} paid with {} credits", booking.id, service.credits_required);

                self.notifier
                    .notify(
                        booking.customer_id,
                        NotificationKind::Payment,
                        "Payment received",
                        &format!("{} credits were applied to your booking", service.credits_required),
                        Some(booking.id),
                    )
                    .await;

                Ok(PaymentOutcome::settled(payment))
            }
            Err(e) => {
                error!("Error paying booking {} with credits: {}", booking.id, e);

                if let Err(rollback_err) = transaction.rollback().await {
                    error!("Failed to roll back transaction: {}", rollback_err);
                }

                Err(e)
            }
        }
    }

    /// Create a Payment in the processing state with its installment plan
    ///
    /// The booking stays unpaid until all installments settle; settlement
    /// itself is out of scope for this core.
    async fn create_installment_plan(&self, booking: &Booking, request: &PaymentRequest) -> Result<PaymentOutcome> {
        let count = request.installment_count.unwrap_or(DEFAULT_INSTALLMENTS);

        if !(MIN_INSTALLMENTS..=MAX_INSTALLMENTS).contains(&count) {
            return Err(Error::ValidationError(format!(
                "Installment count must be between {} and {}, got {}",
                MIN_INSTALLMENTS, MAX_INSTALLMENTS, count
            )));
        }

        let amounts = precision::split_amount(booking.total_amount, count);

        let payment = Payment::new(
            booking.id,
            booking.customer_id,
            booking.total_amount,
            PaymentType::Installment,
            request.payment_method,
        )
        .with_status(PaymentStatus::Processing);

        let today = Utc::now().date_naive();
        let installments: Vec<Installment> = amounts
            .into_iter()
            .enumerate()
            .map(|(i, amount)| {
                let due_date = today + Duration::days(INSTALLMENT_INTERVAL_DAYS * (i as i64 + 1));
                Installment::new(payment.id, i as u32 + 1, amount, due_date)
            })
            .collect();

        let payment = self.repo.insert_payment(payment).await?;
        let installments = self.repo.insert_installments(installments).await?;

        info!(
            "Created {}-installment plan for booking {} totalling {}",
            installments.len(),
            booking.id,
            payment.amount
        );

        Ok(PaymentOutcome {
            payment,
            installments,
            client_secret: None,
        })
    }

    /// Charge the gateway synchronously and settle the booking
    ///
    /// Any gateway failure aborts before a Payment row exists, so a failed
    /// attempt leaves no partial state.
    async fn charge_immediate(&self, booking: &Booking, request: &PaymentRequest) -> Result<PaymentOutcome> {
        let customer_ref = request
            .gateway_token
            .clone()
            .unwrap_or_else(|| booking.customer_id.to_string());

        let intent = self
            .gateway
            .create_intent(
                booking.total_amount,
                &self.currency,
                &customer_ref,
                serde_json::json!({ "booking_id": booking.id }),
            )
            .await?;

        let status = self.gateway.confirm(&intent.id).await?;
        if status != INTENT_SUCCEEDED {
            return Err(Error::GatewayError(format!(
                "Intent {} did not succeed: {}",
                intent.id, status
            )));
        }

        let mut payment = Payment::new(
            booking.id,
            booking.customer_id,
            booking.total_amount,
            PaymentType::Immediate,
            request.payment_method,
        )
        .with_status(PaymentStatus::Completed)
        .with_transaction_id(intent.id.clone());
        payment.gateway_response = Some(serde_json::json!({ "intent": intent.id, "status": status }));

        let payment = self.repo.insert_payment(payment).await?;
        self.bookings.mark_paid(booking.id).await?;

        info!("Booking {} settled immediately via intent {}", booking.id, intent.id);

        self.notifier
            .notify(
                booking.customer_id,
                NotificationKind::Payment,
                "Payment received",
                "Your payment was processed",
                Some(booking.id),
            )
            .await;

        Ok(PaymentOutcome::settled(payment))
    }

    /// Create a deferred charge; the booking settles when the gateway's
    /// confirmation webhook arrives
    async fn charge_later(&self, booking: &Booking, request: &PaymentRequest) -> Result<PaymentOutcome> {
        let customer_ref = request
            .gateway_token
            .clone()
            .unwrap_or_else(|| booking.customer_id.to_string());

        let intent = self
            .gateway
            .create_intent(
                booking.total_amount,
                &self.currency,
                &customer_ref,
                serde_json::json!({ "booking_id": booking.id }),
            )
            .await?;

        let payment = Payment::new(
            booking.id,
            booking.customer_id,
            booking.total_amount,
            PaymentType::Later,
            request.payment_method,
        )
        .with_transaction_id(intent.id.clone());

        let payment = self.repo.insert_payment(payment).await?;

        debug!("Deferred payment {} awaiting confirmation of intent {}", payment.id, intent.id);

        Ok(PaymentOutcome {
            payment,
            installments: Vec::new(),
            client_secret: Some(intent.client_secret),
        })
    }

    /// Reconcile an authenticated gateway webhook event
    ///
    /// Events are matched by transaction ID. An event for an unknown
    /// transaction is logged and swallowed; a replay of an already-applied
    /// event is a no-op, not an error.
    pub async fn handle_webhook(&self, event: GatewayEvent) -> Result<()> {
        let payment = match self.repo.get_payment_by_transaction(&event.object_id).await? {
            Some(payment) => payment,
            None => {
                warn!("Webhook for unknown transaction {}; ignoring", event.object_id);
                return Ok(());
            }
        };

        match event.event_type {
            GatewayEventType::PaymentSucceeded => self.apply_success(payment, event).await,
            GatewayEventType::PaymentFailed | GatewayEventType::PaymentCanceled => {
                self.apply_failure(payment, event).await
            }
            GatewayEventType::ChargeRefunded => self.apply_refund(payment).await,
        }
    }

    async fn apply_success(&self, mut payment: Payment, event: GatewayEvent) -> Result<()> {
        if !payment.status.is_open() {
            debug!("Payment {} already {}, replay ignored", payment.id, payment.status);
            return Ok(());
        }

        payment.set_status(PaymentStatus::Completed);
        payment.gateway_response = Some(event.raw_payload);
        let payment = self.repo.update_payment(payment).await?;

        self.bookings.mark_paid(payment.booking_id).await?;
        self.bookings.confirm_if_pending(payment.booking_id).await?;

        info!("Payment {} completed via webhook", payment.id);

        self.notifier
            .notify(
                payment.user_id,
                NotificationKind::Payment,
                "Payment confirmed",
                "Your payment was confirmed",
                Some(payment.booking_id),
            )
            .await;

        Ok(())
    }

    async fn apply_failure(&self, mut payment: Payment, event: GatewayEvent) -> Result<()> {
        if !payment.status.is_open() {
            debug!("Payment {} already {}, replay ignored", payment.id, payment.status);
            return Ok(());
        }

        payment.set_status(PaymentStatus::Failed);
        payment.gateway_response = Some(event.raw_payload);
        let payment = self.repo.update_payment(payment).await?;

        info!("Payment {} failed via webhook", payment.id);

        self.notifier
            .notify(
                payment.user_id,
                NotificationKind::Payment,
                "Payment failed",
                "Your payment could not be processed",
                Some(payment.booking_id),
            )
            .await;

        Ok(())
    }

    async fn apply_refund(&self, mut payment: Payment) -> Result<()> {
        if payment.status != PaymentStatus::Completed {
            debug!("Payment {} is {}, refund event ignored", payment.id, payment.status);
            return Ok(());
        }

        payment.set_status(PaymentStatus::Refunded);
        self.repo.update_payment(payment.clone()).await?;

        info!("Payment {} refunded via webhook", payment.id);
        Ok(())
    }

    /// User-initiated refund of a completed payment
    ///
    /// Cascades into the booking: a refunded booking is cancelled, which in
    /// turn restores credits when the booking was credits-paid.
    pub async fn refund_payment(&self, actor: Uuid, payment_id: Uuid, amount: Option<Amount>) -> Result<Payment> {
        let mut payment = self
            .repo
            .get_payment(payment_id)
            .await?
            .ok_or_else(|| Error::PaymentNotFound(format!("Payment not found: {}", payment_id)))?;

        if actor != payment.user_id {
            return Err(Error::NotAuthorized(format!(
                "User {} did not make payment {}",
                actor, payment_id
            )));
        }

        match payment.status {
            PaymentStatus::Refunded => {
                return Err(Error::AlreadyRefunded(format!(
                    "Payment {} was already refunded",
                    payment_id
                )));
            }
            PaymentStatus::Completed => {}
            other => {
                return Err(Error::ValidationError(format!(
                    "Only completed payments can be refunded, payment {} is {}",
                    payment_id, other
                )));
            }
        }

        // Real-money payments are reversed at the gateway first; a gateway
        // failure leaves the payment untouched
        if let Some(transaction_id) = payment.transaction_id.clone() {
            let refund = self.gateway.refund(&transaction_id, amount).await?;
            info!("Gateway refund {} issued for payment {}", refund.id, payment_id);
        }

        payment.set_status(PaymentStatus::Refunded);
        let payment = self.repo.update_payment(payment).await?;

        self.bookings.cancel_for_refund(payment.booking_id).await?;

        self.notifier
            .notify(
                payment.user_id,
                NotificationKind::Payment,
                "Refund processed",
                "Your payment was refunded",
                Some(payment.booking_id),
            )
            .await;

        Ok(payment)
    }
}
