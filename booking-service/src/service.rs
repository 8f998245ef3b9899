//! Booking lifecycle service implementation
//!
//! Governs the booking state machine: pending -> confirmed -> ongoing ->
//! completed, with cancellation reachable from any non-terminal state and no
//! transition out of a terminal state. Transitions for the same booking are
//! serialized through a per-booking lock so completion side effects (provider
//! earnings) apply exactly once.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use common::directory::Directory;
use common::error::{Error, Result, ErrorExt};
use common::model::booking::{Booking, BookingStatus, PaymentMethod};
use common::model::notification::NotificationKind;
use common::model::provider::ProviderProfile;
use common::notify::NotificationDispatcher;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::repository::BookingRepository;

/// Request payload for creating a booking
#[derive(Debug, Clone)]
pub struct NewBooking {
    /// Service offering to book
    pub service_id: Uuid,
    /// Requested date
    pub scheduled_date: NaiveDate,
    /// Requested time of day
    pub scheduled_time: NaiveTime,
    /// Payment instrument the customer intends to use
    pub payment_method: PaymentMethod,
    /// Free-form notes for the provider
    pub notes: String,
}

/// Booking lifecycle service
pub struct BookingService {
    /// Repository for booking data
    repo: Arc<dyn BookingRepository>,
    /// Credit ledger, consulted for credits refunds on cancellation
    ledger: Arc<credit_ledger::CreditLedger>,
    /// Read-only user/service directory
    directory: Arc<dyn Directory>,
    /// Notification fan-out
    notifier: Arc<dyn NotificationDispatcher>,
    /// Per-booking transition locks
    booking_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl BookingService {
    /// Create a new booking service
    pub fn new(
        repo: Arc<dyn BookingRepository>,
        ledger: Arc<credit_ledger::CreditLedger>,
        directory: Arc<dyn Directory>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            repo,
            ledger,
            directory,
            notifier,
            booking_locks: DashMap::new(),
        }
    }

    /// Lock guarding transitions for a single booking
    fn lock_for(&self, booking_id: Uuid) -> Arc<Mutex<()>> {
        self.booking_locks
            .entry(booking_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Get a booking by ID
    pub async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        self.repo.get_booking(id).await
    }

    /// Bookings requested by a customer
    pub async fn bookings_for_customer(&self, customer_id: Uuid) -> Result<Vec<Booking>> {
        self.repo.bookings_for_customer(customer_id).await
    }

    /// Bookings assigned to a provider
    pub async fn bookings_for_provider(&self, provider_id: Uuid) -> Result<Vec<Booking>> {
        self.repo.bookings_for_provider(provider_id).await
    }

    /// Aggregate profile for a provider
    pub async fn provider_profile(&self, provider_id: Uuid) -> Result<ProviderProfile> {
        self.repo.ensure_profile(provider_id).await
    }

    /// Create a new booking in the pending state
    pub async fn create_booking(&self, customer_id: Uuid, request: NewBooking) -> Result<Booking> {
        let service = self
            .directory
            .get_service(request.service_id)
            .await?
            .ok_or_else(|| Error::ServiceNotFound(format!("Service not found: {}", request.service_id)))?;

        let booking = Booking::new(
            customer_id,
            service.provider_id,
            service.id,
            request.scheduled_date,
            request.scheduled_time,
            service.price,
            request.payment_method,
            request.notes,
        );

        info!("Creating booking {} for service {}", booking.id, service.id);

        let booking = self.repo.create_booking(booking).await?;

        self.notifier
            .notify(
                booking.provider_id,
                NotificationKind::Booking,
                "New booking request",
                &format!("You have a new request for {}", service.title),
                Some(booking.id),
            )
            .await;

        Ok(booking)
    }

    /// Provider accepts a pending booking
    pub async fn accept(&self, booking_id: Uuid, actor: Uuid) -> Result<Booking> {
        let lock = self.lock_for(booking_id);
        let _guard = lock.lock().await;

        let mut booking = self.fetch(booking_id).await?;
        self.require_provider(&booking, actor, "accept")?;

        if booking.status != BookingStatus::Pending {
            return Err(Error::InvalidTransition {
                current: booking.status,
                attempted: "accept".to_string(),
            });
        }

        booking.status = BookingStatus::Confirmed;
        booking.updated_at = Utc::now();
        let booking = self.repo.update_booking(booking).await?;

        info!("Booking {} accepted by provider {}", booking_id, actor);

        self.notifier
            .notify(
                booking.customer_id,
                NotificationKind::Booking,
                "Booking confirmed",
                "Your booking request was accepted",
                Some(booking.id),
            )
            .await;

        Ok(booking)
    }

    /// Provider declines a pending booking
    pub async fn decline(&self, booking_id: Uuid, actor: Uuid) -> Result<Booking> {
        let lock = self.lock_for(booking_id);
        let _guard = lock.lock().await;

        let mut booking = self.fetch(booking_id).await?;
        self.require_provider(&booking, actor, "decline")?;

        if booking.status != BookingStatus::Pending {
            return Err(Error::InvalidTransition {
                current: booking.status,
                attempted: "decline".to_string(),
            });
        }

        booking.status = BookingStatus::Cancelled;
        booking.updated_at = Utc::now();
        let booking = self.repo.update_booking(booking).await?;

        info!("Booking {} declined by provider {}", booking_id, actor);

        self.notifier
            .notify(
                booking.customer_id,
                NotificationKind::Booking,
                "Booking declined",
                "Your booking request was declined",
                Some(booking.id),
            )
            .await;

        Ok(booking)
    }

    /// Provider marks a confirmed booking as started
    pub async fn start(&self, booking_id: Uuid, actor: Uuid) -> Result<Booking> {
        let lock = self.lock_for(booking_id);
        let _guard = lock.lock().await;

        let mut booking = self.fetch(booking_id).await?;
        self.require_provider(&booking, actor, "start")?;

        if booking.status != BookingStatus::Confirmed {
            return Err(Error::InvalidTransition {
                current: booking.status,
                attempted: "start".to_string(),
            });
        }

        booking.status = BookingStatus::Ongoing;
        booking.updated_at = Utc::now();
        self.repo.update_booking(booking).await
    }

    /// Provider completes a booking, crediting their aggregate stats
    ///
    /// The status write and the provider-stat update are applied within one
    /// transaction so earnings can never be double-applied.
    pub async fn complete(&self, booking_id: Uuid, actor: Uuid) -> Result<Booking> {
        let lock = self.lock_for(booking_id);
        let _guard = lock.lock().await;

        let mut booking = self.fetch(booking_id).await?;
        self.require_provider(&booking, actor, "complete")?;

        if !matches!(booking.status, BookingStatus::Confirmed | BookingStatus::Ongoing) {
            return Err(Error::InvalidTransition {
                current: booking.status,
                attempted: "complete".to_string(),
            });
        }

        booking.status = BookingStatus::Completed;
        booking.updated_at = Utc::now();

        // Start a database transaction covering the status write and the
        // provider-stat update
        let transaction = self.repo.begin_transaction().await
            .with_context(|| format!("Failed to start transaction for booking {}", booking_id))?;

        let transaction_result = async {
            let booking = self.repo.update_booking(booking.clone()).await
                .with_context(|| format!("Failed to update booking {}", booking_id))?;

            let mut profile = self.repo.ensure_profile(booking.provider_id).await
                .with_context(|| format!("Failed to load profile for provider {}", booking.provider_id))?;

            profile.record_completion(booking.total_amount);

            self.repo.update_profile(profile).await
                .with_context(|| format!("Failed to update profile for provider {}", booking.provider_id))?;

            Ok(booking)
        }
        .await;

        match transaction_result {
            Ok(booking) => {
                transaction.commit().await
                    .with_context(|| format!("Failed to commit completion of booking {}", booking_id))?;

                info!("Booking {} completed; provider {} credited", booking_id, booking.provider_id);

                self.notifier
                    .notify(
                        booking.customer_id,
                        NotificationKind::Booking,
                        "Booking completed",
                        "Your booking was marked as completed",
                        Some(booking.id),
                    )
                    .await;

                Ok(booking)
            }
            Err(e) => {
                error!("Error completing booking {}: {}", booking_id, e);

                if let Err(rollback_err) = transaction.rollback().await {
                    error!("Failed to roll back transaction: {}", rollback_err);
                }

                Err(e)
            }
        }
    }

    /// Customer or provider cancels a booking
    pub async fn cancel(&self, booking_id: Uuid, actor: Uuid) -> Result<Booking> {
        let lock = self.lock_for(booking_id);
        let _guard = lock.lock().await;

        let booking = self.fetch(booking_id).await?;

        if actor != booking.customer_id && actor != booking.provider_id {
            return Err(Error::NotAuthorized(format!(
                "User {} is neither customer nor provider of booking {}",
                actor, booking_id
            )));
        }

        let cancelled = self.cancel_locked(booking).await?;

        // Notify the counterparty of whoever cancelled
        let recipient = if actor == cancelled.customer_id {
            cancelled.provider_id
        } else {
            cancelled.customer_id
        };

        self.notifier
            .notify(
                recipient,
                NotificationKind::Booking,
                "Booking cancelled",
                "A booking you are part of was cancelled",
                Some(cancelled.id),
            )
            .await;

        Ok(cancelled)
    }

    /// System-initiated cancellation, used when a refund cascades into the
    /// booking state. Skips the actor check but keeps every other guard.
    pub async fn cancel_for_refund(&self, booking_id: Uuid) -> Result<Booking> {
        let lock = self.lock_for(booking_id);
        let _guard = lock.lock().await;

        let booking = self.fetch(booking_id).await?;

        // A refund against an already-cancelled booking is a no-op here
        if booking.status == BookingStatus::Cancelled {
            return Ok(booking);
        }

        let cancelled = self.cancel_locked(booking).await?;

        self.notifier
            .notify(
                cancelled.customer_id,
                NotificationKind::Payment,
                "Booking cancelled",
                "Your booking was cancelled following a refund",
                Some(cancelled.id),
            )
            .await;

        Ok(cancelled)
    }

    /// Shared cancellation path; caller must hold the booking lock
    async fn cancel_locked(&self, mut booking: Booking) -> Result<Booking> {
        if booking.is_terminal() {
            return Err(Error::InvalidTransition {
                current: booking.status,
                attempted: "cancel".to_string(),
            });
        }

        booking.status = BookingStatus::Cancelled;
        booking.updated_at = Utc::now();

        let refund_credits = booking.payment_method == PaymentMethod::Credits && booking.is_paid;

        let transaction = self.repo.begin_transaction().await
            .with_context(|| format!("Failed to start transaction for booking {}", booking.id))?;

        let transaction_result = async {
            let booking = self.repo.update_booking(booking.clone()).await
                .with_context(|| format!("Failed to update booking {}", booking.id))?;

            if refund_credits {
                let service = self
                    .directory
                    .get_service(booking.service_id)
                    .await?
                    .ok_or_else(|| Error::ServiceNotFound(format!("Service not found: {}", booking.service_id)))?;

                self.ledger
                    .refund(booking.customer_id, service.credits_required, booking.id)
                    .await
                    .with_context(|| format!("Failed to refund credits for booking {}", booking.id))?;
            }

            Ok(booking)
        }
        .await;

        match transaction_result {
            Ok(booking) => {
                transaction.commit().await
                    .with_context(|| format!("Failed to commit cancellation of booking {}", booking.id))?;

                info!("Booking {} cancelled", booking.id);
                Ok(booking)
            }
            Err(e) => {
                error!("Error cancelling booking {}: {}", booking.id, e);

                if let Err(rollback_err) = transaction.rollback().await {
                    error!("Failed to roll back transaction: {}", rollback_err);
                }

                Err(e)
            }
        }
    }

    /// Customer moves a booking to a new date/time
    pub async fn reschedule(
        &self,
        booking_id: Uuid,
        new_date: NaiveDate,
        new_time: NaiveTime,
        actor: Uuid,
    ) -> Result<Booking> {
        let lock = self.lock_for(booking_id);
        let _guard = lock.lock().await;

        let mut booking = self.fetch(booking_id).await?;

        if actor != booking.customer_id {
            return Err(Error::NotAuthorized(format!(
                "User {} is not the customer of booking {}",
                actor, booking_id
            )));
        }

        if !booking.can_reschedule() {
            return Err(Error::InvalidTransition {
                current: booking.status,
                attempted: "reschedule".to_string(),
            });
        }

        debug!("Rescheduling booking {} to {} {}", booking_id, new_date, new_time);

        booking.scheduled_date = new_date;
        booking.scheduled_time = new_time;
        booking.updated_at = Utc::now();
        self.repo.update_booking(booking).await
    }

    /// Mark a booking as paid after a successful payment
    pub async fn mark_paid(&self, booking_id: Uuid) -> Result<Booking> {
        let lock = self.lock_for(booking_id);
        let _guard = lock.lock().await;

        let mut booking = self.fetch(booking_id).await?;

        if booking.is_paid {
            return Ok(booking);
        }

        booking.is_paid = true;
        booking.updated_at = Utc::now();
        self.repo.update_booking(booking).await
    }

    /// Confirm a booking if it is still pending (used by gateway
    /// reconciliation after a successful deferred payment)
    pub async fn confirm_if_pending(&self, booking_id: Uuid) -> Result<Booking> {
        let lock = self.lock_for(booking_id);
        let _guard = lock.lock().await;

        let mut booking = self.fetch(booking_id).await?;

        if booking.status != BookingStatus::Pending {
            return Ok(booking);
        }

        booking.status = BookingStatus::Confirmed;
        booking.updated_at = Utc::now();
        self.repo.update_booking(booking).await
    }

    /// Fetch a booking or fail with BookingNotFound
    async fn fetch(&self, booking_id: Uuid) -> Result<Booking> {
        self.repo
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| Error::BookingNotFound(format!("Booking not found: {}", booking_id)))
    }

    /// Require the actor to be the booking's provider
    fn require_provider(&self, booking: &Booking, actor: Uuid, operation: &str) -> Result<()> {
        if actor != booking.provider_id {
            return Err(Error::NotAuthorized(format!(
                "User {} is not the provider of booking {} (attempted {})",
                actor, booking.id, operation
            )));
        }
        Ok(())
    }
}
