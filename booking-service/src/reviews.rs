//! Review submission and provider rating aggregation
//!
//! A review may only be left once per completed booking. Each insertion
//! recomputes the provider's rating as the arithmetic mean of all their
//! reviews, rounded to 2 decimal places. The read-aggregate-write cycle is
//! serialized per provider so concurrent insertions cannot lose updates.

use std::sync::Arc;

use common::decimal::{precision, Rating};
use common::error::{Error, Result, ErrorExt};
use common::model::booking::BookingStatus;
use common::model::notification::NotificationKind;
use common::model::review::Review;
use common::notify::NotificationDispatcher;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use crate::repository::BookingRepository;

/// Review service
pub struct ReviewService {
    /// Repository for booking data (bookings, reviews, profiles)
    repo: Arc<dyn BookingRepository>,
    /// Notification fan-out
    notifier: Arc<dyn NotificationDispatcher>,
    /// Per-provider aggregation locks
    provider_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl ReviewService {
    /// Create a new review service
    pub fn new(repo: Arc<dyn BookingRepository>, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        Self {
            repo,
            notifier,
            provider_locks: DashMap::new(),
        }
    }

    /// Lock guarding rating recomputation for a single provider
    fn lock_for(&self, provider_id: Uuid) -> Arc<Mutex<()>> {
        self.provider_locks
            .entry(provider_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Get a review by ID
    pub async fn get_review(&self, id: Uuid) -> Result<Option<Review>> {
        self.repo.get_review(id).await
    }

    /// All reviews received by a provider
    pub async fn reviews_for_provider(&self, provider_id: Uuid) -> Result<Vec<Review>> {
        self.repo.reviews_for_provider(provider_id).await
    }

    /// Submit a review for a completed booking
    pub async fn submit_review(
        &self,
        actor: Uuid,
        booking_id: Uuid,
        rating: u8,
        comment: String,
    ) -> Result<Review> {
        let booking = self
            .repo
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| Error::BookingNotFound(format!("Booking not found: {}", booking_id)))?;

        if actor != booking.customer_id {
            return Err(Error::NotAuthorized(format!(
                "User {} is not the customer of booking {}",
                actor, booking_id
            )));
        }

        if booking.status != BookingStatus::Completed {
            return Err(Error::BookingNotCompleted(format!(
                "Booking {} is {}, only completed bookings can be reviewed",
                booking_id, booking.status
            )));
        }

        // Serialize against other review insertions for the same provider
        let lock = self.lock_for(booking.provider_id);
        let _guard = lock.lock().await;

        if self.repo.review_for_booking(booking_id).await?.is_some() {
            return Err(Error::DuplicateReview(format!(
                "Booking {} already has a review",
                booking_id
            )));
        }

        let review = Review::new(
            booking_id,
            booking.service_id,
            booking.customer_id,
            booking.provider_id,
            rating,
            comment,
        )?;

        let transaction = self.repo.begin_transaction().await
            .with_context(|| format!("Failed to start transaction for review of booking {}", booking_id))?;

        let transaction_result = async {
            let review = self.repo.insert_review(review).await
                .with_context(|| format!("Failed to insert review for booking {}", booking_id))?;

            let rating = self.recompute_rating(booking.provider_id).await
                .with_context(|| format!("Failed to recompute rating for provider {}", booking.provider_id))?;

            let mut profile = self.repo.ensure_profile(booking.provider_id).await?;
            profile.set_rating(rating);
            self.repo.update_profile(profile).await?;

            Ok(review)
        }
        .await;

        match transaction_result {
            Ok(review) => {
                transaction.commit().await
                    .with_context(|| format!("Failed to commit review for booking {}", booking_id))?;

                info!(
                    "Review {} recorded for provider {} ({} stars)",
                    review.id, booking.provider_id, review.rating
                );

                self.notifier
                    .notify(
                        booking.provider_id,
                        NotificationKind::Review,
                        "New review",
                        &format!("You received a {}-star review", review.rating),
                        Some(booking_id),
                    )
                    .await;

                Ok(review)
            }
            Err(e) => {
                error!("Error recording review for booking {}: {}", booking_id, e);

                if let Err(rollback_err) = transaction.rollback().await {
                    error!("Failed to roll back transaction: {}", rollback_err);
                }

                Err(e)
            }
        }
    }

    /// Provider responds to a review
    pub async fn respond_to_review(&self, actor: Uuid, review_id: Uuid, response: String) -> Result<Review> {
        let mut review = self
            .repo
            .get_review(review_id)
            .await?
            .ok_or_else(|| Error::ReviewNotFound(format!("Review not found: {}", review_id)))?;

        if actor != review.provider_id {
            return Err(Error::NotAuthorized(format!(
                "User {} is not the provider reviewed in {}",
                actor, review_id
            )));
        }

        review.set_response(response);
        self.repo.update_review(review).await
    }

    /// Mean of all the provider's review ratings, rounded to 2 decimals
    async fn recompute_rating(&self, provider_id: Uuid) -> Result<Rating> {
        let reviews = self.repo.reviews_for_provider(provider_id).await?;

        if reviews.is_empty() {
            return Ok(Rating::ZERO);
        }

        let sum: Decimal = reviews.iter().map(|r| Decimal::from(r.rating)).sum();
        let mean = sum / Decimal::from(reviews.len() as u64);

        Ok(precision::round_rating(mean))
    }
}
