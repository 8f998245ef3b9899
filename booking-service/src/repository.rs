//! Repository for bookings, provider profiles and reviews

use async_trait::async_trait;
use common::db::models::{DbBooking, DbProviderProfile, DbReview};
use common::db::{InMemoryTransactionManager, PgTransactionManager};
use common::error::{Error, Result};
use common::model::booking::Booking;
use common::model::provider::ProviderProfile;
use common::model::review::Review;
use common::{DBTransaction, TransactionManager};
use dashmap::DashMap;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

/// Booking repository trait defining the interface for booking data storage
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Get the transaction manager
    fn transaction_manager(&self) -> &dyn TransactionManager;

    /// Persist a new booking
    async fn create_booking(&self, booking: Booking) -> Result<Booking>;

    /// Get a booking by ID
    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>>;

    /// Persist booking mutations
    async fn update_booking(&self, booking: Booking) -> Result<Booking>;

    /// Bookings where the given user is the customer
    async fn bookings_for_customer(&self, customer_id: Uuid) -> Result<Vec<Booking>>;

    /// Bookings where the given user is the provider
    async fn bookings_for_provider(&self, provider_id: Uuid) -> Result<Vec<Booking>>;

    /// Get a provider profile
    async fn get_profile(&self, provider_id: Uuid) -> Result<Option<ProviderProfile>>;

    /// Ensure a provider profile exists, creating a zeroed one if necessary
    async fn ensure_profile(&self, provider_id: Uuid) -> Result<ProviderProfile>;

    /// Persist profile mutations
    async fn update_profile(&self, profile: ProviderProfile) -> Result<ProviderProfile>;

    /// Persist a new review
    async fn insert_review(&self, review: Review) -> Result<Review>;

    /// Get a review by ID
    async fn get_review(&self, id: Uuid) -> Result<Option<Review>>;

    /// Get the review for a booking, if one exists
    async fn review_for_booking(&self, booking_id: Uuid) -> Result<Option<Review>>;

    /// All reviews received by a provider
    async fn reviews_for_provider(&self, provider_id: Uuid) -> Result<Vec<Review>>;

    /// Persist review mutations (provider response only)
    async fn update_review(&self, review: Review) -> Result<Review>;

    /// Begin a database transaction
    async fn begin_transaction(&self) -> Result<DBTransaction> {
        self.transaction_manager().begin_transaction().await
    }
}

/// In-memory repository for booking data
pub struct InMemoryBookingRepository {
    /// Bookings by ID
    pub bookings: DashMap<Uuid, Booking>,
    /// Provider profiles by provider ID
    pub profiles: DashMap<Uuid, ProviderProfile>,
    /// Reviews by ID
    pub reviews: DashMap<Uuid, Review>,
    /// Review lookup by booking ID
    review_by_booking: DashMap<Uuid, Uuid>,
    /// Transaction manager
    transaction_manager: InMemoryTransactionManager,
}

impl InMemoryBookingRepository {
    /// Create a new in-memory booking repository
    pub fn new() -> Self {
        Self {
            bookings: DashMap::new(),
            profiles: DashMap::new(),
            reviews: DashMap::new(),
            review_by_booking: DashMap::new(),
            transaction_manager: InMemoryTransactionManager::new(),
        }
    }
}

impl Default for InMemoryBookingRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn create_booking(&self, booking: Booking) -> Result<Booking> {
        self.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        Ok(self.bookings.get(&id).map(|b| b.clone()))
    }

    async fn update_booking(&self, booking: Booking) -> Result<Booking> {
        self.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn bookings_for_customer(&self, customer_id: Uuid) -> Result<Vec<Booking>> {
        Ok(self
            .bookings
            .iter()
            .filter(|entry| entry.value().customer_id == customer_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn bookings_for_provider(&self, provider_id: Uuid) -> Result<Vec<Booking>> {
        Ok(self
            .bookings
            .iter()
            .filter(|entry| entry.value().provider_id == provider_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn get_profile(&self, provider_id: Uuid) -> Result<Option<ProviderProfile>> {
        Ok(self.profiles.get(&provider_id).map(|p| p.clone()))
    }

    async fn ensure_profile(&self, provider_id: Uuid) -> Result<ProviderProfile> {
        Ok(self
            .profiles
            .entry(provider_id)
            .or_insert_with(|| ProviderProfile::new(provider_id))
            .clone())
    }

    async fn update_profile(&self, profile: ProviderProfile) -> Result<ProviderProfile> {
        self.profiles.insert(profile.user_id, profile.clone());
        Ok(profile)
    }

    async fn insert_review(&self, review: Review) -> Result<Review> {
        self.review_by_booking.insert(review.booking_id, review.id);
        self.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn get_review(&self, id: Uuid) -> Result<Option<Review>> {
        Ok(self.reviews.get(&id).map(|r| r.clone()))
    }

    async fn review_for_booking(&self, booking_id: Uuid) -> Result<Option<Review>> {
        Ok(self
            .review_by_booking
            .get(&booking_id)
            .and_then(|id| self.reviews.get(&id).map(|r| r.clone())))
    }

    async fn reviews_for_provider(&self, provider_id: Uuid) -> Result<Vec<Review>> {
        Ok(self
            .reviews
            .iter()
            .filter(|entry| entry.value().provider_id == provider_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn update_review(&self, review: Review) -> Result<Review> {
        self.reviews.insert(review.id, review.clone());
        Ok(review)
    }
}

/// PostgreSQL repository for booking data
pub struct PostgresBookingRepository {
    /// Database connection pool
    pool: PgPool,
    /// Transaction manager
    transaction_manager: PgTransactionManager,
}

impl PostgresBookingRepository {
    /// Create a new PostgreSQL booking repository
    pub async fn new(database_url: Option<String>) -> Result<Self> {
        let pool = match database_url {
            Some(url) => PgPoolOptions::new()
                .max_connections(5)
                .connect(&url)
                .await
                .map_err(Error::Database)?,
            None => {
                let database_url = std::env::var("DATABASE_URL")
                    .map_err(|_| Error::ConfigurationError("DATABASE_URL must be set".to_string()))?;

                PgPoolOptions::new()
                    .max_connections(5)
                    .connect(&database_url)
                    .await
                    .map_err(Error::Database)?
            }
        };

        info!("Connected to PostgreSQL database");

        Ok(Self {
            transaction_manager: PgTransactionManager::new(pool.clone()),
            pool,
        })
    }

    /// Create a new PostgreSQL booking repository with configuration
    pub async fn with_config(config: &crate::config::BookingServiceConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_pool_size)
            .connect(&config.database_url)
            .await
            .map_err(Error::Database)?;

        info!("Connected to PostgreSQL database");

        Ok(Self {
            transaction_manager: PgTransactionManager::new(pool.clone()),
            pool,
        })
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn create_booking(&self, booking: Booking) -> Result<Booking> {
        debug!("Creating booking {} in database", booking.id);

        sqlx::query(
            "INSERT INTO bookings
                 (id, customer_id, provider_id, service_id, scheduled_date, scheduled_time,
                  status, notes, total_amount, payment_method, is_paid, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        )
        .bind(booking.id)
        .bind(booking.customer_id)
        .bind(booking.provider_id)
        .bind(booking.service_id)
        .bind(booking.scheduled_date)
        .bind(booking.scheduled_time)
        .bind(booking.status.as_str())
        .bind(&booking.notes)
        .bind(booking.total_amount)
        .bind(booking.payment_method.as_str())
        .bind(booking.is_paid)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        debug!("Getting booking from database: {}", id);

        let row = sqlx::query_as::<_, DbBooking>(
            "SELECT id, customer_id, provider_id, service_id, scheduled_date, scheduled_time,
                    status, notes, total_amount, payment_method, is_paid, created_at, updated_at
             FROM bookings
             WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn update_booking(&self, booking: Booking) -> Result<Booking> {
        debug!("Updating booking {} in database", booking.id);

        let result = sqlx::query(
            "UPDATE bookings
             SET scheduled_date = $2, scheduled_time = $3, status = $4, notes = $5,
                 is_paid = $6, updated_at = $7
             WHERE id = $1"
        )
        .bind(booking.id)
        .bind(booking.scheduled_date)
        .bind(booking.scheduled_time)
        .bind(booking.status.as_str())
        .bind(&booking.notes)
        .bind(booking.is_paid)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::BookingNotFound(format!("Booking not found: {}", booking.id)));
        }

        Ok(booking)
    }

    async fn bookings_for_customer(&self, customer_id: Uuid) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, DbBooking>(
            "SELECT id, customer_id, provider_id, service_id, scheduled_date, scheduled_time,
                    status, notes, total_amount, payment_method, is_paid, created_at, updated_at
             FROM bookings
             WHERE customer_id = $1
             ORDER BY created_at DESC"
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn bookings_for_provider(&self, provider_id: Uuid) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, DbBooking>(
            "SELECT id, customer_id, provider_id, service_id, scheduled_date, scheduled_time,
                    status, notes, total_amount, payment_method, is_paid, created_at, updated_at
             FROM bookings
             WHERE provider_id = $1
             ORDER BY created_at DESC"
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn get_profile(&self, provider_id: Uuid) -> Result<Option<ProviderProfile>> {
        let row = sqlx::query_as::<_, DbProviderProfile>(
            "SELECT user_id, rating, total_earnings, jobs_completed, created_at, updated_at
             FROM provider_profiles
             WHERE user_id = $1"
        )
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProviderProfile::from))
    }

    async fn ensure_profile(&self, provider_id: Uuid) -> Result<ProviderProfile> {
        if let Some(profile) = self.get_profile(provider_id).await? {
            return Ok(profile);
        }

        let profile = ProviderProfile::new(provider_id);

        sqlx::query(
            "INSERT INTO provider_profiles (user_id, rating, total_earnings, jobs_completed, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (user_id) DO NOTHING"
        )
        .bind(profile.user_id)
        .bind(profile.rating)
        .bind(profile.total_earnings)
        .bind(profile.jobs_completed as i32)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn update_profile(&self, profile: ProviderProfile) -> Result<ProviderProfile> {
        let result = sqlx::query(
            "UPDATE provider_profiles
             SET rating = $2, total_earnings = $3, jobs_completed = $4, updated_at = $5
             WHERE user_id = $1"
        )
        .bind(profile.user_id)
        .bind(profile.rating)
        .bind(profile.total_earnings)
        .bind(profile.jobs_completed as i32)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::Internal(format!(
                "Failed to update profile for provider: {}",
                profile.user_id
            )));
        }

        Ok(profile)
    }

    async fn insert_review(&self, review: Review) -> Result<Review> {
        debug!("Inserting review {} for booking {}", review.id, review.booking_id);

        sqlx::query(
            "INSERT INTO reviews
                 (id, booking_id, service_id, customer_id, provider_id, rating, comment,
                  provider_response, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        )
        .bind(review.id)
        .bind(review.booking_id)
        .bind(review.service_id)
        .bind(review.customer_id)
        .bind(review.provider_id)
        .bind(review.rating as i32)
        .bind(&review.comment)
        .bind(&review.provider_response)
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(review)
    }

    async fn get_review(&self, id: Uuid) -> Result<Option<Review>> {
        let row = sqlx::query_as::<_, DbReview>(
            "SELECT id, booking_id, service_id, customer_id, provider_id, rating, comment,
                    provider_response, created_at, updated_at
             FROM reviews
             WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Review::try_from).transpose()
    }

    async fn review_for_booking(&self, booking_id: Uuid) -> Result<Option<Review>> {
        let row = sqlx::query_as::<_, DbReview>(
            "SELECT id, booking_id, service_id, customer_id, provider_id, rating, comment,
                    provider_response, created_at, updated_at
             FROM reviews
             WHERE booking_id = $1"
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Review::try_from).transpose()
    }

    async fn reviews_for_provider(&self, provider_id: Uuid) -> Result<Vec<Review>> {
        let rows = sqlx::query_as::<_, DbReview>(
            "SELECT id, booking_id, service_id, customer_id, provider_id, rating, comment,
                    provider_response, created_at, updated_at
             FROM reviews
             WHERE provider_id = $1
             ORDER BY created_at"
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Review::try_from).collect()
    }

    async fn update_review(&self, review: Review) -> Result<Review> {
        let result = sqlx::query(
            "UPDATE reviews SET provider_response = $2, updated_at = $3 WHERE id = $1"
        )
        .bind(review.id)
        .bind(&review.provider_response)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ReviewNotFound(format!("Review not found: {}", review.id)));
        }

        Ok(review)
    }
}
