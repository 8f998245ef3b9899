//! Provider profile aggregates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Amount, Rating};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Per-provider aggregate state
///
/// `total_earnings` and `jobs_completed` are written only by booking
/// completion; `rating` only by review aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct ProviderProfile {
    /// Provider user ID
    pub user_id: Uuid,
    /// Average review rating, rounded to 2 decimal places
    pub rating: Rating,
    /// Lifetime earnings accumulator (monotonically increasing)
    pub total_earnings: Amount,
    /// Number of completed bookings
    pub jobs_completed: u32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ProviderProfile {
    /// Create a fresh profile with zeroed aggregates
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            rating: Rating::ZERO,
            total_earnings: Amount::ZERO,
            jobs_completed: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a completed booking
    pub fn record_completion(&mut self, amount: Amount) {
        self.jobs_completed += 1;
        self.total_earnings += amount;
        self.updated_at = Utc::now();
    }

    /// Replace the aggregated rating
    pub fn set_rating(&mut self, rating: Rating) {
        self.rating = rating;
        self.updated_at = Utc::now();
    }
}
