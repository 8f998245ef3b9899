//! Review models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Review left by a customer for a completed booking
///
/// One review per booking; the rating is immutable after creation. The
/// provider's response is the only field that may change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Review {
    /// Unique review ID
    pub id: Uuid,
    /// Booking being reviewed (unique per review)
    pub booking_id: Uuid,
    /// Service offering that was booked
    pub service_id: Uuid,
    /// Reviewing customer
    pub customer_id: Uuid,
    /// Reviewed provider
    pub provider_id: Uuid,
    /// Star rating, 1 to 5
    pub rating: u8,
    /// Free-form comment
    pub comment: String,
    /// Provider's public response, if any
    pub provider_response: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Review {
    /// Create a new review, validating the rating range
    pub fn new(
        booking_id: Uuid,
        service_id: Uuid,
        customer_id: Uuid,
        provider_id: Uuid,
        rating: u8,
        comment: String,
    ) -> Result<Self> {
        if !(1..=5).contains(&rating) {
            return Err(Error::ValidationError(format!(
                "Rating must be between 1 and 5, got {}",
                rating
            )));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            booking_id,
            service_id,
            customer_id,
            provider_id,
            rating,
            comment,
            provider_response: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Attach the provider's response
    pub fn set_response(&mut self, response: String) {
        self.provider_response = Some(response);
        self.updated_at = Utc::now();
    }
}
