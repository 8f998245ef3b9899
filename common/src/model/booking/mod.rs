//! Booking models and lifecycle types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Amount;
use crate::error::Error;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Booking lifecycle status
///
/// Transitions are monotonic (Pending -> Confirmed -> Ongoing -> Completed)
/// except cancellation, which is reachable from any non-terminal state.
/// No transition leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum BookingStatus {
    /// Created by the customer, awaiting the provider's decision
    Pending,
    /// Accepted by the provider
    Confirmed,
    /// Work in progress
    Ongoing,
    /// Finished; terminal
    Completed,
    /// Declined or cancelled; terminal
    Cancelled,
}

impl BookingStatus {
    /// Check whether the status admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Stable string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Ongoing => "ongoing",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "ongoing" => Ok(BookingStatus::Ongoing),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(Error::ValidationError(format!("Unknown booking status: {}", other))),
        }
    }
}

/// Payment instrument chosen for a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum PaymentMethod {
    /// Credit/debit card through the external gateway
    Card,
    /// PayPal through the external gateway
    Paypal,
    /// Internal service credits
    Credits,
    /// Cash on completion
    Cash,
}

impl PaymentMethod {
    /// Stable string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Credits => "credits",
            PaymentMethod::Cash => "cash",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(PaymentMethod::Card),
            "paypal" => Ok(PaymentMethod::Paypal),
            "credits" => Ok(PaymentMethod::Credits),
            "cash" => Ok(PaymentMethod::Cash),
            other => Err(Error::ValidationError(format!("Unknown payment method: {}", other))),
        }
    }
}

/// Booking model
///
/// A scheduled engagement between a customer and a provider for a specific
/// service offering. Bookings are never physically deleted; cancellation is
/// a status, not a removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Booking {
    /// Unique booking ID
    pub id: Uuid,
    /// Customer who requested the booking
    pub customer_id: Uuid,
    /// Provider who fulfils the booking
    pub provider_id: Uuid,
    /// Service offering being booked
    pub service_id: Uuid,
    /// Scheduled date
    pub scheduled_date: NaiveDate,
    /// Scheduled time of day
    pub scheduled_time: NaiveTime,
    /// Current lifecycle status
    pub status: BookingStatus,
    /// Free-form customer notes
    pub notes: String,
    /// Total amount owed for the booking
    pub total_amount: Amount,
    /// Payment instrument chosen at creation
    pub payment_method: PaymentMethod,
    /// Whether a successful payment has settled the booking
    pub is_paid: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Create a new pending, unpaid booking
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        customer_id: Uuid,
        provider_id: Uuid,
        service_id: Uuid,
        scheduled_date: NaiveDate,
        scheduled_time: NaiveTime,
        total_amount: Amount,
        payment_method: PaymentMethod,
        notes: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_id,
            provider_id,
            service_id,
            scheduled_date,
            scheduled_time,
            status: BookingStatus::Pending,
            notes,
            total_amount,
            payment_method,
            is_paid: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the booking has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Rescheduling is only allowed before work starts
    pub fn can_reschedule(&self) -> bool {
        matches!(self.status, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}
