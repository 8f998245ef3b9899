//! Database row structs for the marketplace tables
//!
//! Status and enum columns are stored as TEXT; conversion to the domain
//! enums happens in the `TryFrom` impls so a corrupted row surfaces as a
//! validation error instead of a panic.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::Error;
use crate::model::booking::Booking;
use crate::model::credits::CreditEntry;
use crate::model::payment::{Installment, Payment};
use crate::model::provider::ProviderProfile;
use crate::model::review::Review;

/// Database model for the bookings table
#[derive(Debug, Clone, FromRow)]
pub struct DbBooking {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub service_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub status: String,
    pub notes: String,
    pub total_amount: Decimal,
    pub payment_method: String,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbBooking> for Booking {
    type Error = Error;

    fn try_from(row: DbBooking) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            customer_id: row.customer_id,
            provider_id: row.provider_id,
            service_id: row.service_id,
            scheduled_date: row.scheduled_date,
            scheduled_time: row.scheduled_time,
            status: row.status.parse()?,
            notes: row.notes,
            total_amount: row.total_amount,
            payment_method: row.payment_method.parse()?,
            is_paid: row.is_paid,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database model for the payments table
#[derive(Debug, Clone, FromRow)]
pub struct DbPayment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub payment_type: String,
    pub payment_method: String,
    pub status: String,
    pub transaction_id: Option<String>,
    pub gateway_response: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbPayment> for Payment {
    type Error = Error;

    fn try_from(row: DbPayment) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id,
            booking_id: row.booking_id,
            user_id: row.user_id,
            amount: row.amount,
            payment_type: row.payment_type.parse()?,
            payment_method: row.payment_method.parse()?,
            status: row.status.parse()?,
            transaction_id: row.transaction_id,
            gateway_response: row.gateway_response,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database model for the installments table
#[derive(Debug, Clone, FromRow)]
pub struct DbInstallment {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub installment_number: i32,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub status: String,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbInstallment> for Installment {
    type Error = Error;

    fn try_from(row: DbInstallment) -> Result<Self, Self::Error> {
        Ok(Installment {
            id: row.id,
            payment_id: row.payment_id,
            installment_number: row.installment_number as u32,
            amount: row.amount,
            due_date: row.due_date,
            paid_date: row.paid_date,
            status: row.status.parse()?,
            transaction_id: row.transaction_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database model for the credit_entries table
#[derive(Debug, Clone, FromRow)]
pub struct DbCreditEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub transaction_type: String,
    pub description: String,
    pub booking_id: Option<Uuid>,
    pub balance_after: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbCreditEntry> for CreditEntry {
    type Error = Error;

    fn try_from(row: DbCreditEntry) -> Result<Self, Self::Error> {
        Ok(CreditEntry {
            id: row.id,
            user_id: row.user_id,
            amount: row.amount,
            transaction_type: row.transaction_type.parse()?,
            description: row.description,
            booking_id: row.booking_id,
            balance_after: row.balance_after,
            created_at: row.created_at,
        })
    }
}

/// Database model for the reviews table
#[derive(Debug, Clone, FromRow)]
pub struct DbReview {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub provider_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbReview> for Review {
    type Error = Error;

    fn try_from(row: DbReview) -> Result<Self, Self::Error> {
        Ok(Review {
            id: row.id,
            booking_id: row.booking_id,
            service_id: row.service_id,
            customer_id: row.customer_id,
            provider_id: row.provider_id,
            rating: row.rating as u8,
            comment: row.comment,
            provider_response: row.provider_response,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database model for the provider_profiles table
#[derive(Debug, Clone, FromRow)]
pub struct DbProviderProfile {
    pub user_id: Uuid,
    pub rating: Decimal,
    pub total_earnings: Decimal,
    pub jobs_completed: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbProviderProfile> for ProviderProfile {
    fn from(row: DbProviderProfile) -> Self {
        ProviderProfile {
            user_id: row.user_id,
            rating: row.rating,
            total_earnings: row.total_earnings,
            jobs_completed: row.jobs_completed as u32,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
