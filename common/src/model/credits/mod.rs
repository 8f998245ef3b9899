//! Credit ledger models

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Kind of balance-affecting transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum CreditTransactionType {
    /// Credits bought by the user
    Purchase,
    /// Credits earned through platform activity
    Earned,
    /// Credits spent on a booking
    Used,
    /// Credits returned after a cancellation
    Refund,
    /// Promotional credits granted by the platform
    Bonus,
}

impl CreditTransactionType {
    /// Stable string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditTransactionType::Purchase => "purchase",
            CreditTransactionType::Earned => "earned",
            CreditTransactionType::Used => "used",
            CreditTransactionType::Refund => "refund",
            CreditTransactionType::Bonus => "bonus",
        }
    }
}

impl FromStr for CreditTransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(CreditTransactionType::Purchase),
            "earned" => Ok(CreditTransactionType::Earned),
            "used" => Ok(CreditTransactionType::Used),
            "refund" => Ok(CreditTransactionType::Refund),
            "bonus" => Ok(CreditTransactionType::Bonus),
            other => Err(Error::ValidationError(format!("Unknown credit transaction type: {}", other))),
        }
    }
}

/// One append-only row of a user's credit ledger
///
/// `balance_after` snapshots the running total at insertion time; rows are
/// never mutated after creation, and the balance is always derived from the
/// ledger, never stored independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct CreditEntry {
    /// Unique entry ID
    pub id: Uuid,
    /// Ledger owner
    pub user_id: Uuid,
    /// Signed credit delta
    pub amount: i64,
    /// Kind of transaction
    pub transaction_type: CreditTransactionType,
    /// Human-readable description
    pub description: String,
    /// Booking this entry relates to, if any (weak link)
    pub booking_id: Option<Uuid>,
    /// Running balance immediately after this entry
    pub balance_after: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl CreditEntry {
    /// Create a new ledger entry
    pub fn new(
        user_id: Uuid,
        amount: i64,
        transaction_type: CreditTransactionType,
        description: String,
        booking_id: Option<Uuid>,
        balance_after: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            amount,
            transaction_type,
            description,
            booking_id,
            balance_after,
            created_at: Utc::now(),
        }
    }
}
