//! Payment and installment models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Amount;
use crate::error::Error;
use crate::model::booking::PaymentMethod;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Payment status
///
/// Valid transitions: {Pending, Processing} -> {Completed | Failed},
/// Completed -> Refunded. Refund is only reachable from Completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum PaymentStatus {
    /// Created, awaiting gateway confirmation
    Pending,
    /// Submitted to the gateway or settling over installments
    Processing,
    /// Settled successfully
    Completed,
    /// Declined or cancelled by the gateway
    Failed,
    /// Reversed after completion
    Refunded,
}

impl PaymentStatus {
    /// Whether the payment is still awaiting settlement
    pub fn is_open(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Processing)
    }

    /// Stable string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "processing" => Ok(PaymentStatus::Processing),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(Error::ValidationError(format!("Unknown payment status: {}", other))),
        }
    }
}

/// Payment modality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum PaymentType {
    /// Charged synchronously at request time
    Immediate,
    /// Charged later via a deferred gateway confirmation
    Later,
    /// Settled over a series of scheduled installments
    Installment,
    /// Settled from the internal credit ledger
    Credits,
}

impl PaymentType {
    /// Stable string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Immediate => "immediate",
            PaymentType::Later => "later",
            PaymentType::Installment => "installment",
            PaymentType::Credits => "credits",
        }
    }
}

impl FromStr for PaymentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "immediate" => Ok(PaymentType::Immediate),
            "later" => Ok(PaymentType::Later),
            "installment" => Ok(PaymentType::Installment),
            "credits" => Ok(PaymentType::Credits),
            other => Err(Error::ValidationError(format!("Unknown payment type: {}", other))),
        }
    }
}

/// Payment model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Payment {
    /// Unique payment ID
    pub id: Uuid,
    /// Booking this payment settles
    pub booking_id: Uuid,
    /// Paying user
    pub user_id: Uuid,
    /// Amount charged
    pub amount: Amount,
    /// Payment modality
    pub payment_type: PaymentType,
    /// Payment instrument
    pub payment_method: PaymentMethod,
    /// Current status
    pub status: PaymentStatus,
    /// Gateway transaction/intent ID, when gateway-mediated
    pub transaction_id: Option<String>,
    /// Opaque response blob from the external gateway
    pub gateway_response: Option<serde_json::Value>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Create a new pending payment
    pub fn new(
        booking_id: Uuid,
        user_id: Uuid,
        amount: Amount,
        payment_type: PaymentType,
        payment_method: PaymentMethod,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_id,
            user_id,
            amount,
            payment_type,
            payment_method,
            status: PaymentStatus::Pending,
            transaction_id: None,
            gateway_response: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder-style status override used at creation time
    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder-style transaction ID used at creation time
    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    /// Apply a status change, stamping the update time
    pub fn set_status(&mut self, status: PaymentStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

/// Installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum InstallmentStatus {
    /// Not yet due or not yet paid
    Pending,
    /// Settled
    Paid,
    /// Past due date without settlement
    Overdue,
    /// Voided together with its payment
    Cancelled,
}

impl InstallmentStatus {
    /// Stable string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallmentStatus::Pending => "pending",
            InstallmentStatus::Paid => "paid",
            InstallmentStatus::Overdue => "overdue",
            InstallmentStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for InstallmentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InstallmentStatus::Pending),
            "paid" => Ok(InstallmentStatus::Paid),
            "overdue" => Ok(InstallmentStatus::Overdue),
            "cancelled" => Ok(InstallmentStatus::Cancelled),
            other => Err(Error::ValidationError(format!("Unknown installment status: {}", other))),
        }
    }
}

/// One scheduled partial payment of a larger total
///
/// Installment numbers are contiguous starting at 1, and the amounts of a
/// payment's installments sum exactly to the payment amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Installment {
    /// Unique installment ID
    pub id: Uuid,
    /// Parent payment
    pub payment_id: Uuid,
    /// 1-based position in the plan
    pub installment_number: u32,
    /// Amount due for this installment
    pub amount: Amount,
    /// Date this installment is due
    pub due_date: NaiveDate,
    /// Date this installment was paid, if settled
    pub paid_date: Option<NaiveDate>,
    /// Current status
    pub status: InstallmentStatus,
    /// Gateway transaction ID for the settling charge
    pub transaction_id: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Installment {
    /// Create a new pending installment
    pub fn new(payment_id: Uuid, installment_number: u32, amount: Amount, due_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            payment_id,
            installment_number,
            amount,
            due_date,
            paid_date: None,
            status: InstallmentStatus::Pending,
            transaction_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}
