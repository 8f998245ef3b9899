//! Notification models

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Category of a stored notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum NotificationKind {
    /// Booking lifecycle updates
    Booking,
    /// Payment and refund updates
    Payment,
    /// New reviews and responses
    Review,
    /// Platform announcements
    System,
}

impl NotificationKind {
    /// Stable string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Booking => "booking",
            NotificationKind::Payment => "payment",
            NotificationKind::Review => "review",
            NotificationKind::System => "system",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booking" => Ok(NotificationKind::Booking),
            "payment" => Ok(NotificationKind::Payment),
            "review" => Ok(NotificationKind::Review),
            "system" => Ok(NotificationKind::System),
            other => Err(Error::ValidationError(format!("Unknown notification kind: {}", other))),
        }
    }
}

/// A notification stored for later retrieval by the user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Notification {
    /// Unique notification ID
    pub id: Uuid,
    /// Recipient
    pub user_id: Uuid,
    /// Category
    pub kind: NotificationKind,
    /// Short title
    pub title: String,
    /// Message body
    pub body: String,
    /// Related booking, if any
    pub booking_id: Option<Uuid>,
    /// Whether the user has seen it
    pub is_read: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create a new unread notification
    pub fn new(
        user_id: Uuid,
        kind: NotificationKind,
        title: String,
        body: String,
        booking_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            title,
            body,
            booking_id,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}
