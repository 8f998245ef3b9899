//! Read-only directory types
//!
//! Users and service offerings are owned by collaborating systems; the core
//! only looks them up by ID and assumes them consistent at call time.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Amount;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Directory record for a platform user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct User {
    /// Unique user ID
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
}

/// Directory record for a bookable service offering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct ServiceOffering {
    /// Unique service ID
    pub id: Uuid,
    /// Provider who offers the service
    pub provider_id: Uuid,
    /// Display title
    pub title: String,
    /// Monetary price
    pub price: Amount,
    /// Price in internal credits, when payable with credits
    pub credits_required: i64,
    /// Expected duration in minutes
    pub duration_minutes: u32,
}
