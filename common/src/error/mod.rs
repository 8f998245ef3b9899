//! Error types for the marketplace backend
//!
//! This module provides a unified error handling system for all service
//! crates in the marketplace. It defines standard error types that can be
//! used across service boundaries and provides consistent error conversion.

use std::fmt::Display;
use thiserror::Error;

use crate::model::booking::BookingStatus;

/// Marketplace error type
#[derive(Debug, Error)]
pub enum Error {
    /// A booking operation was requested from a state that does not allow it
    #[error("Invalid transition: cannot {attempted} a booking in state {current}")]
    InvalidTransition {
        /// Status the booking was in when the transition was attempted
        current: BookingStatus,
        /// The operation that was attempted (e.g. "accept", "cancel")
        attempted: String,
    },

    /// The acting user lacks the role or ownership the operation requires
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// The user's credit balance does not cover the requested debit
    #[error("Insufficient credits: {0}")]
    InsufficientCredits(String),

    /// Payment was requested for a booking that is already paid
    #[error("Already paid: {0}")]
    AlreadyPaid(String),

    /// Refund was requested for a payment that is already refunded
    #[error("Already refunded: {0}")]
    AlreadyRefunded(String),

    /// A review already exists for the booking
    #[error("Duplicate review: {0}")]
    DuplicateReview(String),

    /// A review was submitted for a booking that has not completed
    #[error("Booking not completed: {0}")]
    BookingNotCompleted(String),

    /// An external payment-gateway call failed
    #[error("Gateway error: {0}")]
    GatewayError(String),

    /// Error when a booking cannot be found
    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    /// Error when a payment cannot be found
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Error when a review cannot be found
    #[error("Review not found: {0}")]
    ReviewNotFound(String),

    /// Error when a service offering cannot be found
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    /// Error when a user cannot be found
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Generic validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                // The transition data is kept intact; context would obscure it
                Error::InvalidTransition { current, attempted } => {
                    Error::InvalidTransition { current, attempted }
                }
                Error::NotAuthorized(msg) => Error::NotAuthorized(format!("{}: {}", context, msg)),
                Error::InsufficientCredits(msg) => Error::InsufficientCredits(format!("{}: {}", context, msg)),
                Error::AlreadyPaid(msg) => Error::AlreadyPaid(format!("{}: {}", context, msg)),
                Error::AlreadyRefunded(msg) => Error::AlreadyRefunded(format!("{}: {}", context, msg)),
                Error::DuplicateReview(msg) => Error::DuplicateReview(format!("{}: {}", context, msg)),
                Error::BookingNotCompleted(msg) => Error::BookingNotCompleted(format!("{}: {}", context, msg)),
                Error::GatewayError(msg) => Error::GatewayError(format!("{}: {}", context, msg)),
                Error::BookingNotFound(msg) => Error::BookingNotFound(format!("{}: {}", context, msg)),
                Error::PaymentNotFound(msg) => Error::PaymentNotFound(format!("{}: {}", context, msg)),
                Error::ReviewNotFound(msg) => Error::ReviewNotFound(format!("{}: {}", context, msg)),
                Error::ServiceNotFound(msg) => Error::ServiceNotFound(format!("{}: {}", context, msg)),
                Error::UserNotFound(msg) => Error::UserNotFound(format!("{}: {}", context, msg)),
                Error::ValidationError(msg) => Error::ValidationError(format!("{}: {}", context, msg)),
                Error::ConfigurationError(msg) => Error::ConfigurationError(format!("{}: {}", context, msg)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::Database(e) => Error::Database(e),
                Error::Migration(e) => Error::Migration(e),
                Error::Serialization(e) => Error::Serialization(e),
            }
        })
    }
}

/// Trait for converting other error types to our Error type
pub trait IntoError {
    /// Convert to Error
    fn into_error(self, message: &str) -> Error;
}

impl<E: std::error::Error> IntoError for E {
    fn into_error(self, message: &str) -> Error {
        Error::Internal(format!("{}: {}", message, self))
    }
}

/// Convert string messages into an error
impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Internal(message)
    }
}

/// Convert static string references into an error
impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Internal(message.to_string())
    }
}

/// From rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Internal(format!("Decimal conversion error: {}", err))
    }
}
