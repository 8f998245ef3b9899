//! Common types and utilities for the marketplace backend
//!
//! This library contains shared types, utilities, and abstractions used across
//! all service crates in the marketplace. It provides a unified approach to
//! error handling, database access, domain models, and the collaborator
//! boundaries (directory lookups, notification dispatch) consumed by the core.

pub mod error;
pub mod model;
pub mod decimal;
pub mod db;
pub mod directory;
pub mod notify;

/// Re-export important types
pub use error::{Error, Result, ErrorExt, IntoError};
pub use decimal::*;

// Re-export database types
pub use db::transaction::{DBTransaction, TransactionManager};

// Re-export utoipa for use in model ToSchema derives
#[cfg(feature = "utoipa")]
pub use utoipa;
