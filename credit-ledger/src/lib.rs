//! Append-only credit ledger for user balances

pub mod service;
pub mod repository;
pub mod config;

pub use service::CreditLedger;
pub use service::RepositoryType;
pub use repository::{CreditLedgerRepository, InMemoryCreditLedgerRepository, PostgresCreditLedgerRepository};
pub use config::CreditLedgerConfig;
