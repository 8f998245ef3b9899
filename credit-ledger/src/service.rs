//! Credit ledger service implementation

use std::sync::Arc;

use common::error::{Error, Result, ErrorExt};
use common::model::credits::{CreditEntry, CreditTransactionType};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::repository::{
    CreditLedgerRepository, InMemoryCreditLedgerRepository, PostgresCreditLedgerRepository,
};

/// Credit ledger service managing user credit balances
///
/// Appends for the same user are serialized through a per-user lock so that
/// `balance_after` snapshots always form a gap-free running total: two
/// concurrent debits can never both read the same stale balance.
pub struct CreditLedger {
    /// Repository for ledger entries
    repo: Arc<dyn CreditLedgerRepository>,
    /// Per-user append locks
    user_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

/// Repository Type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository
    Postgres(Option<String>),
}

impl CreditLedger {
    /// Create a new ledger backed by an in-memory repository
    pub fn new() -> Self {
        Self {
            repo: Arc::new(InMemoryCreditLedgerRepository::new()),
            user_locks: DashMap::new(),
        }
    }

    /// Create a new ledger with a specific repository type
    pub async fn with_repository(repo_type: RepositoryType) -> Result<Self> {
        let repo: Arc<dyn CreditLedgerRepository> = match repo_type {
            RepositoryType::InMemory => Arc::new(InMemoryCreditLedgerRepository::new()),
            RepositoryType::Postgres(database_url) => {
                Arc::new(PostgresCreditLedgerRepository::new(database_url).await?)
            }
        };

        Ok(Self {
            repo,
            user_locks: DashMap::new(),
        })
    }

    /// Create a new ledger with a configuration
    pub async fn with_config(config: &crate::config::CreditLedgerConfig) -> Result<Self> {
        let repo: Arc<dyn CreditLedgerRepository> =
            Arc::new(PostgresCreditLedgerRepository::with_config(config).await?);

        Ok(Self {
            repo,
            user_locks: DashMap::new(),
        })
    }

    /// Lock guarding appends for a single user
    fn lock_for(&self, user_id: Uuid) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Current credit balance for a user
    pub async fn balance(&self, user_id: Uuid) -> Result<i64> {
        self.repo.balance(user_id).await
    }

    /// Full transaction history for a user, in insertion order
    pub async fn history(&self, user_id: Uuid) -> Result<Vec<CreditEntry>> {
        self.repo.entries_for_user(user_id).await
    }

    /// Append a ledger entry, snapshotting the running balance
    ///
    /// Negative amounts are rejected with `InsufficientCredits` when the
    /// balance does not cover them.
    pub async fn append(
        &self,
        user_id: Uuid,
        amount: i64,
        transaction_type: CreditTransactionType,
        description: &str,
        booking_id: Option<Uuid>,
    ) -> Result<CreditEntry> {
        let lock = self.lock_for(user_id);
        let _guard = lock.lock().await;

        self.append_locked(user_id, amount, transaction_type, description, booking_id)
            .await
    }

    /// Append while already holding the user's lock
    async fn append_locked(
        &self,
        user_id: Uuid,
        amount: i64,
        transaction_type: CreditTransactionType,
        description: &str,
        booking_id: Option<Uuid>,
    ) -> Result<CreditEntry> {
        let balance = self.repo.balance(user_id).await
            .with_context(|| format!("Failed to read balance for user {}", user_id))?;

        if amount < 0 && balance + amount < 0 {
            return Err(Error::InsufficientCredits(format!(
                "User {} has {} credits, requested debit of {}",
                user_id, balance, -amount
            )));
        }

        let entry = CreditEntry::new(
            user_id,
            amount,
            transaction_type,
            description.to_string(),
            booking_id,
            balance + amount,
        );

        debug!(
            "Appending {} entry of {} for user {} (balance_after {})",
            transaction_type.as_str(),
            amount,
            user_id,
            entry.balance_after
        );

        self.repo.append_entry(entry).await
    }

    /// Purchase credits
    pub async fn purchase(&self, user_id: Uuid, amount: i64) -> Result<CreditEntry> {
        if amount <= 0 {
            return Err(Error::ValidationError(format!(
                "Credit purchase amount must be positive, got {}",
                amount
            )));
        }

        info!("User {} purchasing {} credits", user_id, amount);

        self.append(
            user_id,
            amount,
            CreditTransactionType::Purchase,
            &format!("Purchased {} credits", amount),
            None,
        )
        .await
    }

    /// Debit credits for a booking payment
    pub async fn debit(&self, user_id: Uuid, amount: i64, booking_id: Uuid) -> Result<CreditEntry> {
        info!("Debiting {} credits from user {} for booking {}", amount, user_id, booking_id);

        self.append(
            user_id,
            -amount,
            CreditTransactionType::Used,
            &format!("Payment for booking {}", booking_id),
            Some(booking_id),
        )
        .await
    }

    /// Refund credits for a cancelled booking
    pub async fn refund(&self, user_id: Uuid, amount: i64, booking_id: Uuid) -> Result<CreditEntry> {
        info!("Refunding {} credits to user {} for booking {}", amount, user_id, booking_id);

        self.append(
            user_id,
            amount,
            CreditTransactionType::Refund,
            &format!("Refund for cancelled booking {}", booking_id),
            Some(booking_id),
        )
        .await
    }
}

impl Default for CreditLedger {
    fn default() -> Self {
        Self::new()
    }
}
