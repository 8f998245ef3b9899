//! Repository for credit ledger entries

use async_trait::async_trait;
use common::db::models::DbCreditEntry;
use common::db::{InMemoryTransactionManager, PgTransactionManager};
use common::error::{Error, Result};
use common::model::credits::CreditEntry;
use common::{DBTransaction, TransactionManager};
use dashmap::DashMap;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

/// Ledger repository trait defining the interface for credit entry storage
///
/// Entries are append-only: there is no update or delete operation.
#[async_trait]
pub trait CreditLedgerRepository: Send + Sync {
    /// Get the transaction manager
    fn transaction_manager(&self) -> &dyn TransactionManager;

    /// Append a new ledger entry
    async fn append_entry(&self, entry: CreditEntry) -> Result<CreditEntry>;

    /// All entries for a user in insertion order
    async fn entries_for_user(&self, user_id: Uuid) -> Result<Vec<CreditEntry>>;

    /// Current balance for a user (sum of all entry amounts)
    async fn balance(&self, user_id: Uuid) -> Result<i64>;

    /// Begin a database transaction
    async fn begin_transaction(&self) -> Result<DBTransaction> {
        self.transaction_manager().begin_transaction().await
    }
}

/// In-memory repository for credit ledger entries
pub struct InMemoryCreditLedgerRepository {
    /// Entries by user ID, in insertion order
    pub entries: DashMap<Uuid, Vec<CreditEntry>>,
    /// Transaction manager
    transaction_manager: InMemoryTransactionManager,
}

impl InMemoryCreditLedgerRepository {
    /// Create a new in-memory ledger repository
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            transaction_manager: InMemoryTransactionManager::new(),
        }
    }
}

impl Default for InMemoryCreditLedgerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CreditLedgerRepository for InMemoryCreditLedgerRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    /// Append a new ledger entry
    async fn append_entry(&self, entry: CreditEntry) -> Result<CreditEntry> {
        self.entries
            .entry(entry.user_id)
            .or_default()
            .push(entry.clone());
        Ok(entry)
    }

    /// All entries for a user in insertion order
    async fn entries_for_user(&self, user_id: Uuid) -> Result<Vec<CreditEntry>> {
        Ok(self
            .entries
            .get(&user_id)
            .map(|e| e.clone())
            .unwrap_or_default())
    }

    /// Current balance for a user
    async fn balance(&self, user_id: Uuid) -> Result<i64> {
        Ok(self
            .entries
            .get(&user_id)
            .map(|e| e.iter().map(|entry| entry.amount).sum())
            .unwrap_or(0))
    }
}

/// PostgreSQL repository for credit ledger entries
pub struct PostgresCreditLedgerRepository {
    /// Database connection pool
    pool: PgPool,
    /// Transaction manager
    transaction_manager: PgTransactionManager,
}

impl PostgresCreditLedgerRepository {
    /// Create a new PostgreSQL ledger repository
    pub async fn new(database_url: Option<String>) -> Result<Self> {
        let pool = match database_url {
            Some(url) => PgPoolOptions::new()
                .max_connections(5)
                .connect(&url)
                .await
                .map_err(Error::Database)?,
            None => {
                let database_url = std::env::var("DATABASE_URL")
                    .map_err(|_| Error::ConfigurationError("DATABASE_URL must be set".to_string()))?;

                PgPoolOptions::new()
                    .max_connections(5)
                    .connect(&database_url)
                    .await
                    .map_err(Error::Database)?
            }
        };

        info!("Connected to PostgreSQL database");

        Ok(Self {
            transaction_manager: PgTransactionManager::new(pool.clone()),
            pool,
        })
    }

    /// Create a new PostgreSQL ledger repository with configuration
    pub async fn with_config(config: &crate::config::CreditLedgerConfig) -> Result<Self> {
        info!("Connecting to PostgreSQL database with pool size: {}", config.db_pool_size);

        let pool = PgPoolOptions::new()
            .max_connections(config.db_pool_size)
            .connect(&config.database_url)
            .await
            .map_err(Error::Database)?;

        info!("Connected to PostgreSQL database");

        Ok(Self {
            transaction_manager: PgTransactionManager::new(pool.clone()),
            pool,
        })
    }
}

#[async_trait]
impl CreditLedgerRepository for PostgresCreditLedgerRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    /// Append a new ledger entry
    async fn append_entry(&self, entry: CreditEntry) -> Result<CreditEntry> {
        debug!("Appending ledger entry for user {}: {}", entry.user_id, entry.amount);

        sqlx::query(
            "INSERT INTO credit_entries
                 (id, user_id, amount, transaction_type, description, booking_id, balance_after, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.amount)
        .bind(entry.transaction_type.as_str())
        .bind(&entry.description)
        .bind(entry.booking_id)
        .bind(entry.balance_after)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    /// All entries for a user in insertion order
    async fn entries_for_user(&self, user_id: Uuid) -> Result<Vec<CreditEntry>> {
        debug!("Fetching ledger entries for user {}", user_id);

        let rows = sqlx::query_as::<_, DbCreditEntry>(
            "SELECT id, user_id, amount, transaction_type, description, booking_id, balance_after, created_at
             FROM credit_entries
             WHERE user_id = $1
             ORDER BY created_at, id"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CreditEntry::try_from).collect()
    }

    /// Current balance for a user
    async fn balance(&self, user_id: Uuid) -> Result<i64> {
        let balance: (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM credit_entries WHERE user_id = $1"
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(balance.0)
    }
}
