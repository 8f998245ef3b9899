//! Repository for payments and installments

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use common::db::models::{DbInstallment, DbPayment};
use common::db::{InMemoryTransactionManager, PgTransactionManager};
use common::error::{Error, Result};
use common::model::payment::{Installment, InstallmentStatus, Payment};
use common::{DBTransaction, TransactionManager};
use dashmap::DashMap;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

/// Payment repository trait defining the interface for payment data storage
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Get the transaction manager
    fn transaction_manager(&self) -> &dyn TransactionManager;

    /// Persist a new payment
    async fn insert_payment(&self, payment: Payment) -> Result<Payment>;

    /// Get a payment by ID
    async fn get_payment(&self, id: Uuid) -> Result<Option<Payment>>;

    /// Get a payment by its gateway transaction ID
    async fn get_payment_by_transaction(&self, transaction_id: &str) -> Result<Option<Payment>>;

    /// Persist payment mutations
    async fn update_payment(&self, payment: Payment) -> Result<Payment>;

    /// All payments recorded against a booking
    async fn payments_for_booking(&self, booking_id: Uuid) -> Result<Vec<Payment>>;

    /// Persist a payment's installment plan
    async fn insert_installments(&self, installments: Vec<Installment>) -> Result<Vec<Installment>>;

    /// Installments of a payment ordered by installment number
    async fn installments_for_payment(&self, payment_id: Uuid) -> Result<Vec<Installment>>;

    /// Mark one installment as paid (settlement extension point)
    async fn mark_installment_paid(
        &self,
        installment_id: Uuid,
        paid_date: NaiveDate,
        transaction_id: Option<String>,
    ) -> Result<Installment>;

    /// Begin a database transaction
    async fn begin_transaction(&self) -> Result<DBTransaction> {
        self.transaction_manager().begin_transaction().await
    }
}

/// In-memory repository for payment data
pub struct InMemoryPaymentRepository {
    /// Payments by ID
    pub payments: DashMap<Uuid, Payment>,
    /// Payment lookup by gateway transaction ID
    payment_by_transaction: DashMap<String, Uuid>,
    /// Installments by payment ID
    pub installments: DashMap<Uuid, Vec<Installment>>,
    /// Transaction manager
    transaction_manager: InMemoryTransactionManager,
}

impl InMemoryPaymentRepository {
    /// Create a new in-memory payment repository
    pub fn new() -> Self {
        Self {
            payments: DashMap::new(),
            payment_by_transaction: DashMap::new(),
            installments: DashMap::new(),
            transaction_manager: InMemoryTransactionManager::new(),
        }
    }
}

impl Default for InMemoryPaymentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn insert_payment(&self, payment: Payment) -> Result<Payment> {
        if let Some(transaction_id) = &payment.transaction_id {
            self.payment_by_transaction.insert(transaction_id.clone(), payment.id);
        }
        self.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn get_payment(&self, id: Uuid) -> Result<Option<Payment>> {
        Ok(self.payments.get(&id).map(|p| p.clone()))
    }

    async fn get_payment_by_transaction(&self, transaction_id: &str) -> Result<Option<Payment>> {
        Ok(self
            .payment_by_transaction
            .get(transaction_id)
            .and_then(|id| self.payments.get(&id).map(|p| p.clone())))
    }

    async fn update_payment(&self, payment: Payment) -> Result<Payment> {
        if let Some(transaction_id) = &payment.transaction_id {
            self.payment_by_transaction.insert(transaction_id.clone(), payment.id);
        }
        self.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn payments_for_booking(&self, booking_id: Uuid) -> Result<Vec<Payment>> {
        Ok(self
            .payments
            .iter()
            .filter(|entry| entry.value().booking_id == booking_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn insert_installments(&self, installments: Vec<Installment>) -> Result<Vec<Installment>> {
        for installment in &installments {
            self.installments
                .entry(installment.payment_id)
                .or_default()
                .push(installment.clone());
        }
        Ok(installments)
    }

    async fn installments_for_payment(&self, payment_id: Uuid) -> Result<Vec<Installment>> {
        let mut rows = self
            .installments
            .get(&payment_id)
            .map(|i| i.clone())
            .unwrap_or_default();
        rows.sort_by_key(|i| i.installment_number);
        Ok(rows)
    }

    async fn mark_installment_paid(
        &self,
        installment_id: Uuid,
        paid_date: NaiveDate,
        transaction_id: Option<String>,
    ) -> Result<Installment> {
        for mut entry in self.installments.iter_mut() {
            if let Some(installment) = entry.value_mut().iter_mut().find(|i| i.id == installment_id) {
                installment.status = InstallmentStatus::Paid;
                installment.paid_date = Some(paid_date);
                installment.transaction_id = transaction_id;
                installment.updated_at = Utc::now();
                return Ok(installment.clone());
            }
        }

        Err(Error::PaymentNotFound(format!("Installment not found: {}", installment_id)))
    }
}

/// PostgreSQL repository for payment data
pub struct PostgresPaymentRepository {
    /// Database connection pool
    pool: PgPool,
    /// Transaction manager
    transaction_manager: PgTransactionManager,
}

impl PostgresPaymentRepository {
    /// Create a new PostgreSQL payment repository
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

    /// Create a new PostgreSQL payment repository with configuration
    pub async fn with_config(config: &crate::config::PaymentServiceConfig) -> Result<Self> {
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
impl PaymentRepository for PostgresPaymentRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn insert_payment(&self, payment: Payment) -> Result<Payment> {
        debug!("Inserting payment {} for booking {}", payment.id, payment.booking_id);

        sqlx::query(
            "INSERT INTO payments
                 (id, booking_id, user_id, amount, payment_type, payment_method, status,
                  transaction_id, gateway_response, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        )
        .bind(payment.id)
        .bind(payment.booking_id)
        .bind(payment.user_id)
        .bind(payment.amount)
        .bind(payment.payment_type.as_str())
        .bind(payment.payment_method.as_str())
        .bind(payment.status.as_str())
        .bind(&payment.transaction_id)
        .bind(&payment.gateway_response)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn get_payment(&self, id: Uuid) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, DbPayment>(
            "SELECT id, booking_id, user_id, amount, payment_type, payment_method, status,
                    transaction_id, gateway_response, created_at, updated_at
             FROM payments
             WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }

    async fn get_payment_by_transaction(&self, transaction_id: &str) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, DbPayment>(
            "SELECT id, booking_id, user_id, amount, payment_type, payment_method, status,
                    transaction_id, gateway_response, created_at, updated_at
             FROM payments
             WHERE transaction_id = $1"
        )
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }

    async fn update_payment(&self, payment: Payment) -> Result<Payment> {
        let result = sqlx::query(
            "UPDATE payments
             SET status = $2, transaction_id = $3, gateway_response = $4, updated_at = $5
             WHERE id = $1"
        )
        .bind(payment.id)
        .bind(payment.status.as_str())
        .bind(&payment.transaction_id)
        .bind(&payment.gateway_response)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::PaymentNotFound(format!("Payment not found: {}", payment.id)));
        }

        Ok(payment)
    }

    async fn payments_for_booking(&self, booking_id: Uuid) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, DbPayment>(
            "SELECT id, booking_id, user_id, amount, payment_type, payment_method, status,
                    transaction_id, gateway_response, created_at, updated_at
             FROM payments
             WHERE booking_id = $1
             ORDER BY created_at"
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn insert_installments(&self, installments: Vec<Installment>) -> Result<Vec<Installment>> {
        for installment in &installments {
            sqlx::query(
                "INSERT INTO installments
                     (id, payment_id, installment_number, amount, due_date, paid_date, status,
                      transaction_id, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
            )
            .bind(installment.id)
            .bind(installment.payment_id)
            .bind(installment.installment_number as i32)
            .bind(installment.amount)
            .bind(installment.due_date)
            .bind(installment.paid_date)
            .bind(installment.status.as_str())
            .bind(&installment.transaction_id)
            .bind(installment.created_at)
            .bind(installment.updated_at)
            .execute(&self.pool)
            .await?;
        }

        Ok(installments)
    }

    async fn installments_for_payment(&self, payment_id: Uuid) -> Result<Vec<Installment>> {
        let rows = sqlx::query_as::<_, DbInstallment>(
            "SELECT id, payment_id, installment_number, amount, due_date, paid_date, status,
                    transaction_id, created_at, updated_at
             FROM installments
             WHERE payment_id = $1
             ORDER BY installment_number"
        )
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Installment::try_from).collect()
    }

    async fn mark_installment_paid(
        &self,
        installment_id: Uuid,
        paid_date: NaiveDate,
        transaction_id: Option<String>,
    ) -> Result<Installment> {
        let row = sqlx::query_as::<_, DbInstallment>(
            "UPDATE installments
             SET status = 'paid', paid_date = $2, transaction_id = $3, updated_at = $4
             WHERE id = $1
             RETURNING id, payment_id, installment_number, amount, due_date, paid_date, status,
                       transaction_id, created_at, updated_at"
        )
        .bind(installment_id)
        .bind(paid_date)
        .bind(&transaction_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::PaymentNotFound(format!("Installment not found: {}", installment_id)))?;

        Installment::try_from(row)
    }
}
