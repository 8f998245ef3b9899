// Database persistence tests - simplified version

#[cfg(test)]
mod db_persistence_tests {
    use std::env;
    use tokio::runtime::Runtime;
    use sqlx::{postgres::PgPoolOptions, PgPool};

    // Helper function to run async tests
    fn run_db_test<F>(test: F)
    where
        F: FnOnce(PgPool) -> futures::future::BoxFuture<'static, ()> + Send + 'static,
    {
        // Skip test if TEST_DATABASE_URL is not set
        let db_url = match env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                println!("Skipping database test: TEST_DATABASE_URL not set");
                return;
            }
        };

        // Create runtime
        let rt = Runtime::new().unwrap();

        // Run the test
        rt.block_on(async {
            // Create database connection
            let pool = match PgPoolOptions::new()
                .max_connections(5)
                .connect(&db_url)
                .await
            {
                Ok(pool) => pool,
                Err(err) => {
                    println!("Skipping database test: could not connect to database: {}", err);
                    return;
                }
            };

            // Run the test
            test(pool).await;
        });
    }

    // Ledger rows survive a round trip through the real schema
    #[test]
    #[ignore = "Requires test database, run with RUST_TEST_THREADS=1 cargo test -- --ignored"]
    fn test_credit_entry_persistence() {
        run_db_test(|pool| {
            Box::pin(async move {
                common::db::run_migrations(&pool)
                    .await
                    .expect("Failed to run migrations");

                let user_id = uuid::Uuid::new_v4();
                let entry = common::model::credits::CreditEntry::new(
                    user_id,
                    25,
                    common::model::credits::CreditTransactionType::Purchase,
                    "Purchased 25 credits".to_string(),
                    None,
                    25,
                );

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
                .execute(&pool)
                .await
                .expect("Failed to insert credit entry");

                let (balance,): (i64,) = sqlx::query_as(
                    "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM credit_entries WHERE user_id = $1"
                )
                .bind(user_id)
                .fetch_one(&pool)
                .await
                .expect("Failed to read balance");

                assert_eq!(balance, 25);

                // Clean up
                sqlx::query("DELETE FROM credit_entries WHERE user_id = $1")
                    .bind(user_id)
                    .execute(&pool)
                    .await
                    .expect("Failed to clean up");
            })
        });
    }
}
