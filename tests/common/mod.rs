// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::Result;
use ledgerd::application::{AccountService, AppError};
use ledgerd::domain::{AccountId, Amount, BalanceSnapshot, NewTransaction};
use ledgerd::storage::StoreOptions;
use sqlx::{Connection, PgConnection, Postgres, Transaction};

/// Server the integration tests run against. Tests are skipped when unset.
pub const TEST_DATABASE_ENV: &str = "TEST_DATABASE_URL";

static NEXT_SCHEMA: AtomicU32 = AtomicU32::new(0);

/// A throwaway schema, dropped with everything in it when this goes out of scope.
pub struct TestSchema {
    url: String,
    name: String,
}

impl Drop for TestSchema {
    fn drop(&mut self) {
        let url = self.url.clone();
        let sql = format!("DROP SCHEMA IF EXISTS {} CASCADE", self.name);
        // Drop runs inside the test's runtime, so clean up from a fresh one.
        let cleanup = std::thread::spawn(move || {
            let Ok(runtime) = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            else {
                return;
            };
            runtime.block_on(async move {
                if let Ok(mut conn) = PgConnection::connect(&url).await {
                    let _ = sqlx::raw_sql(&sql).execute(&mut conn).await;
                    let _ = conn.close().await;
                }
            });
        });
        let _ = cleanup.join();
    }
}

/// Helper to create a test service over its own schema.
/// Returns `None` when no test database is configured.
pub async fn test_service() -> Result<Option<(AccountService, TestSchema)>> {
    let Ok(url) = std::env::var(TEST_DATABASE_ENV) else {
        eprintln!("{TEST_DATABASE_ENV} not set, skipping");
        return Ok(None);
    };
    let name = format!(
        "ledgerd_test_{}_{}",
        std::process::id(),
        NEXT_SCHEMA.fetch_add(1, Ordering::Relaxed)
    );
    let schema = TestSchema {
        url: url.clone(),
        name: name.clone(),
    };
    let options = StoreOptions {
        max_connections: 5,
        min_connections: 1,
        acquire_timeout: Duration::from_secs(30),
        schema: Some(name),
    };
    let service = AccountService::init(&url, &options).await?;
    Ok(Some((service, schema)))
}

/// Provision an account and bring it to `balance` with one transaction.
pub async fn account_with_balance(
    service: &AccountService,
    id: AccountId,
    limit: Amount,
    balance: Amount,
) -> Result<()> {
    service.create_account(id, limit).await?;
    let opening = if balance > 0 {
        Some(NewTransaction::credit(balance, "opening")?)
    } else if balance < 0 {
        Some(NewTransaction::debit(-balance, "opening")?)
    } else {
        None
    };
    if let Some(tx) = opening {
        service.apply_transaction(id, tx).await?;
    }
    Ok(())
}

pub async fn credit(
    service: &AccountService,
    id: AccountId,
    amount: Amount,
) -> Result<BalanceSnapshot, AppError> {
    service
        .apply_transaction(id, NewTransaction::credit(amount, "credit")?)
        .await
}

pub async fn debit(
    service: &AccountService,
    id: AccountId,
    amount: Amount,
) -> Result<BalanceSnapshot, AppError> {
    service
        .apply_transaction(id, NewTransaction::debit(amount, "debit")?)
        .await
}

pub async fn balance_of(service: &AccountService, id: AccountId) -> Result<Amount> {
    Ok(service.get_account(id).await?.balance)
}

/// Make every append to the transaction log fail inside the store.
pub async fn reject_appends(service: &AccountService) -> Result<()> {
    sqlx::raw_sql(
        r#"
        CREATE OR REPLACE FUNCTION reject_append() RETURNS trigger
        LANGUAGE plpgsql AS $$
        BEGIN
            RAISE EXCEPTION 'append rejected';
        END
        $$;
        CREATE TRIGGER reject_append BEFORE INSERT ON transactions
            FOR EACH ROW EXECUTE FUNCTION reject_append();
        "#,
    )
    .execute(service.repository().pool())
    .await?;
    Ok(())
}

pub async fn allow_appends(service: &AccountService) -> Result<()> {
    sqlx::query("DROP TRIGGER IF EXISTS reject_append ON transactions")
        .execute(service.repository().pool())
        .await?;
    Ok(())
}

/// Open a write on `id` from a separate connection and keep its row lock
/// until the returned transaction is rolled back or dropped.
pub async fn hold_account(
    service: &AccountService,
    id: AccountId,
) -> Result<Transaction<'static, Postgres>> {
    let mut tx = service.repository().pool().begin().await?;
    sqlx::query("UPDATE accounts SET balance = balance WHERE id = $1")
        .bind(i64::from(id))
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}
