use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use crate::domain::{
    Account, AccountId, BalanceSnapshot, Description, NewTransaction, Transaction,
    TransactionKind,
};

use super::MIGRATION_001_INITIAL;

/// Connection pool settings for the ledger store.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a caller waits for a free pool slot before failing
    pub acquire_timeout: Duration,
    /// Schema holding the ledger tables; `None` uses the server's search path
    pub schema: Option<String>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(5),
            schema: None,
        }
    }
}

/// Result of the conditional balance update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Balance updated and transaction appended, both committed
    Applied(BalanceSnapshot),
    /// The account exists but the new balance would breach its limit.
    /// Carries the untouched account.
    LimitExceeded(Account),
    /// No account with that id
    NotFound,
}

/// Repository for accounts and their transaction log.
#[derive(Clone)]
pub struct Repository {
    pool: PgPool,
    schema: Option<String>,
}

impl Repository {
    /// Create a new repository with the given PostgreSQL connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool, schema: None }
    }

    /// Connect to a PostgreSQL database.
    pub async fn connect(database_url: &str, options: &StoreOptions) -> Result<Self> {
        let mut connect_options = PgConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database url: {}", database_url))?;
        if let Some(schema) = &options.schema {
            check_schema_name(schema)?;
            connect_options = connect_options.options([("search_path", schema.as_str())]);
        }

        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .min_connections(options.min_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect_with(connect_options)
            .await
            .context("Failed to connect to database")?;

        Ok(Self {
            pool,
            schema: options.schema.clone(),
        })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        if let Some(schema) = &self.schema {
            sqlx::raw_sql(&format!("CREATE SCHEMA IF NOT EXISTS {schema}"))
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to create schema {}", schema))?;
        }
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str, options: &StoreOptions) -> Result<Self> {
        let repo = Self::connect(database_url, options).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Round-trip to the store.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    /// The underlying pool, for maintenance tasks.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ========================
    // Account operations
    // ========================

    /// Provision a new account.
    pub async fn create_account(&self, account: &Account) -> Result<()> {
        sqlx::query("INSERT INTO accounts (id, balance, credit_limit) VALUES ($1, $2, $3)")
            .bind(i64::from(account.id))
            .bind(account.balance)
            .bind(account.limit)
            .execute(&self.pool)
            .await
            .context("Failed to create account")?;
        Ok(())
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query("SELECT id, balance, credit_limit FROM accounts WHERE id = $1")
            .bind(i64::from(id))
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch account")?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    /// Count every transaction recorded for an account.
    pub async fn count_transactions(&self, id: AccountId) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM transactions WHERE account_id = $1")
            .bind(i64::from(id))
            .fetch_one(&self.pool)
            .await
            .context("Failed to count transactions")?;
        Ok(row.get("count"))
    }

    // ========================
    // Ledger operations
    // ========================

    /// Apply a transaction to an account's balance and append it to the log,
    /// as one all-or-nothing unit.
    ///
    /// The limit check lives in the UPDATE's WHERE clause so the check and the
    /// write are a single statement. Concurrent writers queue on the account's
    /// row lock only, and after the wait PostgreSQL re-evaluates the WHERE
    /// clause against the balance the previous writer committed. Returning early or failing anywhere before `commit` drops the
    /// transaction, which rolls the balance update back.
    pub async fn apply_transaction(
        &self,
        account_id: AccountId,
        transaction: &NewTransaction,
    ) -> Result<ApplyOutcome> {
        let delta = transaction.delta();
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let updated = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = balance + $1
            WHERE id = $2 AND balance + $1 >= -credit_limit
            RETURNING balance, credit_limit
            "#,
        )
        .bind(delta)
        .bind(i64::from(account_id))
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to update balance")?;

        let Some(row) = updated else {
            // Zero rows: either the account is missing or the limit would be breached.
            let existing = sqlx::query("SELECT id, balance, credit_limit FROM accounts WHERE id = $1")
                .bind(i64::from(account_id))
                .fetch_optional(&mut *tx)
                .await
                .context("Failed to fetch account")?;
            tx.rollback().await.context("Failed to roll back")?;

            return match existing {
                Some(row) => Ok(ApplyOutcome::LimitExceeded(Self::row_to_account(&row)?)),
                None => Ok(ApplyOutcome::NotFound),
            };
        };

        let snapshot = BalanceSnapshot {
            balance: row.get("balance"),
            limit: row.get("credit_limit"),
        };

        sqlx::query(
            r#"
            INSERT INTO transactions (account_id, amount, kind, description, occurred_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(i64::from(account_id))
        .bind(transaction.amount)
        .bind(transaction.kind.as_str())
        .bind(transaction.description.as_str())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .context("Failed to append transaction")?;

        tx.commit().await.context("Failed to commit transaction")?;

        Ok(ApplyOutcome::Applied(snapshot))
    }

    /// Load an account together with its most recent transactions, newest first.
    /// Both reads share one snapshot. Returns `None` for unknown accounts.
    pub async fn load_statement(
        &self,
        account_id: AccountId,
        size: usize,
    ) -> Result<Option<(Account, Vec<Transaction>)>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin read")?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .context("Failed to begin read")?;

        let Some(row) = sqlx::query("SELECT id, balance, credit_limit FROM accounts WHERE id = $1")
            .bind(i64::from(account_id))
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to fetch account")?
        else {
            return Ok(None);
        };
        let account = Self::row_to_account(&row)?;

        let rows = sqlx::query(
            r#"
            SELECT amount, kind, description, occurred_at
            FROM transactions
            WHERE account_id = $1
            ORDER BY id DESC
            LIMIT $2
            "#,
        )
        .bind(i64::from(account_id))
        .bind(i64::try_from(size).context("Statement size out of range")?)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to list recent transactions")?;

        tx.commit().await.context("Failed to end read")?;

        let transactions = rows
            .iter()
            .map(Self::row_to_transaction)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some((account, transactions)))
    }

    fn row_to_account(row: &PgRow) -> Result<Account> {
        let id: i64 = row.get("id");
        Ok(Account {
            id: AccountId::try_from(id).context("Invalid account ID")?,
            balance: row.get("balance"),
            limit: row.get("credit_limit"),
        })
    }

    fn row_to_transaction(row: &PgRow) -> Result<Transaction> {
        let kind_str: String = row.get("kind");
        let description: String = row.get("description");

        Ok(Transaction {
            amount: row.get("amount"),
            kind: TransactionKind::from_str(&kind_str).context("Invalid transaction kind")?,
            description: Description::parse(description).context("Invalid description")?,
            occurred_at: row
                .try_get::<DateTime<Utc>, _>("occurred_at")
                .context("Invalid occurred_at timestamp")?,
        })
    }
}

/// Schema names are spliced into DDL, so only plain identifiers are accepted.
fn check_schema_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    ensure!(
        starts_ok && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
        "Invalid schema name: {}",
        name
    );
    Ok(())
}
