use chrono::Utc;
use tracing::{debug, warn};

use crate::domain::{
    Account, AccountId, Amount, BalanceSnapshot, NewTransaction, STATEMENT_SIZE, Statement,
    ValidationError, within_limit,
};
use crate::storage::{ApplyOutcome, Repository, StoreOptions};

use super::AppError;

/// Accounts provisioned by `init --seed`: (id, limit).
pub const DEFAULT_ACCOUNTS: [(AccountId, Amount); 5] = [
    (1, 100_000),
    (2, 80_000),
    (3, 1_000_000),
    (4, 10_000_000),
    (5, 500_000),
];

/// Application service for the ledger: applies transactions under the
/// overdraft limit and projects statements.
/// Holds no state besides the repository's connection pool.
#[derive(Clone)]
pub struct AccountService {
    repo: Repository,
}

impl AccountService {
    /// Create a new account service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize the database behind `database_url` (connect + migrate).
    pub async fn init(database_url: &str, options: &StoreOptions) -> Result<Self, AppError> {
        let repo = Repository::init(database_url, options).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_url: &str, options: &StoreOptions) -> Result<Self, AppError> {
        let repo = Repository::connect(database_url, options).await?;
        Ok(Self::new(repo))
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    // ========================
    // Ledger operations
    // ========================

    /// Apply a credit or debit to an account.
    ///
    /// Returns the post-transaction balance and limit. `LimitExceeded` and
    /// `AccountNotFound` leave the account untouched; any other failure is a
    /// store error and is never reported as a limit rejection.
    pub async fn apply_transaction(
        &self,
        account_id: AccountId,
        transaction: NewTransaction,
    ) -> Result<BalanceSnapshot, AppError> {
        match self.repo.apply_transaction(account_id, &transaction).await? {
            ApplyOutcome::Applied(snapshot) => {
                debug_assert!(within_limit(snapshot.balance, snapshot.limit));
                debug!(
                    account_id,
                    kind = %transaction.kind,
                    amount = transaction.amount,
                    balance = snapshot.balance,
                    "transaction applied"
                );
                Ok(snapshot)
            }
            ApplyOutcome::LimitExceeded(account) => {
                warn!(
                    account_id,
                    balance = account.balance,
                    limit = account.limit,
                    amount = transaction.amount,
                    "transaction rejected: limit exceeded"
                );
                Err(AppError::LimitExceeded {
                    account_id,
                    balance: account.balance,
                    limit: account.limit,
                    requested: transaction.amount,
                })
            }
            ApplyOutcome::NotFound => Err(AppError::AccountNotFound(account_id)),
        }
    }

    /// Current balance, limit and the most recent transactions of an account.
    pub async fn get_statement(&self, account_id: AccountId) -> Result<Statement, AppError> {
        let (account, transactions) = self
            .repo
            .load_statement(account_id, STATEMENT_SIZE)
            .await?
            .ok_or(AppError::AccountNotFound(account_id))?;

        Ok(Statement::new(&account, transactions, Utc::now()))
    }

    // ========================
    // Provisioning
    // ========================

    /// Provision an account with a zero balance.
    pub async fn create_account(
        &self,
        id: AccountId,
        limit: Amount,
    ) -> Result<Account, AppError> {
        if id == 0 {
            return Err(ValidationError::InvalidAccountId(id.to_string()).into());
        }
        if limit < 0 {
            return Err(ValidationError::InvalidLimit(limit).into());
        }
        if self.repo.get_account(id).await?.is_some() {
            return Err(AppError::AccountAlreadyExists(id));
        }

        let account = Account::new(id, limit);
        self.repo.create_account(&account).await?;
        Ok(account)
    }

    /// Provision `DEFAULT_ACCOUNTS`, skipping any that already exist.
    /// Returns the accounts that were created.
    pub async fn seed_default_accounts(&self) -> Result<Vec<Account>, AppError> {
        let mut created = Vec::new();
        for (id, limit) in DEFAULT_ACCOUNTS {
            match self.create_account(id, limit).await {
                Ok(account) => created.push(account),
                Err(AppError::AccountAlreadyExists(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(created)
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Account, AppError> {
        self.repo
            .get_account(id)
            .await?
            .ok_or(AppError::AccountNotFound(id))
    }
}
