use thiserror::Error;

use crate::domain::{AccountId, Amount, ValidationError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(AccountId),

    /// A valid request rejected by the overdraft rule. Not a system failure.
    #[error(
        "Limit exceeded on account {account_id}: balance {balance}, limit {limit}, requested {requested}"
    )]
    LimitExceeded {
        account_id: AccountId,
        balance: Amount,
        limit: Amount,
        requested: Amount,
    },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
