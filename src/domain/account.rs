use serde::{Deserialize, Serialize};

use super::{Amount, ValidationError};

pub type AccountId = u32;

/// Parse an account identifier from a path segment. Identifiers are positive.
pub fn parse_account_id(raw: &str) -> Result<AccountId, ValidationError> {
    match raw.trim().parse::<AccountId>() {
        Ok(0) | Err(_) => Err(ValidationError::InvalidAccountId(raw.to_string())),
        Ok(id) => Ok(id),
    }
}

/// An account with a fixed overdraft limit. Provisioned out of band;
/// only its balance ever changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub balance: Amount,
    pub limit: Amount,
}

impl Account {
    pub fn new(id: AccountId, limit: Amount) -> Self {
        Self {
            id,
            balance: 0,
            limit,
        }
    }
}

/// Balance and limit of an account right after a committed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub balance: Amount,
    pub limit: Amount,
}
