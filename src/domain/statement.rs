use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Account, Amount, Transaction};

/// Number of recent transactions a statement carries.
pub const STATEMENT_SIZE: usize = 10;

/// Read-only projection of an account: balance, limit and recent history.
/// Derived on request, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub balance: Amount,
    pub limit: Amount,
    /// When the projection was computed
    pub as_of: DateTime<Utc>,
    /// Most recent first, at most `STATEMENT_SIZE` entries
    pub transactions: Vec<Transaction>,
}

impl Statement {
    pub fn new(account: &Account, mut transactions: Vec<Transaction>, as_of: DateTime<Utc>) -> Self {
        transactions.truncate(STATEMENT_SIZE);
        Self {
            balance: account.balance,
            limit: account.limit,
            as_of,
            transactions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
