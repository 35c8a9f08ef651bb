use thiserror::Error;

/// Malformed input rejected at the boundary, before it reaches the ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid account id: {0}")]
    InvalidAccountId(String),

    #[error("Invalid transaction kind: {0} (expected 'c' or 'd')")]
    InvalidKind(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("Description must be 1 to 10 characters, got {0}")]
    InvalidDescription(usize),

    #[error("Invalid limit: {0}")]
    InvalidLimit(i64),
}
