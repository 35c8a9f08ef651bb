use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_valid_amount, Amount, ValidationError};

/// Longest description a transaction may carry, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Increases the balance
    #[serde(rename = "c")]
    Credit,
    /// Decreases the balance
    #[serde(rename = "d")]
    Debit,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "c",
            TransactionKind::Debit => "d",
        }
    }

    /// The balance delta this kind produces for a positive magnitude.
    pub fn signed(&self, amount: Amount) -> Amount {
        match self {
            TransactionKind::Credit => amount,
            TransactionKind::Debit => -amount,
        }
    }
}

impl FromStr for TransactionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "c" => Ok(TransactionKind::Credit),
            "d" => Ok(TransactionKind::Debit),
            other => Err(ValidationError::InvalidKind(other.to_string())),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transaction description of 1 to 10 characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Description(String);

impl Description {
    pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        let len = raw.chars().count();
        if len == 0 || len > MAX_DESCRIPTION_LEN {
            return Err(ValidationError::InvalidDescription(len));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Description {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Description> for String {
    fn from(value: Description) -> Self {
        value.0
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated request to move an account's balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: Amount,
    pub description: Description,
}

impl NewTransaction {
    pub fn new(
        kind: TransactionKind,
        amount: Amount,
        description: Description,
    ) -> Result<Self, ValidationError> {
        if !is_valid_amount(amount) {
            return Err(ValidationError::InvalidAmount(amount));
        }
        Ok(Self {
            kind,
            amount,
            description,
        })
    }

    pub fn credit(amount: Amount, description: &str) -> Result<Self, ValidationError> {
        Self::new(
            TransactionKind::Credit,
            amount,
            Description::parse(description)?,
        )
    }

    pub fn debit(amount: Amount, description: &str) -> Result<Self, ValidationError> {
        Self::new(
            TransactionKind::Debit,
            amount,
            Description::parse(description)?,
        )
    }

    pub fn delta(&self) -> Amount {
        self.kind.signed(self.amount)
    }
}

/// A committed transaction. Immutable and append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Magnitude, always positive
    pub amount: Amount,
    pub kind: TransactionKind,
    pub description: Description,
    /// Assigned by the server when the transaction is recorded
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("c".parse::<TransactionKind>(), Ok(TransactionKind::Credit));
        assert_eq!("d".parse::<TransactionKind>(), Ok(TransactionKind::Debit));
        assert!("C".parse::<TransactionKind>().is_err());
        assert!("credit".parse::<TransactionKind>().is_err());
        assert!("".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn test_signed_delta() {
        assert_eq!(TransactionKind::Credit.signed(100), 100);
        assert_eq!(TransactionKind::Debit.signed(100), -100);
    }

    #[test]
    fn test_description_bounds() {
        assert!(Description::parse("a").is_ok());
        assert!(Description::parse("0123456789").is_ok());
        assert_eq!(
            Description::parse(""),
            Err(ValidationError::InvalidDescription(0))
        );
        assert_eq!(
            Description::parse("01234567890"),
            Err(ValidationError::InvalidDescription(11))
        );
    }

    #[test]
    fn test_description_counts_characters_not_bytes() {
        // 10 characters, 20 bytes
        assert!(Description::parse("ãããããããããã").is_ok());
    }

    #[test]
    fn test_new_transaction_rejects_bad_amounts() {
        assert!(NewTransaction::debit(0, "x").is_err());
        assert!(NewTransaction::credit(-10, "x").is_err());
        assert!(NewTransaction::credit(crate::domain::MAX_AMOUNT + 1, "x").is_err());

        let tx = NewTransaction::debit(250, "rent").unwrap();
        assert_eq!(tx.delta(), -250);
        assert_eq!(tx.description.as_str(), "rent");
    }

    #[test]
    fn test_kind_serializes_as_wire_code() {
        assert_eq!(
            serde_json::to_string(&TransactionKind::Debit).unwrap(),
            "\"d\""
        );
        let kind: TransactionKind = serde_json::from_str("\"c\"").unwrap();
        assert_eq!(kind, TransactionKind::Credit);
    }
}
