//! Defines the `Transaction` type, the core record of the application.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::Date;

/// Alias for the string IDs handed out by the backend for transactions.
pub type TransactionId = String;

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money was earned, e.g. a salary deposit.
    Credit,
    /// Money was spent, e.g. a coffee.
    Debit,
}

impl TransactionType {
    /// The name used on the wire and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }

    /// Parse the wire name of a transaction type, `None` if it is not one.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "credit" => Some(TransactionType::Credit),
            "debit" => Some(TransactionType::Debit),
            _ => None,
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// `value` is always a positive magnitude, the direction is given by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent or earned in this transaction.
    pub value: f64,
    /// When the transaction happened.
    pub date: Date,
}

impl Transaction {
    /// The value with the sign of its direction, negative for debits.
    pub fn signed_value(&self) -> f64 {
        match self.kind {
            TransactionType::Credit => self.value,
            TransactionType::Debit => -self.value,
        }
    }
}

/// The fields of a transaction that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent or earned in this transaction.
    pub value: f64,
    /// When the transaction happened.
    pub date: Date,
}

impl NewTransaction {
    /// Attach an ID to the new transaction.
    pub fn with_id(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            kind: self.kind,
            description: self.description,
            value: self.value,
            date: self.date,
        }
    }
}

impl From<Transaction> for NewTransaction {
    fn from(transaction: Transaction) -> Self {
        Self {
            kind: transaction.kind,
            description: transaction.description,
            value: transaction.value,
            date: transaction.date,
        }
    }
}

/// Narrows down which transactions a list query returns.
///
/// Date bounds are inclusive. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// The earliest date to include.
    pub from: Option<Date>,
    /// The latest date to include.
    pub to: Option<Date>,
    /// Only include transactions of this type.
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
}

impl TransactionFilter {
    /// Whether `transaction` passes the filter.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.from.is_none_or(|from| transaction.date >= from)
            && self.to.is_none_or(|to| transaction.date <= to)
            && self.kind.is_none_or(|kind| transaction.kind == kind)
    }
}
