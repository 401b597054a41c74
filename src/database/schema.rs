//! The tables of the hosted database.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    database::Table,
    models::{NewTransaction, Transaction, TransactionType},
};

/// The `transactions` table. Rows are only visible to the user that owns them.
#[derive(Debug, Clone, Copy)]
pub struct Transactions;

impl Table for Transactions {
    const NAME: &'static str = "transactions";
    type Row = TransactionRow;
    type Insert = TransactionInsert;
    type Update = TransactionInsert;
}

/// A row of the `transactions` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionRow {
    /// The generated row ID.
    pub id: i64,
    /// The owner, defaults to the user making the insert.
    pub user_id: String,
    /// Whether money came in or went out.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// What the transaction was for.
    pub description: String,
    /// The amount, always positive.
    pub value: f64,
    /// When the transaction happened.
    pub date: Date,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Transaction {
            id: row.id.to_string(),
            kind: row.kind,
            description: row.description,
            value: row.value,
            date: row.date,
        }
    }
}

/// The columns written when a transaction is inserted or updated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionInsert {
    /// Whether money came in or went out.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// What the transaction was for.
    pub description: String,
    /// The amount, always positive.
    pub value: f64,
    /// When the transaction happened.
    pub date: Date,
}

impl From<NewTransaction> for TransactionInsert {
    fn from(transaction: NewTransaction) -> Self {
        Self {
            kind: transaction.kind,
            description: transaction.description,
            value: transaction.value,
            date: transaction.date,
        }
    }
}
