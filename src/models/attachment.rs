//! Files attached to transactions.

use serde::{Deserialize, Serialize};

use crate::models::TransactionId;

/// A file stored alongside a transaction, e.g. a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Where the file can be downloaded from.
    pub url: String,
    /// The file name, unique per transaction.
    pub name: String,
    /// The transaction the file belongs to.
    pub transaction_id: TransactionId,
}
