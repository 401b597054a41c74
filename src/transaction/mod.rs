//! Route handlers for recording and browsing transactions.
//!
//! Storage and scoping to the signed in user are up to the
//! [TransactionQueries](crate::TransactionQueries) implementation.

mod handlers;

pub use handlers::{
    create_transaction, delete_transaction, get_transaction, get_transactions, update_transaction,
};
