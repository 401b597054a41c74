//! This module defines the domain data types.

pub use attachment::Attachment;
pub use dashboard::{DashboardBucket, DashboardData};
pub use transaction::{
    NewTransaction, Transaction, TransactionFilter, TransactionId, TransactionType,
};
pub use user::{
    AccessToken, Session, SignInCredentials, SignUpCredentials, SignUpOutcome, User, UserChanges,
};

mod attachment;
mod dashboard;
mod transaction;
mod user;
