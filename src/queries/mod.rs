//! The query groups the route handlers and services call into.
//!
//! Each group is a trait so the backend can be chosen at start up: the hosted
//! backend ([SupabaseAuth], [SupabaseTransactions]), a local SQLite database
//! ([LocalBackend]) or a JSON mock server ([JsonServerTransactions]).

mod json_server;
pub(crate) mod local;
mod supabase;

use std::sync::Arc;

use async_trait::async_trait;

pub use json_server::JsonServerTransactions;
pub use local::LocalBackend;
pub use supabase::{SupabaseAuth, SupabaseTransactions};

use crate::{
    Error,
    models::{
        AccessToken, NewTransaction, Session, SignInCredentials, SignUpCredentials, SignUpOutcome,
        Transaction, TransactionFilter, User, UserChanges,
    },
};

/// Operations on users and their sessions.
#[async_trait]
pub trait AuthQueries: Send + Sync {
    /// Create a new user.
    async fn sign_up(&self, credentials: &SignUpCredentials) -> Result<SignUpOutcome, Error>;

    /// Start a session for the user with these credentials.
    async fn sign_in_with_password(
        &self,
        credentials: &SignInCredentials,
    ) -> Result<Session, Error>;

    /// End the session for `token`.
    async fn sign_out(&self, token: &AccessToken) -> Result<(), Error>;

    /// Send a password recovery link to `email`.
    ///
    /// Succeeds whether or not a user has this email.
    async fn forgot_password(&self, email: &str, redirect_to: Option<&str>) -> Result<(), Error>;

    /// Change the user that owns `token`.
    async fn update_user(&self, token: &AccessToken, changes: &UserChanges) -> Result<User, Error>;

    /// The user that owns `token`, or `None` if the token is not a live session.
    async fn get_current_user(&self, token: &AccessToken) -> Result<Option<User>, Error>;
}

/// Operations on the transactions of the user that owns the access token.
#[async_trait]
pub trait TransactionQueries: Send + Sync {
    /// The user's transactions that pass `filter`, newest first.
    async fn list(
        &self,
        token: &AccessToken,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, Error>;

    /// The transaction with `id`, or [Error::NotFound] if the user has no such transaction.
    async fn get(&self, token: &AccessToken, id: &str) -> Result<Transaction, Error>;

    /// Store a new transaction for the user.
    async fn create(
        &self,
        token: &AccessToken,
        transaction: NewTransaction,
    ) -> Result<Transaction, Error>;

    /// Replace the fields of the transaction with `id`.
    async fn update(
        &self,
        token: &AccessToken,
        id: &str,
        transaction: NewTransaction,
    ) -> Result<Transaction, Error>;

    /// Delete the transaction with `id`.
    async fn delete(&self, token: &AccessToken, id: &str) -> Result<(), Error>;
}

/// The named query groups.
#[derive(Clone)]
pub struct Queries {
    /// User and session operations.
    pub auth: Arc<dyn AuthQueries>,
    /// Transaction operations.
    pub transactions: Arc<dyn TransactionQueries>,
}

impl Queries {
    /// Use the same local backend for every group.
    pub fn local(backend: LocalBackend) -> Self {
        Self {
            auth: Arc::new(backend.clone()),
            transactions: Arc::new(backend),
        }
    }
}

impl std::fmt::Debug for Queries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queries").finish_non_exhaustive()
    }
}
