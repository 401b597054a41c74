//! A stand-in for the hosted backend that keeps users, sessions and
//! transactions in a local SQLite database, for offline development.

mod session;
mod transaction;
mod user;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;
use uuid::Uuid;

pub use session::{RECOVERY_DURATION, SESSION_DURATION, create_session_table};
pub use transaction::create_transaction_table;
pub use user::create_user_table;

#[cfg(test)]
pub(crate) use transaction::count_transactions;

use crate::{
    Error,
    auth::{PasswordHash, ValidatedPassword},
    models::{
        AccessToken, NewTransaction, Session, SignInCredentials, SignUpCredentials, SignUpOutcome,
        Transaction, TransactionFilter, User, UserChanges,
    },
    queries::{AuthQueries, TransactionQueries},
};

use session::{
    SessionKind, delete_recovery_token, delete_recovery_tokens, delete_session,
    get_session_user_id, insert_session,
};
use transaction::{
    create_transaction, delete_transaction, get_transaction, list_transactions,
    update_transaction,
};
use user::{
    get_user_by_email, get_user_by_id, insert_user, set_user_email, set_user_name,
    set_user_password,
};

/// Users, sessions and transactions in a SQLite database.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    connection: Arc<Mutex<Connection>>,
    password_cost: u32,
}

impl LocalBackend {
    /// Use the tables in `connection`, which must have been set up with
    /// [initialize](crate::initialize_db).
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self {
            connection,
            password_cost: PasswordHash::DEFAULT_COST,
        }
    }

    /// Hash new passwords with `cost` rounds of bcrypt instead of the default.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    /// Run `query` with the database lock held.
    ///
    /// The lock is released before returning, so it is never held across an await.
    fn with_connection<T>(
        &self,
        query: impl FnOnce(&Connection) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        query(&connection)
    }

    /// The ID of the signed in user for `token`.
    fn session_user_id(&self, token: &AccessToken) -> Result<String, Error> {
        self.with_connection(|connection| {
            get_session_user_id(token, &[SessionKind::Session], connection)
        })?
        .ok_or(Error::Unauthenticated)
    }

    fn new_session(&self, user: User, connection: &Connection) -> Result<Session, Error> {
        let (access_token, expires_at) =
            insert_session(&user.id, SessionKind::Session, SESSION_DURATION, connection)?;

        Ok(Session {
            access_token,
            expires_at,
            user,
        })
    }
}

fn recovery_link(redirect_to: Option<&str>, token: &AccessToken) -> String {
    format!(
        "{}#access_token={}&type=recovery",
        redirect_to.unwrap_or("/"),
        token.as_str()
    )
}

#[async_trait]
impl AuthQueries for LocalBackend {
    async fn sign_up(&self, credentials: &SignUpCredentials) -> Result<SignUpOutcome, Error> {
        let password = ValidatedPassword::new(
            &credentials.password,
            &[credentials.email.as_str(), credentials.name.as_str()],
        )?;
        let password_hash = PasswordHash::new(&password, self.password_cost)?;
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: credentials.email.clone(),
            name: Some(credentials.name.clone()),
        };

        let session = self.with_connection(|connection| {
            insert_user(&user, &password_hash, connection)?;
            self.new_session(user.clone(), connection)
        })?;

        tracing::info!("Created local user {}", user.id);

        Ok(SignUpOutcome {
            user,
            session: Some(session),
        })
    }

    async fn sign_in_with_password(
        &self,
        credentials: &SignInCredentials,
    ) -> Result<Session, Error> {
        self.with_connection(|connection| {
            let stored = get_user_by_email(&credentials.email, connection)?
                .ok_or(Error::InvalidCredentials)?;

            if !stored.password_hash.verify(&credentials.password)? {
                return Err(Error::InvalidCredentials);
            }

            self.new_session(stored.user, connection)
        })
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), Error> {
        self.with_connection(|connection| delete_session(token, connection))
    }

    async fn forgot_password(&self, email: &str, redirect_to: Option<&str>) -> Result<(), Error> {
        let recovery = self.with_connection(|connection| {
            match get_user_by_email(email, connection)? {
                Some(stored) => {
                    let (token, _) = insert_session(
                        &stored.user.id,
                        SessionKind::Recovery,
                        RECOVERY_DURATION,
                        connection,
                    )?;
                    Ok(Some(token))
                }
                None => Ok(None),
            }
        })?;

        match recovery {
            // Local mode has no mail server.
            Some(token) => tracing::info!(
                "Password recovery link for {email}: {}",
                recovery_link(redirect_to, &token)
            ),
            None => tracing::debug!("Ignoring password recovery for unknown email {email}"),
        }

        Ok(())
    }

    async fn update_user(&self, token: &AccessToken, changes: &UserChanges) -> Result<User, Error> {
        let user_id = self
            .with_connection(|connection| {
                get_session_user_id(
                    token,
                    &[SessionKind::Session, SessionKind::Recovery],
                    connection,
                )
            })?
            .ok_or(Error::Unauthenticated)?;

        let password_hash = match &changes.password {
            Some(password) => {
                let current = self.with_connection(|connection| get_user_by_id(&user_id, connection))?;
                let mut user_inputs = vec![current.user.email.as_str()];
                if let Some(name) = &current.user.name {
                    user_inputs.push(name.as_str());
                }

                let password = ValidatedPassword::new(password, &user_inputs)?;
                Some(PasswordHash::new(&password, self.password_cost)?)
            }
            None => None,
        };

        self.with_connection(|connection| {
            let transaction = connection.unchecked_transaction()?;

            if let Some(email) = &changes.email {
                set_user_email(&user_id, email, &transaction)?;
            }
            if let Some(name) = &changes.name {
                set_user_name(&user_id, name, &transaction)?;
            }
            if let Some(password_hash) = &password_hash {
                set_user_password(&user_id, password_hash, &transaction)?;
                delete_recovery_tokens(&user_id, &transaction)?;
            }
            // A recovery link works once, whatever it was used to change.
            delete_recovery_token(token, &transaction)?;

            let updated = get_user_by_id(&user_id, &transaction)?;
            transaction.commit()?;

            Ok(updated.user)
        })
    }

    async fn get_current_user(&self, token: &AccessToken) -> Result<Option<User>, Error> {
        self.with_connection(|connection| {
            match get_session_user_id(token, &[SessionKind::Session], connection)? {
                Some(user_id) => Ok(Some(get_user_by_id(&user_id, connection)?.user)),
                None => Ok(None),
            }
        })
    }
}

#[async_trait]
impl TransactionQueries for LocalBackend {
    async fn list(
        &self,
        token: &AccessToken,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, Error> {
        let user_id = self.session_user_id(token)?;

        self.with_connection(|connection| list_transactions(&user_id, filter, connection))
    }

    async fn get(&self, token: &AccessToken, id: &str) -> Result<Transaction, Error> {
        let user_id = self.session_user_id(token)?;

        self.with_connection(|connection| get_transaction(&user_id, id, connection))
    }

    async fn create(
        &self,
        token: &AccessToken,
        transaction: NewTransaction,
    ) -> Result<Transaction, Error> {
        let user_id = self.session_user_id(token)?;

        self.with_connection(|connection| create_transaction(&user_id, transaction, connection))
    }

    async fn update(
        &self,
        token: &AccessToken,
        id: &str,
        transaction: NewTransaction,
    ) -> Result<Transaction, Error> {
        let user_id = self.session_user_id(token)?;

        self.with_connection(|connection| update_transaction(&user_id, id, transaction, connection))
    }

    async fn delete(&self, token: &AccessToken, id: &str) -> Result<(), Error> {
        let user_id = self.session_user_id(token)?;

        self.with_connection(|connection| delete_transaction(&user_id, id, connection))
    }
}
