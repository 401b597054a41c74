//! Types describing users and their sessions.
//!
//! Users are owned by the auth backend, this application only reads them or
//! asks the backend to transition them (sign up, sign in, update, ...).

use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A user of the application as reported by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the auth backend.
    pub id: String,
    /// The email the user signs in with.
    pub email: String,
    /// The display name given at sign up.
    pub name: Option<String>,
}

/// An opaque bearer token identifying a backend session.
///
/// The token is never printed, use [AccessToken::as_str] when it must be sent
/// somewhere.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token string.
    pub fn new(token: &str) -> Self {
        Self(token.to_owned())
    }

    /// The raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

impl Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccessToken({self})")
    }
}

/// A signed in user together with the token for their session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The token to present on subsequent requests.
    pub access_token: AccessToken,
    /// When the token stops being accepted.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    /// The user the session belongs to.
    pub user: User,
}

/// The result of a sign up.
///
/// Backends that require email confirmation create the user without signing
/// them in, in which case `session` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpOutcome {
    /// The newly created user.
    pub user: User,
    /// The session, if the user was signed in straight away.
    pub session: Option<Session>,
}

/// Validated details for creating a new account.
#[derive(Clone, PartialEq)]
pub struct SignUpCredentials {
    /// The display name for the user.
    pub name: String,
    /// The email to sign in with.
    pub email: String,
    /// The plain text password.
    pub password: String,
}

impl Debug for SignUpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpCredentials")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"********")
            .finish()
    }
}

/// Validated details for signing in with an email and password.
#[derive(Clone, PartialEq)]
pub struct SignInCredentials {
    /// The email the user signed up with.
    pub email: String,
    /// The plain text password.
    pub password: String,
}

impl Debug for SignInCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInCredentials")
            .field("email", &self.email)
            .field("password", &"********")
            .finish()
    }
}

/// Validated changes to apply to the current user. `None` fields are left as is.
#[derive(Clone, Default, PartialEq)]
pub struct UserChanges {
    /// A new display name.
    pub name: Option<String>,
    /// A new email.
    pub email: Option<String>,
    /// A new plain text password.
    pub password: Option<String>,
}

impl Debug for UserChanges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserChanges")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .finish()
    }
}
