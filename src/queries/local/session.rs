//! The `session` table of the local backend.
//!
//! A session row maps an opaque token to a user until it expires. Recovery
//! tokens live in the same table, they only allow changing the user.

use rusqlite::Connection;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Error, models::AccessToken};

/// How long a session lasts after signing in.
pub const SESSION_DURATION: Duration = Duration::days(7);
/// How long a password recovery token can be used for.
pub const RECOVERY_DURATION: Duration = Duration::hours(1);

/// What a session token is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SessionKind {
    /// A regular signed in session.
    Session,
    /// A token sent for a forgotten password, only valid for changing the user.
    Recovery,
}

impl SessionKind {
    fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Session => "session",
            SessionKind::Recovery => "recovery",
        }
    }
}

/// Create the session table.
///
/// # Errors
/// Returns an error if the SQL query failed.
pub fn create_session_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS session (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('session', 'recovery')),
                expires_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Create a new token of `kind` for `user_id` that lasts `duration`.
///
/// Expired tokens of any user are deleted first.
pub(super) fn insert_session(
    user_id: &str,
    kind: SessionKind,
    duration: Duration,
    connection: &Connection,
) -> Result<(AccessToken, OffsetDateTime), Error> {
    let now = OffsetDateTime::now_utc();
    delete_expired_sessions(now, connection)?;

    let token = Uuid::new_v4().simple().to_string();
    let expires_at = now + duration;

    connection.execute(
        "INSERT INTO session (token, user_id, kind, expires_at) VALUES (?1, ?2, ?3, ?4)",
        (&token, user_id, kind.as_str(), expires_at),
    )?;

    Ok((AccessToken::new(&token), expires_at))
}

/// The ID of the user that owns `token`, if the token is one of `kinds` and
/// has not expired.
pub(super) fn get_session_user_id(
    token: &AccessToken,
    kinds: &[SessionKind],
    connection: &Connection,
) -> Result<Option<String>, Error> {
    let mut statement = connection
        .prepare("SELECT user_id, kind, expires_at FROM session WHERE token = :token")?;
    let mut rows = statement.query_map(&[(":token", &token.as_str())], |row| {
        let user_id: String = row.get(0)?;
        let kind: String = row.get(1)?;
        let expires_at: OffsetDateTime = row.get(2)?;

        Ok((user_id, kind, expires_at))
    })?;

    let Some((user_id, kind, expires_at)) = rows.next().transpose()? else {
        return Ok(None);
    };

    let kind_allowed = kinds.iter().any(|allowed| allowed.as_str() == kind);

    if kind_allowed && expires_at > OffsetDateTime::now_utc() {
        Ok(Some(user_id))
    } else {
        Ok(None)
    }
}

/// Delete the session for `token`. Deleting a missing session is not an error.
pub(super) fn delete_session(token: &AccessToken, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM session WHERE token = :token",
        &[(":token", &token.as_str())],
    )?;

    Ok(())
}

/// Delete the recovery token `token`. Regular sessions are left alone.
pub(super) fn delete_recovery_token(
    token: &AccessToken,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM session WHERE token = ?1 AND kind = ?2",
        (token.as_str(), SessionKind::Recovery.as_str()),
    )?;

    Ok(())
}

fn delete_expired_sessions(now: OffsetDateTime, connection: &Connection) -> Result<(), Error> {
    let deleted = connection.execute("DELETE FROM session WHERE expires_at <= ?1", (now,))?;

    if deleted > 0 {
        tracing::debug!("Deleted {deleted} expired sessions");
    }

    Ok(())
}

/// Delete the recovery tokens of `user_id`, e.g. once their password has been changed.
pub(super) fn delete_recovery_tokens(user_id: &str, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM session WHERE user_id = ?1 AND kind = ?2",
        (user_id, SessionKind::Recovery.as_str()),
    )?;

    Ok(())
}
