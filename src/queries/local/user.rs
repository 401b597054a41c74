//! The `user` table of the local backend.

use rusqlite::{Connection, Row};

use crate::{Error, auth::PasswordHash, models::User};

/// A user row together with the stored password hash.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct StoredUser {
    pub user: User,
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
/// Returns an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password TEXT NOT NULL,
                name TEXT
                )",
        (),
    )?;

    Ok(())
}

fn map_user_row(row: &Row) -> Result<StoredUser, rusqlite::Error> {
    let id = row.get(0)?;
    let email = row.get(1)?;
    let password_hash: String = row.get(2)?;
    let name = row.get(3)?;

    Ok(StoredUser {
        user: User { id, email, name },
        password_hash: PasswordHash::from_stored(password_hash),
    })
}

fn map_unique_email_error(error: rusqlite::Error, email: &str) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        ) => Error::DuplicateEmail(email.to_owned()),
        error => error.into(),
    }
}

/// Insert a new user.
///
/// # Errors
/// Returns [Error::DuplicateEmail] if another user has `user.email`.
pub(super) fn insert_user(
    user: &User,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    connection
        .execute(
            "INSERT INTO user (id, email, password, name) VALUES (?1, ?2, ?3, ?4)",
            (&user.id, &user.email, password_hash.as_str(), &user.name),
        )
        .map_err(|error| map_unique_email_error(error, &user.email))?;

    Ok(())
}

/// Get the user that signs in with `email`, ignoring case.
pub(super) fn get_user_by_email(
    email: &str,
    connection: &Connection,
) -> Result<Option<StoredUser>, Error> {
    let mut statement =
        connection.prepare("SELECT id, email, password, name FROM user WHERE email = :email")?;
    let mut rows = statement.query_map(&[(":email", &email)], map_user_row)?;

    rows.next().transpose().map_err(Error::from)
}

/// Get the user with `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such user.
pub(super) fn get_user_by_id(id: &str, connection: &Connection) -> Result<StoredUser, Error> {
    connection
        .prepare("SELECT id, email, password, name FROM user WHERE id = :id")?
        .query_row(&[(":id", &id)], map_user_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound("user"),
            error => error.into(),
        })
}

/// Change the email of the user with `id`.
pub(super) fn set_user_email(id: &str, email: &str, connection: &Connection) -> Result<(), Error> {
    connection
        .execute(
            "UPDATE user SET email = :email WHERE id = :id",
            &[(":email", &email), (":id", &id)],
        )
        .map_err(|error| map_unique_email_error(error, email))?;

    Ok(())
}

/// Change the display name of the user with `id`.
pub(super) fn set_user_name(id: &str, name: &str, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "UPDATE user SET name = :name WHERE id = :id",
        &[(":name", &name), (":id", &id)],
    )?;

    Ok(())
}

/// Replace the password hash of the user with `id`.
pub(super) fn set_user_password(
    id: &str,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "UPDATE user SET password = :password WHERE id = :id",
        &[(":password", &password_hash.as_str()), (":id", &id)],
    )?;

    Ok(())
}

#[cfg(test)]
mod user_table_tests {
    use rusqlite::Connection;

    use crate::{Error, auth::PasswordHash, db::initialize, models::User};

    use super::{get_user_by_email, get_user_by_id, insert_user, set_user_email};

    fn get_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn ana() -> User {
        User {
            id: "a1".to_owned(),
            email: "ana@example.com".to_owned(),
            name: Some("Ana".to_owned()),
        }
    }

    #[test]
    fn insert_and_get_by_email_ignoring_case() {
        let connection = get_db_connection();
        let hash = PasswordHash::from_stored("hunter2".to_owned());
        insert_user(&ana(), &hash, &connection).unwrap();

        let got = get_user_by_email("ANA@example.com", &connection)
            .unwrap()
            .unwrap();

        assert_eq!(got.user, ana());
        assert_eq!(got.password_hash, hash);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let connection = get_db_connection();
        let hash = PasswordHash::from_stored("hunter2".to_owned());
        insert_user(&ana(), &hash, &connection).unwrap();
        let impostor = User {
            id: "b2".to_owned(),
            ..ana()
        };

        let result = insert_user(&impostor, &hash, &connection);

        assert_eq!(
            result,
            Err(Error::DuplicateEmail("ana@example.com".to_owned()))
        );
    }

    #[test]
    fn changing_email_to_taken_one_is_rejected() {
        let connection = get_db_connection();
        let hash = PasswordHash::from_stored("hunter2".to_owned());
        insert_user(&ana(), &hash, &connection).unwrap();
        let bia = User {
            id: "b2".to_owned(),
            email: "bia@example.com".to_owned(),
            name: None,
        };
        insert_user(&bia, &hash, &connection).unwrap();

        let result = set_user_email("b2", "ana@example.com", &connection);

        assert!(matches!(result, Err(Error::DuplicateEmail(_))));
    }

    #[test]
    fn missing_user_is_not_found() {
        let connection = get_db_connection();

        assert_eq!(
            get_user_by_id("nobody", &connection),
            Err(Error::NotFound("user"))
        );
        assert_eq!(get_user_by_email("nobody@example.com", &connection), Ok(None));
    }
}
