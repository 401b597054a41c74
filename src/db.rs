//! Sets up the SQLite database used by the local backend.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error,
    queries::local::{create_session_table, create_transaction_table, create_user_table},
};

/// Create the tables for the local backend if they do not exist yet.
///
/// # Errors
/// Returns an [Error::SqlError] if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_session_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn creates_tables() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let mut tables = connection
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        tables.retain(|name| name != "sqlite_sequence");

        assert_eq!(tables, ["session", "transaction", "user"]);
    }

    #[test]
    fn can_run_twice() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        assert!(initialize(&connection).is_ok());
    }
}
