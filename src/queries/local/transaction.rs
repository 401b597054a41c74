//! The `transaction` table of the local backend.
//!
//! Every query is scoped to the ID of the user that owns the rows.

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};

use crate::{
    Error,
    models::{NewTransaction, Transaction, TransactionFilter, TransactionType},
};

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        TransactionType::parse(text).ok_or_else(|| {
            FromSqlError::Other(format!("invalid transaction type \"{text}\"").into())
        })
    }
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('credit', 'debit')),
                description TEXT NOT NULL,
                value REAL NOT NULL CHECK (value > 0),
                date TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id: i64 = row.get(0)?;
    let kind = row.get(1)?;
    let description = row.get(2)?;
    let value = row.get(3)?;
    let date = row.get(4)?;

    Ok(Transaction {
        id: id.to_string(),
        kind,
        description,
        value,
        date,
    })
}

/// Row IDs are integers, anything else cannot name a row.
fn parse_row_id(id: &str) -> Result<i64, Error> {
    id.parse().map_err(|_| Error::NotFound("transaction"))
}

fn not_found_if_no_rows(error: rusqlite::Error) -> Error {
    match error {
        rusqlite::Error::QueryReturnedNoRows => Error::NotFound("transaction"),
        error => error.into(),
    }
}

/// The transactions of `user_id` that pass `filter`, newest first.
pub(super) fn list_transactions(
    user_id: &str,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, type, description, value, date FROM \"transaction\"
             WHERE user_id = :user_id
               AND (:from IS NULL OR date >= :from)
               AND (:to IS NULL OR date <= :to)
               AND (:type IS NULL OR type = :type)
             ORDER BY date DESC, id DESC",
        )?
        .query_map(
            &[
                (":user_id", &user_id as &dyn ToSql),
                (":from", &filter.from),
                (":to", &filter.to),
                (":type", &filter.kind),
            ],
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// The transaction of `user_id` with `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `user_id` has no transaction with `id`.
pub(super) fn get_transaction(
    user_id: &str,
    id: &str,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let id = parse_row_id(id)?;

    connection
        .prepare(
            "SELECT id, type, description, value, date FROM \"transaction\"
             WHERE id = :id AND user_id = :user_id",
        )?
        .query_row(
            &[(":id", &id as &dyn ToSql), (":user_id", &user_id)],
            map_transaction_row,
        )
        .map_err(not_found_if_no_rows)
}

/// Store a new transaction for `user_id`.
pub(super) fn create_transaction(
    user_id: &str,
    transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, type, description, value, date)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, type, description, value, date",
        )?
        .query_row(
            (
                user_id,
                transaction.kind,
                transaction.description,
                transaction.value,
                transaction.date,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Replace the fields of the transaction of `user_id` with `id`.
pub(super) fn update_transaction(
    user_id: &str,
    id: &str,
    transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let id = parse_row_id(id)?;

    connection
        .prepare(
            "UPDATE \"transaction\"
             SET type = ?1, description = ?2, value = ?3, date = ?4
             WHERE id = ?5 AND user_id = ?6
             RETURNING id, type, description, value, date",
        )?
        .query_row(
            (
                transaction.kind,
                transaction.description,
                transaction.value,
                transaction.date,
                id,
                user_id,
            ),
            map_transaction_row,
        )
        .map_err(not_found_if_no_rows)
}

/// Delete the transaction of `user_id` with `id`.
pub(super) fn delete_transaction(
    user_id: &str,
    id: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let id = parse_row_id(id)?;

    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound("transaction")),
        _ => Ok(()),
    }
}

/// Get the total number of transactions in the database.
#[cfg(test)]
pub(crate) fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}
