//! The schema for transaction payloads.

use serde::Deserialize;
use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};

use crate::{
    models::{NewTransaction, Transaction, TransactionFilter, TransactionType},
    validation::{ValidationErrors, Validator},
};

/// A transaction as sent by a client, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionPayload {
    /// The transaction ID, only needed when validating a full transaction.
    #[serde(default)]
    pub id: Option<String>,
    /// Either "credit" or "debit".
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// What the transaction was for.
    #[serde(default)]
    pub description: Option<String>,
    /// The amount of money, must be positive.
    #[serde(default)]
    pub value: Option<f64>,
    /// A date (`2025-03-10`) or a timestamp (`2025-03-10T12:00:00Z`).
    #[serde(default)]
    pub date: Option<String>,
}

impl TransactionPayload {
    /// Validate a complete transaction, including its ID.
    pub fn parse(self) -> Result<Transaction, ValidationErrors> {
        let mut validator = Validator::new();
        let id = validator.non_empty("id", self.id.clone(), "ID is required");
        let fields = self.check_fields(&mut validator);

        let transaction = match (id, fields) {
            (Some(id), Some(fields)) => Some(fields.with_id(id)),
            _ => None,
        };

        validator.finish(transaction)
    }

    /// Validate the fields of a transaction that does not have an ID yet.
    ///
    /// Any ID in the payload is ignored.
    pub fn parse_new(self) -> Result<NewTransaction, ValidationErrors> {
        let mut validator = Validator::new();
        let fields = self.check_fields(&mut validator);

        validator.finish(fields)
    }

    fn check_fields(self, validator: &mut Validator) -> Option<NewTransaction> {
        let kind = match self.kind.as_deref().map(TransactionType::parse) {
            Some(Some(kind)) => Some(kind),
            Some(None) => {
                validator.issue("type", "Type must be either \"credit\" or \"debit\"");
                None
            }
            None => {
                validator.issue("type", "Type is required");
                None
            }
        };

        let description =
            validator.non_empty("description", self.description, "Description is required");

        let value = match self.value {
            Some(value) if value.is_finite() && value > 0.0 => Some(value),
            Some(_) => {
                validator.issue("value", "Value must be positive");
                None
            }
            None => {
                validator.issue("value", "Value is required");
                None
            }
        };

        let date = match self.date.as_deref().map(parse_date) {
            Some(Some(date)) => Some(date),
            Some(None) => {
                validator.issue("date", "Invalid date");
                None
            }
            None => {
                validator.issue("date", "Date is required");
                None
            }
        };

        match (kind, description, value, date) {
            (Some(kind), Some(description), Some(value), Some(date)) => Some(NewTransaction {
                kind,
                description,
                value,
                date,
            }),
            _ => None,
        }
    }
}

/// The query string of a transaction list, e.g. `?from=2025-01-01&type=debit`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionQuery {
    /// The earliest date to include.
    #[serde(default)]
    pub from: Option<String>,
    /// The latest date to include.
    #[serde(default)]
    pub to: Option<String>,
    /// Only include "credit" or "debit" transactions.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl TransactionQuery {
    /// Validate the query into a filter. Empty parameters are ignored.
    pub fn parse(self) -> Result<TransactionFilter, ValidationErrors> {
        let mut validator = Validator::new();
        let from = optional_date(&mut validator, "from", self.from);
        let to = optional_date(&mut validator, "to", self.to);

        let kind = match self.kind.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => {
                let kind = TransactionType::parse(text);
                if kind.is_none() {
                    validator.issue("type", "Type must be either \"credit\" or \"debit\"");
                }
                kind
            }
        };

        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                validator.issue("to", "The end date must not be before the start date");
            }
        }

        validator.finish(Some(TransactionFilter { from, to, kind }))
    }
}

fn optional_date(validator: &mut Validator, path: &str, text: Option<String>) -> Option<Date> {
    let text = text?;
    if text.trim().is_empty() {
        return None;
    }

    let date = parse_date(&text);
    if date.is_none() {
        validator.issue(path, "Invalid date");
    }

    date
}

/// Parse either a plain date or the date part of an RFC 3339 timestamp.
pub(crate) fn parse_date(text: &str) -> Option<Date> {
    let text = text.trim();

    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .ok()
        .or_else(|| {
            OffsetDateTime::parse(text, &Rfc3339)
                .ok()
                .map(|date_time| date_time.date())
        })
}
