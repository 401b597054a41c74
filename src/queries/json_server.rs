//! Transactions stored in a json-server style mock REST API.
//!
//! The mock server has no notion of users, so every session sees the same
//! transactions. It is only meant for working on the clients.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;

use crate::{
    Error, HttpService,
    models::{AccessToken, NewTransaction, Transaction, TransactionFilter, TransactionType},
    queries::TransactionQueries,
    validation::parse_date,
};

/// Transactions under `/transactions` of a mock API.
#[derive(Debug, Clone)]
pub struct JsonServerTransactions {
    http: HttpService,
}

impl JsonServerTransactions {
    /// Use the mock API at `base_url`, e.g. "http://localhost:3001".
    pub fn new(base_url: &str) -> Self {
        Self {
            http: HttpService::new(base_url),
        }
    }
}

/// json-server hands out numeric IDs for seeded data and string IDs for new records.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordId {
    Number(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct Record {
    id: RecordId,
    #[serde(rename = "type")]
    kind: TransactionType,
    description: String,
    value: f64,
    date: String,
}

impl TryFrom<Record> for Transaction {
    type Error = Error;

    fn try_from(record: Record) -> Result<Self, Self::Error> {
        let date = parse_date(&record.date)
            .ok_or_else(|| Error::Backend(format!("invalid date \"{}\"", record.date)))?;
        let id = match record.id {
            RecordId::Number(id) => id.to_string(),
            RecordId::Text(id) => id,
        };

        Ok(Transaction {
            id,
            kind: record.kind,
            description: record.description,
            value: record.value,
            date,
        })
    }
}

fn not_found_on_404(error: Error) -> Error {
    match error {
        Error::Http { status, .. } if status == StatusCode::NOT_FOUND => {
            Error::NotFound("transaction")
        }
        error => error,
    }
}

impl JsonServerTransactions {
    /// A request for the record `id`, or for the collection when `id` is `None`.
    fn record_request(&self, method: Method, id: Option<&str>) -> Result<RequestBuilder, Error> {
        match id {
            None => Ok(self.http.request(method, "transactions")),
            // Dot segments would be resolved away by the URL.
            Some("" | "." | "..") => Err(Error::NotFound("transaction")),
            Some(id) => self.http.request_segments(method, &["transactions", id]),
        }
    }

    async fn send_record(
        &self,
        method: Method,
        id: Option<&str>,
        token: &AccessToken,
        body: Option<&NewTransaction>,
    ) -> Result<Transaction, Error> {
        let mut request = self
            .record_request(method, id)?
            .bearer_auth(token.as_str());

        if let Some(body) = body {
            request = request.json(body);
        }

        let record: Record = HttpService::send_json(request)
            .await
            .map_err(not_found_on_404)?;

        record.try_into()
    }
}

#[async_trait]
impl TransactionQueries for JsonServerTransactions {
    async fn list(
        &self,
        token: &AccessToken,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, Error> {
        let mut params = vec![
            ("_sort", "date".to_owned()),
            ("_order", "desc".to_owned()),
        ];

        if let Some(from) = filter.from {
            params.push(("date_gte", from.to_string()));
        }
        // Dates compare as strings on the server, so "2025-03-10T12:00:00Z" is after
        // "2025-03-10". Ask for up to the next day and drop the extra records below.
        if let Some(next_day) = filter.to.and_then(|to| to.next_day()) {
            params.push(("date_lte", next_day.to_string()));
        }
        if let Some(kind) = filter.kind {
            params.push(("type", kind.to_string()));
        }

        let request = self
            .record_request(Method::GET, None)?
            .bearer_auth(token.as_str())
            .query(&params);

        let records: Vec<Record> = HttpService::send_json(request).await?;

        let mut transactions = records
            .into_iter()
            .map(Transaction::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        transactions.retain(|transaction| filter.matches(transaction));

        Ok(transactions)
    }

    async fn get(&self, token: &AccessToken, id: &str) -> Result<Transaction, Error> {
        self.send_record(Method::GET, Some(id), token, None)
            .await
    }

    async fn create(
        &self,
        token: &AccessToken,
        transaction: NewTransaction,
    ) -> Result<Transaction, Error> {
        self.send_record(Method::POST, None, token, Some(&transaction))
            .await
    }

    async fn update(
        &self,
        token: &AccessToken,
        id: &str,
        transaction: NewTransaction,
    ) -> Result<Transaction, Error> {
        self.send_record(Method::PUT, Some(id), token, Some(&transaction))
            .await
    }

    async fn delete(&self, token: &AccessToken, id: &str) -> Result<(), Error> {
        let request = self
            .record_request(Method::DELETE, Some(id))?
            .bearer_auth(token.as_str());

        HttpService::send_empty(request)
            .await
            .map_err(not_found_on_404)
    }
}
