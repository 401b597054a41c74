//! A typed client for the hosted Postgres database (PostgREST).
//!
//! [Table] binds a table name to the Rust types of its rows, so queries are
//! checked against the schema declared in [schema]. [Database] is the client
//! factory: it hands out anonymous clients and clients that act on behalf of a
//! signed in user, which is what row level security keys on.

pub mod schema;

use std::{fmt::Display, marker::PhantomData};

use reqwest::{Method, RequestBuilder};
use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, HttpService, models::AccessToken};

/// A table in the database and the shapes of the data that go in and out of it.
pub trait Table {
    /// The table name.
    const NAME: &'static str;
    /// A row as returned by a query.
    type Row: DeserializeOwned + Send;
    /// The columns needed to insert a row.
    type Insert: Serialize + Sync;
    /// The columns that can be changed on an existing row.
    type Update: Serialize + Sync;
}

/// Creates database clients for the backend at a given URL.
#[derive(Debug, Clone)]
pub struct Database {
    root: HttpService,
    anon_key: String,
}

impl Database {
    /// Bind to the backend at `url`, authenticating the project with `anon_key`.
    ///
    /// # Errors
    /// Returns an error if `anon_key` cannot be sent as a header.
    pub fn connect(url: &str, anon_key: &str) -> Result<Self, Error> {
        let root = HttpService::new(url).with_header("apikey", anon_key)?;

        Ok(Self {
            root,
            anon_key: anon_key.to_owned(),
        })
    }

    /// The HTTP client for the backend root, shared by the auth and storage APIs.
    pub fn http(&self) -> &HttpService {
        &self.root
    }

    /// A client with only the project's anonymous role.
    pub fn browser_client(&self) -> Client {
        Client {
            rest: self.root.nest("rest/v1"),
            bearer: self.anon_key.clone(),
        }
    }

    /// A client acting as the user who owns `access_token`.
    pub fn server_client(&self, access_token: &AccessToken) -> Client {
        Client {
            rest: self.root.nest("rest/v1"),
            bearer: access_token.as_str().to_owned(),
        }
    }
}

/// A database client for one role or user.
#[derive(Debug, Clone)]
pub struct Client {
    rest: HttpService,
    bearer: String,
}

impl Client {
    /// Start a query on the table `T`.
    pub fn from<T: Table>(&self) -> Query<'_, T> {
        Query {
            client: self,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            table: PhantomData,
        }
    }
}

/// A query on the table `T` that is sent when a terminal operation is awaited.
#[derive(Debug)]
pub struct Query<'a, T: Table> {
    client: &'a Client,
    filters: Vec<(String, String)>,
    order: Vec<String>,
    limit: Option<usize>,
    table: PhantomData<fn() -> T>,
}

impl<T: Table> Query<'_, T> {
    /// Only match rows where `column` equals `value`.
    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "eq", value)
    }

    /// Only match rows where `column` is greater than or equal to `value`.
    pub fn gte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "gte", value)
    }

    /// Only match rows where `column` is less than or equal to `value`.
    pub fn lte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "lte", value)
    }

    fn filter(mut self, column: &str, operator: &str, value: impl Display) -> Self {
        self.filters
            .push((column.to_owned(), format!("{operator}.{value}")));
        self
    }

    /// Sort by `column`. Later calls break ties of earlier ones.
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order.push(format!("{column}.{direction}"));
        self
    }

    /// Return at most `count` rows.
    pub fn limit(mut self, count: usize) -> Self {
        self.limit = Some(count);
        self
    }

    fn request(&self, method: Method) -> RequestBuilder {
        let mut params = self.filters.clone();

        if !self.order.is_empty() {
            params.push(("order".to_owned(), self.order.join(",")));
        }

        if let Some(limit) = self.limit {
            params.push(("limit".to_owned(), limit.to_string()));
        }

        self.client
            .rest
            .request(method, T::NAME)
            .bearer_auth(&self.client.bearer)
            .query(&params)
    }

    fn returning_rows(request: RequestBuilder) -> RequestBuilder {
        request.header("Prefer", "return=representation")
    }

    /// Fetch every matching row.
    pub async fn select(self) -> Result<Vec<T::Row>, Error> {
        HttpService::send_json(self.request(Method::GET).query(&[("select", "*")])).await
    }

    /// Fetch the first matching row, if there is one.
    pub async fn maybe_single(self) -> Result<Option<T::Row>, Error> {
        let rows = self.limit(1).select().await?;

        Ok(rows.into_iter().next())
    }

    /// Insert `row` and return it as stored.
    ///
    /// # Errors
    /// Returns [Error::Backend] if the database did not return the new row.
    pub async fn insert(self, row: &T::Insert) -> Result<T::Row, Error> {
        let rows: Vec<T::Row> =
            HttpService::send_json(Self::returning_rows(self.request(Method::POST)).json(row))
                .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| Error::Backend(format!("insert into {} returned no rows", T::NAME)))
    }

    /// Apply `changes` to every matching row and return the updated rows.
    pub async fn update(self, changes: &T::Update) -> Result<Vec<T::Row>, Error> {
        HttpService::send_json(Self::returning_rows(self.request(Method::PATCH)).json(changes))
            .await
    }

    /// Delete every matching row and return the deleted rows.
    pub async fn delete(self) -> Result<Vec<T::Row>, Error> {
        HttpService::send_json(Self::returning_rows(self.request(Method::DELETE))).await
    }
}

#[cfg(test)]
mod database_client_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json, Router,
        extract::{RawQuery, State},
        http::HeaderMap,
        routing::get,
    };
    use serde_json::{Value, json};

    use crate::{
        database::{Database, schema::Transactions},
        models::AccessToken,
        test_utils::spawn_test_backend,
    };

    #[derive(Clone, Default)]
    struct Seen {
        query: Arc<Mutex<Option<String>>>,
        authorization: Arc<Mutex<Option<String>>>,
    }

    async fn list_transactions(
        State(seen): State<Seen>,
        headers: HeaderMap,
        RawQuery(query): RawQuery,
    ) -> Json<Value> {
        *seen.query.lock().unwrap() = query;
        *seen.authorization.lock().unwrap() = headers
            .get("authorization")
            .map(|value| value.to_str().unwrap().to_owned());

        Json(json!([
            {
                "id": 7,
                "user_id": "b0c1",
                "type": "debit",
                "description": "Coffee",
                "value": 4.5,
                "date": "2025-03-10",
            }
        ]))
    }

    async fn get_database(seen: Seen) -> Database {
        let router = Router::new()
            .route("/rest/v1/transactions", get(list_transactions))
            .with_state(seen);
        let base_url = spawn_test_backend(router).await;

        Database::connect(&base_url, "anon").unwrap()
    }

    #[tokio::test]
    async fn server_client_sends_user_token_and_filters() {
        let seen = Seen::default();
        let database = get_database(seen.clone()).await;
        let client = database.server_client(&AccessToken::new("user-token"));

        let rows = client
            .from::<Transactions>()
            .gte("date", "2025-03-01")
            .order("date", false)
            .order("id", false)
            .select()
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 7);
        assert_eq!(
            seen.authorization.lock().unwrap().as_deref(),
            Some("Bearer user-token")
        );
        let query = seen.query.lock().unwrap().clone().unwrap();
        assert!(query.contains("date=gte.2025-03-01"), "got query {query}");
        assert!(query.contains("order=date.desc%2Cid.desc"), "got query {query}");
        assert!(query.contains("select=*") || query.contains("select=%2A"));
    }

    #[tokio::test]
    async fn browser_client_uses_anon_key() {
        let seen = Seen::default();
        let database = get_database(seen.clone()).await;

        database
            .browser_client()
            .from::<Transactions>()
            .maybe_single()
            .await
            .unwrap();

        assert_eq!(
            seen.authorization.lock().unwrap().as_deref(),
            Some("Bearer anon")
        );
        let query = seen.query.lock().unwrap().clone().unwrap();
        assert!(query.contains("limit=1"), "got query {query}");
    }
}
