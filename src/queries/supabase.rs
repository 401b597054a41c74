//! Query groups backed by the hosted Supabase project.
//!
//! Auth goes to the GoTrue REST API under `/auth/v1`, transactions go through
//! the typed [Database] client so row level security scopes them to the user.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::{
    Error, HttpService,
    database::{
        Database,
        schema::{TransactionInsert, Transactions},
    },
    models::{
        AccessToken, NewTransaction, Session, SignInCredentials, SignUpCredentials, SignUpOutcome,
        Transaction, TransactionFilter, User, UserChanges,
    },
    queries::{AuthQueries, TransactionQueries},
};

/// Users and sessions managed by Supabase Auth (GoTrue).
#[derive(Debug, Clone)]
pub struct SupabaseAuth {
    http: HttpService,
}

impl SupabaseAuth {
    /// Use the auth API of the project `database` is connected to.
    pub fn new(database: &Database) -> Self {
        Self {
            http: database.http().nest("auth/v1"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

impl From<GoTrueUser> for User {
    fn from(user: GoTrueUser) -> Self {
        User {
            id: user.id,
            email: user.email.unwrap_or_default(),
            name: user.user_metadata.name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    access_token: AccessToken,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: GoTrueUser,
}

impl GoTrueSession {
    fn into_session(self) -> Result<Session, Error> {
        let expires_at = match (self.expires_at, self.expires_in) {
            (Some(timestamp), _) => OffsetDateTime::from_unix_timestamp(timestamp)
                .map_err(|error| Error::Backend(format!("invalid session expiry: {error}")))?,
            (None, Some(seconds)) => OffsetDateTime::now_utc() + Duration::seconds(seconds),
            (None, None) => {
                return Err(Error::Backend("session is missing its expiry".to_owned()));
            }
        };

        Ok(Session {
            access_token: self.access_token,
            expires_at,
            user: self.user.into(),
        })
    }
}

/// Sign up responds with a session when email confirmation is off, and with
/// just the user when it is on.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(GoTrueSession),
    User(GoTrueUser),
}

#[derive(Serialize)]
struct UserUpdate<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

#[async_trait]
impl AuthQueries for SupabaseAuth {
    async fn sign_up(&self, credentials: &SignUpCredentials) -> Result<SignUpOutcome, Error> {
        let body = json!({
            "email": credentials.email,
            "password": credentials.password,
            "data": { "name": credentials.name },
        });

        let response: SignUpResponse = self.http.post("signup", &body).await?;

        match response {
            SignUpResponse::Session(session) => {
                let session = session.into_session()?;

                Ok(SignUpOutcome {
                    user: session.user.clone(),
                    session: Some(session),
                })
            }
            SignUpResponse::User(user) => Ok(SignUpOutcome {
                user: user.into(),
                session: None,
            }),
        }
    }

    async fn sign_in_with_password(
        &self,
        credentials: &SignInCredentials,
    ) -> Result<Session, Error> {
        let request = self
            .http
            .request(Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(&json!({
                "email": credentials.email,
                "password": credentials.password,
            }));

        let session: GoTrueSession = HttpService::send_json(request).await?;

        session.into_session()
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), Error> {
        let request = self
            .http
            .request(Method::POST, "logout")
            .bearer_auth(token.as_str());

        HttpService::send_empty(request).await
    }

    async fn forgot_password(&self, email: &str, redirect_to: Option<&str>) -> Result<(), Error> {
        let mut request = self
            .http
            .request(Method::POST, "recover")
            .json(&json!({ "email": email }));

        if let Some(redirect_to) = redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }

        HttpService::send_empty(request).await
    }

    async fn update_user(&self, token: &AccessToken, changes: &UserChanges) -> Result<User, Error> {
        let body = UserUpdate {
            email: changes.email.as_deref(),
            password: changes.password.as_deref(),
            data: changes.name.as_ref().map(|name| json!({ "name": name })),
        };
        let request = self
            .http
            .request(Method::PUT, "user")
            .bearer_auth(token.as_str())
            .json(&body);

        let user: GoTrueUser = HttpService::send_json(request).await?;

        Ok(user.into())
    }

    async fn get_current_user(&self, token: &AccessToken) -> Result<Option<User>, Error> {
        let request = self
            .http
            .request(Method::GET, "user")
            .bearer_auth(token.as_str());

        match HttpService::send_json::<GoTrueUser>(request).await {
            Ok(user) => Ok(Some(user.into())),
            Err(Error::Http { status, .. })
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN =>
            {
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }
}

/// Transactions stored in the `transactions` table of the hosted database.
#[derive(Debug, Clone)]
pub struct SupabaseTransactions {
    database: Database,
}

impl SupabaseTransactions {
    /// Query the tables of `database`.
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

/// Row IDs are integers, anything else cannot name a row.
fn parse_row_id(id: &str) -> Result<i64, Error> {
    id.parse().map_err(|_| Error::NotFound("transaction"))
}

#[async_trait]
impl TransactionQueries for SupabaseTransactions {
    async fn list(
        &self,
        token: &AccessToken,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, Error> {
        let client = self.database.server_client(token);
        let mut query = client.from::<Transactions>();

        if let Some(from) = filter.from {
            query = query.gte("date", from);
        }
        if let Some(to) = filter.to {
            query = query.lte("date", to);
        }
        if let Some(kind) = filter.kind {
            query = query.eq("type", kind);
        }

        let rows = query.order("date", false).order("id", false).select().await?;

        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    async fn get(&self, token: &AccessToken, id: &str) -> Result<Transaction, Error> {
        let id = parse_row_id(id)?;

        self.database
            .server_client(token)
            .from::<Transactions>()
            .eq("id", id)
            .maybe_single()
            .await?
            .map(Transaction::from)
            .ok_or(Error::NotFound("transaction"))
    }

    async fn create(
        &self,
        token: &AccessToken,
        transaction: NewTransaction,
    ) -> Result<Transaction, Error> {
        let row = self
            .database
            .server_client(token)
            .from::<Transactions>()
            .insert(&TransactionInsert::from(transaction))
            .await?;

        Ok(row.into())
    }

    async fn update(
        &self,
        token: &AccessToken,
        id: &str,
        transaction: NewTransaction,
    ) -> Result<Transaction, Error> {
        let id = parse_row_id(id)?;

        self.database
            .server_client(token)
            .from::<Transactions>()
            .eq("id", id)
            .update(&TransactionInsert::from(transaction))
            .await?
            .into_iter()
            .next()
            .map(Transaction::from)
            .ok_or(Error::NotFound("transaction"))
    }

    async fn delete(&self, token: &AccessToken, id: &str) -> Result<(), Error> {
        let id = parse_row_id(id)?;

        let deleted = self
            .database
            .server_client(token)
            .from::<Transactions>()
            .eq("id", id)
            .delete()
            .await?;

        if deleted.is_empty() {
            Err(Error::NotFound("transaction"))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod supabase_auth_tests {
    use axum::{
        Json, Router,
        extract::RawQuery,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
    };
    use serde_json::{Value, json};

    use crate::{
        Error,
        database::Database,
        models::{AccessToken, SignInCredentials, SignUpCredentials},
        queries::AuthQueries,
        test_utils::spawn_test_backend,
    };

    use super::SupabaseAuth;

    fn go_true_user() -> Value {
        json!({
            "id": "7f1c",
            "email": "ana@example.com",
            "user_metadata": { "name": "Ana" },
        })
    }

    async fn token(RawQuery(query): RawQuery, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if query.as_deref() != Some("grant_type=password") {
            return (StatusCode::BAD_REQUEST, Json(json!({ "msg": "bad grant" })));
        }

        if body["password"] != "correct horse" {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "code": 400, "msg": "Invalid login credentials" })),
            );
        }

        (
            StatusCode::OK,
            Json(json!({
                "access_token": "jwt",
                "token_type": "bearer",
                "expires_in": 3600,
                "expires_at": 1_900_000_000,
                "refresh_token": "refresh",
                "user": go_true_user(),
            })),
        )
    }

    async fn signup() -> Json<Value> {
        Json(go_true_user())
    }

    async fn user(headers: HeaderMap) -> (StatusCode, Json<Value>) {
        match headers.get("authorization").and_then(|value| value.to_str().ok()) {
            Some("Bearer jwt") => (StatusCode::OK, Json(go_true_user())),
            _ => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "msg": "invalid JWT" })),
            ),
        }
    }

    async fn get_auth() -> SupabaseAuth {
        let router = Router::new()
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/signup", post(signup))
            .route("/auth/v1/user", get(user));
        let base_url = spawn_test_backend(router).await;

        SupabaseAuth::new(&Database::connect(&base_url, "anon").unwrap())
    }

    #[tokio::test]
    async fn sign_in_returns_session() {
        let auth = get_auth().await;

        let session = auth
            .sign_in_with_password(&SignInCredentials {
                email: "ana@example.com".to_owned(),
                password: "correct horse".to_owned(),
            })
            .await
            .unwrap();

        assert_eq!(session.access_token, AccessToken::new("jwt"));
        assert_eq!(session.expires_at.unix_timestamp(), 1_900_000_000);
        assert_eq!(session.user.name.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn sign_in_relays_backend_error() {
        let auth = get_auth().await;

        let result = auth
            .sign_in_with_password(&SignInCredentials {
                email: "ana@example.com".to_owned(),
                password: "wrong".to_owned(),
            })
            .await;

        assert_eq!(
            result,
            Err(Error::Http {
                status: StatusCode::BAD_REQUEST,
                message: "Invalid login credentials".to_owned(),
            })
        );
    }

    #[tokio::test]
    async fn sign_up_without_confirmation_has_no_session() {
        let auth = get_auth().await;

        let outcome = auth
            .sign_up(&SignUpCredentials {
                name: "Ana".to_owned(),
                email: "ana@example.com".to_owned(),
                password: "correct horse".to_owned(),
            })
            .await
            .unwrap();

        assert_eq!(outcome.user.id, "7f1c");
        assert!(outcome.session.is_none());
    }

    #[tokio::test]
    async fn current_user_is_none_for_rejected_token() {
        let auth = get_auth().await;

        let user = auth
            .get_current_user(&AccessToken::new("expired"))
            .await
            .unwrap();

        assert_eq!(user, None);
    }

    #[tokio::test]
    async fn current_user_for_valid_token() {
        let auth = get_auth().await;

        let user = auth.get_current_user(&AccessToken::new("jwt")).await.unwrap();

        assert_eq!(user.map(|user| user.email), Some("ana@example.com".to_owned()));
    }
}

#[cfg(test)]
mod supabase_transactions_tests {
    use axum::{Json, Router, routing::get};
    use serde_json::{Value, json};

    use crate::{
        Error, database::Database, models::AccessToken, queries::TransactionQueries,
        test_utils::spawn_test_backend,
    };

    use super::SupabaseTransactions;

    async fn no_rows() -> Json<Value> {
        Json(json!([]))
    }

    async fn get_transactions() -> SupabaseTransactions {
        let router = Router::new().route("/rest/v1/transactions", get(no_rows).delete(no_rows));
        let base_url = spawn_test_backend(router).await;

        SupabaseTransactions::new(Database::connect(&base_url, "anon").unwrap())
    }

    #[tokio::test]
    async fn get_missing_row_is_not_found() {
        let transactions = get_transactions().await;

        let result = transactions.get(&AccessToken::new("jwt"), "42").await;

        assert_eq!(result, Err(Error::NotFound("transaction")));
    }

    #[tokio::test]
    async fn non_numeric_id_is_not_found() {
        let transactions = get_transactions().await;

        let result = transactions.get(&AccessToken::new("jwt"), "abc").await;

        assert_eq!(result, Err(Error::NotFound("transaction")));
    }

    #[tokio::test]
    async fn delete_without_rows_is_not_found() {
        let transactions = get_transactions().await;

        let result = transactions.delete(&AccessToken::new("jwt"), "42").await;

        assert_eq!(result, Err(Error::NotFound("transaction")));
    }
}
