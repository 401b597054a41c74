//! Defines the route handlers for the transaction endpoints.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
};
use serde_json::{Value, json};

use crate::{
    AppState, AttachmentService, Error,
    models::{AccessToken, Transaction},
    payload::Payload,
    queries::TransactionQueries,
    validation::{TransactionPayload, TransactionQuery},
};

/// The state needed for the transaction routes.
#[derive(Clone)]
pub struct TransactionState {
    /// Reads and writes the signed in user's transactions.
    pub transactions: Arc<dyn TransactionQueries>,
    /// Cleans up the files of deleted transactions.
    pub attachments: AttachmentService,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transactions: state.queries.transactions.clone(),
            attachments: state.attachments.clone(),
        }
    }
}

/// A route handler for listing transactions, newest first.
///
/// Accepts the query parameters `from` and `to` (inclusive dates) and `type`.
pub async fn get_transactions(
    State(state): State<TransactionState>,
    Extension(token): Extension<AccessToken>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let filter = query.parse()?;

    state.transactions.list(&token, &filter).await.map(Json)
}

/// A route handler for creating a new transaction.
pub async fn create_transaction(
    State(state): State<TransactionState>,
    Extension(token): Extension<AccessToken>,
    Payload(payload): Payload<TransactionPayload>,
) -> Result<Json<Transaction>, Error> {
    let new_transaction = payload.parse_new()?;
    let transaction = state.transactions.create(&token, new_transaction).await?;

    tracing::debug!("Created transaction {}", transaction.id);

    Ok(Json(transaction))
}

/// A route handler for getting a transaction by its ID.
pub async fn get_transaction(
    State(state): State<TransactionState>,
    Extension(token): Extension<AccessToken>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Transaction>, Error> {
    state.transactions.get(&token, &transaction_id).await.map(Json)
}

/// A route handler for replacing the fields of a transaction.
///
/// Any ID in the body is ignored in favour of the one in the path.
pub async fn update_transaction(
    State(state): State<TransactionState>,
    Extension(token): Extension<AccessToken>,
    Path(transaction_id): Path<String>,
    Payload(payload): Payload<TransactionPayload>,
) -> Result<Json<Transaction>, Error> {
    let changes = payload.parse_new()?;

    state
        .transactions
        .update(&token, &transaction_id, changes)
        .await
        .map(Json)
}

/// A route handler for deleting a transaction and its attachments.
pub async fn delete_transaction(
    State(state): State<TransactionState>,
    Extension(token): Extension<AccessToken>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Value>, Error> {
    state.attachments.remove_all(&token, &transaction_id).await?;
    state.transactions.delete(&token, &transaction_id).await?;

    tracing::debug!("Deleted transaction {transaction_id}");

    Ok(Json(json!({})))
}

#[cfg(test)]
mod transaction_route_tests {
    use std::path::Path;

    use axum::http::StatusCode;
    use axum_test::{
        TestServer,
        multipart::{MultipartForm, Part},
    };
    use serde_json::{Value, json};
    use time::macros::date;

    use crate::{
        build_router,
        models::{SignUpCredentials, Transaction, TransactionType},
        test_utils::{TEST_PASSWORD, TestApp, sign_up_test_user, test_app},
    };

    async fn get_server(app: &TestApp) -> (TestServer, String) {
        let session = sign_up_test_user(&app.state).await;
        let server =
            TestServer::new(build_router(app.state.clone())).expect("Could not create test server.");

        (server, session.access_token.as_str().to_owned())
    }

    fn transaction_body(kind: &str, description: &str, value: f64, date: &str) -> Value {
        json!({
            "type": kind,
            "description": description,
            "value": value,
            "date": date,
        })
    }

    async fn create(server: &TestServer, token: &str, body: Value) -> Transaction {
        let response = server
            .post("/api/transactions")
            .authorization_bearer(token)
            .json(&body)
            .await;

        response.assert_status_ok();
        response.json::<Transaction>()
    }

    #[tokio::test]
    async fn create_then_get() {
        let app = test_app();
        let (server, token) = get_server(&app).await;

        let created = create(
            &server,
            &token,
            transaction_body("credit", "Salary", 100.0, "2025-03-10"),
        )
        .await;
        let response = server
            .get(&format!("/api/transactions/{}", created.id))
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        let got = response.json::<Transaction>();
        assert_eq!(got, created);
        assert_eq!(got.kind, TransactionType::Credit);
        assert_eq!(got.date, date!(2025 - 03 - 10));
    }

    #[tokio::test]
    async fn create_rejects_invalid_payload() {
        let app = test_app();
        let (server, token) = get_server(&app).await;

        let response = server
            .post("/api/transactions")
            .authorization_bearer(&token)
            .json(&transaction_body("transfer", "", -5.0, "2025-03-10"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let message = response.text();
        for field in ["type", "description", "value"] {
            assert!(message.contains(field), "want {field} in {message:?}");
        }
    }

    #[tokio::test]
    async fn list_filters_by_date_and_type() {
        let app = test_app();
        let (server, token) = get_server(&app).await;
        create(&server, &token, transaction_body("credit", "Salary", 100.0, "2025-03-01")).await;
        let coffee =
            create(&server, &token, transaction_body("debit", "Coffee", 4.5, "2025-03-10")).await;
        create(&server, &token, transaction_body("debit", "Rent", 900.0, "2025-04-01")).await;

        let response = server
            .get("/api/transactions")
            .add_query_param("from", "2025-03-01")
            .add_query_param("to", "2025-03-31")
            .add_query_param("type", "debit")
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Vec<Transaction>>(), vec![coffee]);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let app = test_app();
        let (server, token) = get_server(&app).await;
        for date in ["2025-03-01", "2025-05-01", "2025-04-01"] {
            create(&server, &token, transaction_body("debit", "Rent", 900.0, date)).await;
        }

        let dates: Vec<String> = server
            .get("/api/transactions")
            .authorization_bearer(&token)
            .await
            .json::<Vec<Value>>()
            .into_iter()
            .map(|transaction| transaction["date"].as_str().unwrap_or_default().to_owned())
            .collect();

        assert_eq!(dates, ["2025-05-01", "2025-04-01", "2025-03-01"]);
    }

    #[tokio::test]
    async fn list_rejects_bad_dates() {
        let app = test_app();
        let (server, token) = get_server(&app).await;

        let response = server
            .get("/api/transactions")
            .add_query_param("from", "yesterday")
            .authorization_bearer(&token)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_text("from: Invalid date");
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let app = test_app();
        let (server, token) = get_server(&app).await;
        let created =
            create(&server, &token, transaction_body("debit", "Cofee", 4.5, "2025-03-10")).await;

        let response = server
            .put(&format!("/api/transactions/{}", created.id))
            .authorization_bearer(&token)
            .json(&transaction_body("debit", "Coffee", 5.0, "2025-03-10"))
            .await;

        response.assert_status_ok();
        let updated = response.json::<Transaction>();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.description, "Coffee");
        assert_eq!(updated.value, 5.0);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let app = test_app();
        let (server, token) = get_server(&app).await;
        let created =
            create(&server, &token, transaction_body("debit", "Coffee", 4.5, "2025-03-10")).await;
        let url = format!("/api/transactions/{}", created.id);

        server
            .delete(&url)
            .authorization_bearer(&token)
            .await
            .assert_status_ok();
        let response = server.get(&url).authorization_bearer(&token).await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_text("transaction not found");
    }

    fn count_files(directory: &Path) -> usize {
        let Ok(entries) = std::fs::read_dir(directory) else {
            return 0;
        };

        entries
            .map(|entry| entry.unwrap().path())
            .map(|path| if path.is_dir() { count_files(&path) } else { 1 })
            .sum()
    }

    #[tokio::test]
    async fn delete_removes_attachments() {
        let app = test_app();
        let (server, token) = get_server(&app).await;
        let created =
            create(&server, &token, transaction_body("debit", "Coffee", 4.5, "2025-03-10")).await;
        let url = format!("/api/transactions/{}", created.id);
        server
            .post(&format!("{url}/attachments"))
            .authorization_bearer(&token)
            .multipart(MultipartForm::new().add_part(
                "file",
                Part::bytes(b"%PDF-1.7".as_slice())
                    .file_name("receipt.pdf")
                    .mime_type("application/pdf"),
            ))
            .await
            .assert_status_ok();
        assert_eq!(count_files(&app.storage_dir), 1);

        server
            .delete(&url)
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        assert_eq!(count_files(&app.storage_dir), 0);
    }

    #[tokio::test]
    async fn transactions_need_a_session() {
        let app = test_app();
        let server =
            TestServer::new(build_router(app.state.clone())).expect("Could not create test server.");

        let response = server.get("/api/transactions").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_text("not authenticated");
    }

    #[tokio::test]
    async fn expired_or_unknown_token_is_unauthorized() {
        let app = test_app();
        let server =
            TestServer::new(build_router(app.state.clone())).expect("Could not create test server.");

        let response = server
            .get("/api/transactions")
            .authorization_bearer("not-a-session")
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn users_cannot_see_each_others_transactions() {
        let app = test_app();
        let (server, token) = get_server(&app).await;
        let created =
            create(&server, &token, transaction_body("debit", "Coffee", 4.5, "2025-03-10")).await;
        let other = app
            .state
            .auth
            .sign_up(&SignUpCredentials {
                name: "Bruno".to_owned(),
                email: "bruno@example.com".to_owned(),
                password: TEST_PASSWORD.to_owned(),
            })
            .await
            .unwrap()
            .session
            .unwrap();

        let response = server
            .get(&format!("/api/transactions/{}", created.id))
            .authorization_bearer(other.access_token.as_str())
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
