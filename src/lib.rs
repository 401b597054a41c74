//! bytebank is the API behind the bytebank personal finance web and mobile apps.
//!
//! This library provides a JSON REST API for signing users in, recording and
//! browsing financial transactions, attaching files to them, and summarising
//! them on a dashboard. Users, data and files live in a backend-as-a-service
//! (Supabase) or, for offline development, in a local SQLite database and a
//! directory on disk.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod app_state;
mod attachment;
mod auth;
pub mod config;
mod dashboard;
mod database;
mod db;
mod endpoints;
pub mod format;
mod http_service;
mod logging;
pub mod models;
mod payload;
mod queries;
mod response_error;
mod routing;
mod storage;
mod transaction;
pub mod validation;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use attachment::AttachmentService;
pub use auth::{AuthService, PasswordHash, ValidatedPassword};
pub use config::{BackendConfig, Config};
pub use database::{Client, Database, Table};
pub use db::initialize as initialize_db;
pub use http_service::HttpService;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use queries::{
    AuthQueries, JsonServerTransactions, LocalBackend, Queries, SupabaseAuth,
    SupabaseTransactions, TransactionQueries,
};
pub use response_error::{GENERIC_ERROR_MESSAGE, handle_response_error};
pub use routing::build_router;
pub use storage::{LocalStorage, StorageClient, StorageService, StoredObject, SupabaseStorage};

use crate::validation::ValidationErrors;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
///
/// Some kinds carry the HTTP status they should be reported with, see
/// [Error::status]. The rest are classified by [handle_response_error].
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An error that already knows its HTTP status, e.g. an error response
    /// relayed from the backend.
    #[error("{message}")]
    Http {
        /// The status to respond with.
        status: StatusCode,
        /// The message to show the client.
        message: String,
    },

    /// A request payload failed validation.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// The email and password combination is not valid.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The request needs a session but did not include one.
    #[error("not authenticated")]
    Unauthenticated,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// A user already signed up with this email.
    #[error("a user with the email \"{0}\" already exists")]
    DuplicateEmail(String),

    /// An attachment name that is empty or could escape its directory.
    #[error("invalid file name \"{0}\"")]
    InvalidFileName(String),

    /// The multipart form could not be parsed into a file upload.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// The requested resource was not found.
    ///
    /// The string names the kind of resource, e.g. "user" or "transaction".
    #[error("{0} not found")]
    NotFound(&'static str),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The backend could not be reached or sent something unexpected.
    #[error("backend request failed: {0}")]
    Backend(String),

    /// The file storage failed for a reason other than a missing file.
    #[error("storage failed: {0}")]
    StorageError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The server configuration is incomplete or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An error occurred while serializing or deserializing JSON.
    #[error("could not (de)serialize JSON: {0}")]
    JSONSerializationError(String),
}

impl Error {
    /// The HTTP status this error explicitly carries, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Validation(_)
            | Error::TooWeak(_)
            | Error::InvalidFileName(_)
            | Error::MultipartError(_) => Some(StatusCode::BAD_REQUEST),
            Error::InvalidCredentials | Error::Unauthenticated => Some(StatusCode::UNAUTHORIZED),
            Error::DuplicateEmail(_) => Some(StatusCode::CONFLICT),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound("record"),
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        tracing::error!("backend request failed: {}", value);
        Error::Backend(value.to_string())
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Http {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<ValidationErrors> for Error {
    fn from(value: ValidationErrors) -> Self {
        Error::Validation(value)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        handle_response_error(&self)
    }
}
