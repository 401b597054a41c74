//! Turns any [Error] into a plain text HTTP response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::Error;

/// The body sent for errors that are not meant to be shown to the client.
pub const GENERIC_ERROR_MESSAGE: &str = "Internal server error";

/// Map a caught error to an HTTP response with a plain text body.
///
/// The rules are applied in order:
/// 1. an error that carries a status is sent with that status and its message,
/// 2. an error whose message mentions "not found" is sent as a 404 with its message,
/// 3. anything else is logged and sent as a 500 with [GENERIC_ERROR_MESSAGE].
pub fn handle_response_error(error: &Error) -> Response {
    let message = error.to_string();

    if let Some(status) = error.status() {
        tracing::debug!("Responding with {status}: {message}");
        return (status, message).into_response();
    }

    if message.to_ascii_lowercase().contains("not found") {
        tracing::debug!("Responding with 404: {message}");
        return (StatusCode::NOT_FOUND, message).into_response();
    }

    tracing::error!("An unexpected error occurred: {message}");
    (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR_MESSAGE).into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::{
        Error,
        test_utils::{assert_content_type, body_text},
        validation::ValidationErrors,
    };

    use super::{GENERIC_ERROR_MESSAGE, handle_response_error};

    #[tokio::test]
    async fn explicit_status_is_used_verbatim() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::UNPROCESSABLE_ENTITY,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let error = Error::Http {
                status,
                message: "Invalid login credentials".to_owned(),
            };

            let response = handle_response_error(&error);

            assert_eq!(response.status(), status);
            assert_eq!(body_text(response).await, "Invalid login credentials");
        }
    }

    #[tokio::test]
    async fn explicit_status_wins_over_not_found_message() {
        let error = Error::Http {
            status: StatusCode::BAD_REQUEST,
            message: "Bucket not found".to_owned(),
        };

        let response = handle_response_error(&error);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn not_found_message_gives_404() {
        for error in [
            Error::NotFound("user"),
            Error::Backend("object not found".to_owned()),
            Error::StorageError("Object Not Found in bucket".to_owned()),
        ] {
            let message = error.to_string();

            let response = handle_response_error(&error);

            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert_eq!(body_text(response).await, message);
        }
    }

    #[tokio::test]
    async fn other_errors_give_generic_500() {
        for error in [
            Error::Backend("connection refused".to_owned()),
            Error::DatabaseLockError,
            Error::HashingError("bad cost".to_owned()),
        ] {
            let response = handle_response_error(&error);

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body_text(response).await, GENERIC_ERROR_MESSAGE);
        }
    }

    #[tokio::test]
    async fn body_is_plain_text() {
        let error = Error::from(ValidationErrors::single("email", "Invalid email"));

        let response = handle_response_error(&error);

        assert_content_type(&response, "text/plain; charset=utf-8");
    }
}
