//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{
        HeaderMap, HeaderName, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::{Error, GENERIC_ERROR_MESSAGE};

/// Bodies longer than this many bytes are truncated in the `info` log.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// JSON fields whose values never appear in the logs.
const REDACTED_FIELDS: [&str; 3] = ["password", "confirmPassword", "access_token"];

const REDACTED: &str = "********";

/// Headers that carry session tokens. Their values are logged as `Sensitive`.
const SENSITIVE_HEADERS: [HeaderName; 3] = [AUTHORIZATION, COOKIE, SET_COOKIE];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords and access tokens in JSON bodies are redacted, as are the
/// authorization and cookie headers. Binary bodies are only logged by their size.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    mark_sensitive_headers(&mut parts.headers);
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(error) => {
            tracing::debug!("Could not read request body: {error}");
            return Error::Http {
                status: StatusCode::BAD_REQUEST,
                message: format!("could not read request body: {error}"),
            }
            .into_response();
        }
    };

    let display_text = body_for_display(&parts.headers, &body);
    log_body("Received request", &format!("{parts:#?}"), &display_text);

    let request = Request::from_parts(parts, Body::from(body));
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    mark_sensitive_headers(&mut parts.headers);
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR_MESSAGE).into_response();
        }
    };

    let display_text = body_for_display(&parts.headers, &body);
    log_body("Sending response", &format!("{parts:#?}"), &display_text);

    Response::from_parts(parts, Body::from(body))
}

fn mark_sensitive_headers(headers: &mut HeaderMap) {
    for (name, value) in headers.iter_mut() {
        if SENSITIVE_HEADERS.contains(name) {
            value.set_sensitive(true);
        }
    }
}

fn body_for_display(headers: &HeaderMap, body: &Bytes) -> String {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/json") {
        match serde_json::from_slice::<Value>(body) {
            Ok(mut json) => {
                redact_json(&mut json);
                json.to_string()
            }
            Err(_) => String::from_utf8_lossy(body).into_owned(),
        }
    } else if content_type.starts_with("text/") || (content_type.is_empty() && body.is_ascii()) {
        String::from_utf8_lossy(body).into_owned()
    } else {
        format!("<{} bytes of {content_type}>", body.len())
    }
}

/// Replace the values of [REDACTED_FIELDS] at any depth.
fn redact_json(json: &mut Value) {
    match json {
        Value::Object(fields) => {
            for (key, value) in fields.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *value = Value::String(REDACTED.to_owned());
                } else {
                    redact_json(value);
                }
            }
        }
        Value::Array(values) => values.iter_mut().for_each(redact_json),
        _ => {}
    }
}

/// The longest prefix of `text` that fits in `limit` bytes without splitting a character.
fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }

    let end = text
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= limit)
        .last()
        .unwrap_or(0);

    &text[..end]
}

fn log_body(label: &str, parts: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "{label}: {parts}\nbody: {:}...",
            truncate(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{label}: {parts}\nbody: {body:?}");
    }
}
