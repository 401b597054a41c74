//! The API endpoints URIs.
//!
//! For endpoints that take parameters, e.g., '/api/transactions/{transaction_id}', use [format_endpoint].

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything except the unreserved characters of RFC 3986.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route for signing in, getting and updating the current user.
pub const AUTH: &str = "/api/auth";
/// The route for creating a new account.
pub const SIGN_UP: &str = "/api/auth/signup";
/// The route for ending the current session.
pub const SIGN_OUT: &str = "/api/auth/signout";
/// The route for requesting a password recovery email.
pub const FORGOT_PASSWORD: &str = "/api/auth/forgot-password";
/// The route to access transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to list and upload the files attached to a transaction.
pub const ATTACHMENTS: &str = "/api/transactions/{transaction_id}/attachments";
/// The route to download or delete a single attached file.
pub const ATTACHMENT: &str = "/api/transactions/{transaction_id}/attachments/{file_name}";
/// The route for the dashboard summary.
pub const DASHBOARD: &str = "/api/dashboard";

/// Replace the parameters in `endpoint_path` with `values`, in order.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// Values are percent-encoded so they stay a single path segment. Parameters
/// without a value are left as is.
pub fn format_endpoint(endpoint_path: &str, values: &[&str]) -> String {
    let mut formatted = String::with_capacity(endpoint_path.len());
    let mut values = values.iter();
    let mut rest = endpoint_path;

    while let Some(param_start) = rest.find('{') {
        let Some(param_length) = rest[param_start..].find('}') else {
            break;
        };
        let param_end = param_start + param_length + 1;

        formatted.push_str(&rest[..param_start]);

        match values.next() {
            Some(value) => formatted.push_str(&encode_path_segment(value)),
            None => formatted.push_str(&rest[param_start..param_end]),
        }

        rest = &rest[param_end..];
    }

    formatted.push_str(rest);
    formatted
}

pub(crate) fn encode_path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::COFFEE);
        assert_endpoint_is_valid_uri(endpoints::AUTH);
        assert_endpoint_is_valid_uri(endpoints::SIGN_UP);
        assert_endpoint_is_valid_uri(endpoints::SIGN_OUT);
        assert_endpoint_is_valid_uri(endpoints::FORGOT_PASSWORD);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::ATTACHMENTS);
        assert_endpoint_is_valid_uri(endpoints::ATTACHMENT);
        assert_endpoint_is_valid_uri(endpoints::DASHBOARD);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", &["1"]);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/hello/{world}", &["1"]);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", &["1"]);

        assert_eq!(formatted_path, "/hello/world");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/hello/{world}/bye", &["1"]);

        assert_eq!(formatted_path, "/hello/1/bye");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn fills_several_parameters_in_order() {
        let formatted_path = format_endpoint(endpoints::ATTACHMENT, &["42", "receipt.pdf"]);

        assert_eq!(
            formatted_path,
            "/api/transactions/42/attachments/receipt.pdf"
        );
    }

    #[test]
    fn encodes_values() {
        let formatted_path =
            format_endpoint(endpoints::ATTACHMENT, &["42", "nota fiscal #1.pdf"]);

        assert_eq!(
            formatted_path,
            "/api/transactions/42/attachments/nota%20fiscal%20%231.pdf"
        );
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn encodes_non_ascii_and_separators() {
        let formatted_path =
            format_endpoint(endpoints::ATTACHMENT, &["4/2", "recibo ção?.pdf"]);

        assert_eq!(
            formatted_path,
            "/api/transactions/4%2F2/attachments/recibo%20%C3%A7%C3%A3o%3F.pdf"
        );
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn missing_values_leave_parameters() {
        let formatted_path = format_endpoint(endpoints::ATTACHMENT, &["42"]);

        assert_eq!(
            formatted_path,
            "/api/transactions/42/attachments/{file_name}"
        );
    }
}
