//! A JSON body extractor whose rejections go through [handle_response_error](crate::handle_response_error).

use axum::extract::FromRequest;

use crate::Error;

/// Like [axum::Json], but a body that is not valid JSON is reported as an
/// [Error] so it is answered in plain text like every other error.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct Payload<T>(pub T);

#[cfg(test)]
mod payload_tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use serde_json::Value;

    use super::Payload;

    async fn echo(Payload(body): Payload<Value>) -> String {
        body.to_string()
    }

    fn get_server() -> TestServer {
        TestServer::new(Router::new().route("/echo", post(echo)))
            .expect("Could not create test server.")
    }

    #[tokio::test]
    async fn accepts_json() {
        let response = get_server()
            .post("/echo")
            .json(&serde_json::json!({ "a": 1 }))
            .await;

        response.assert_status_ok();
        response.assert_text(r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let response = get_server()
            .post("/echo")
            .content_type("application/json")
            .text("{not json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_content_type_is_unsupported() {
        let response = get_server().post("/echo").text("{}").await;

        response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
