use axum::{Router, body::Body, response::Response};
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral local port and return its base URL.
///
/// Used to stand in for the hosted backend and the JSON mock server.
pub(crate) async fn spawn_test_backend(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("could not bind test backend");
    let address = listener
        .local_addr()
        .expect("could not get test backend address");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("test backend stopped unexpectedly");
    });

    format!("http://{address}")
}

#[track_caller]
pub(crate) fn assert_content_type(response: &Response<Body>, content_type: &str) {
    let content_type_header = response
        .headers()
        .get("content-type")
        .expect("content-type header missing");
    assert_eq!(content_type_header, content_type);
}

pub(crate) async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("could not read response body");

    String::from_utf8(bytes.to_vec()).expect("response body is not UTF-8")
}
