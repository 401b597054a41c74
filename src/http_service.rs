//! A small JSON-over-HTTP client bound to a base URL.
//!
//! Every backend that is reached over HTTP (Supabase, the JSON mock server)
//! goes through [HttpService], so that error responses are translated the
//! same way everywhere.

use reqwest::{
    Method, RequestBuilder, Response, StatusCode, Url,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::Error;

/// An HTTP client that sends requests relative to a base URL with a set of
/// default headers.
#[derive(Debug, Clone)]
pub struct HttpService {
    client: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
}

impl HttpService {
    /// Create a client for the service at `base_url`, e.g. "http://localhost:3001".
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client for `base_url` that reuses the connection pool of `client`.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            headers: HeaderMap::new(),
        }
    }

    /// Add a header that is sent with every request.
    ///
    /// # Errors
    /// Returns [Error::Backend] if `name` or `value` is not a valid header.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, Error> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|error| Error::Backend(format!("invalid header name {name}: {error}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|error| Error::Backend(format!("invalid value for header {name}: {error}")))?;

        self.headers.insert(name, value);
        Ok(self)
    }

    /// Create a client for a path below this one's base URL, keeping the
    /// default headers and connection pool.
    pub fn nest(&self, path: &str) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.url(path),
            headers: self.headers.clone(),
        }
    }

    /// The URL requests are sent relative to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The full URL for `path`.
    pub fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');

        if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Start a request to `path` with the default headers set.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .headers(self.headers.clone())
    }

    /// Start a request to the path made of `segments`, percent-encoding each one.
    ///
    /// Use this instead of [HttpService::request] when a segment comes from the
    /// user, e.g. a file name.
    ///
    /// # Errors
    /// Returns [Error::Backend] if the base URL cannot have a path.
    pub fn request_segments(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<RequestBuilder, Error> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|error| Error::Backend(format!("invalid URL {}: {error}", self.base_url)))?;

        url.path_segments_mut()
            .map_err(|_| Error::Backend(format!("URL {} cannot have a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        Ok(self.client.request(method, url).headers(self.headers.clone()))
    }

    /// GET `path` and decode the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        Self::send_json(self.request(Method::GET, path)).await
    }

    /// POST `body` as JSON to `path` and decode the JSON response.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        Self::send_json(self.request(Method::POST, path).json(body)).await
    }

    /// PUT `body` as JSON to `path` and decode the JSON response.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        Self::send_json(self.request(Method::PUT, path).json(body)).await
    }

    /// PATCH `body` as JSON to `path` and decode the JSON response.
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        Self::send_json(self.request(Method::PATCH, path).json(body)).await
    }

    /// DELETE `path`, ignoring any response body.
    pub async fn delete(&self, path: &str) -> Result<(), Error> {
        Self::send_empty(self.request(Method::DELETE, path)).await
    }

    /// Send `request` and decode the JSON response.
    ///
    /// # Errors
    /// Returns an [Error::Http] with the upstream status and message for non-2xx
    /// responses, or an [Error::Backend] if the request could not be sent or the
    /// response could not be decoded.
    pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, Error> {
        let response = check_status(request.send().await?).await?;
        let body = response.bytes().await?;

        serde_json::from_slice(&body).map_err(|error| {
            tracing::error!("could not decode backend response: {error}");
            Error::Backend(format!("unexpected response body: {error}"))
        })
    }

    /// Send `request` and return the raw response body.
    pub async fn send_bytes(request: RequestBuilder) -> Result<axum::body::Bytes, Error> {
        let response = check_status(request.send().await?).await?;

        Ok(response.bytes().await?)
    }

    /// Send `request` and discard the response body.
    pub async fn send_empty(request: RequestBuilder) -> Result<(), Error> {
        check_status(request.send().await?).await?;

        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, Error> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    tracing::debug!("backend responded with {status}: {message}");

    Err(Error::Http { status, message })
}

/// Pull a human readable message out of an error response body.
///
/// Backends disagree on where the message goes, so the common JSON fields are
/// tried in turn before falling back to the raw text and then the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            match fields.get(key) {
                Some(Value::String(message)) if !message.is_empty() => return message.to_owned(),
                _ => {}
            }
        }
    }

    let body = body.trim();
    if !body.is_empty() && !body.starts_with('{') {
        return body.to_owned();
    }

    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_owned()
}


#[cfg(test)]
mod http_service_tests {
    use axum::{
        Json, Router,
        http::{HeaderMap, StatusCode},
        routing::get,
    };
    use serde_json::{Value, json};

    use crate::{Error, test_utils::spawn_test_backend};

    use super::HttpService;

    async fn echo_api_key(headers: HeaderMap) -> Json<Value> {
        let api_key = headers
            .get("apikey")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();

        Json(json!({ "apikey": api_key }))
    }

    async fn teapot() -> (StatusCode, Json<Value>) {
        (StatusCode::IM_A_TEAPOT, Json(json!({ "message": "short and stout" })))
    }

    #[tokio::test]
    async fn sends_default_headers() {
        let base_url = spawn_test_backend(Router::new().route("/echo", get(echo_api_key))).await;
        let http = HttpService::new(&base_url)
            .with_header("apikey", "anon")
            .unwrap();

        let got: Value = http.get("/echo").await.unwrap();

        assert_eq!(got["apikey"], "anon");
    }

    #[tokio::test]
    async fn error_status_and_message_are_relayed() {
        let base_url = spawn_test_backend(Router::new().route("/teapot", get(teapot))).await;
        let http = HttpService::new(&base_url);

        let got = http.get::<Value>("teapot").await;

        assert_eq!(
            got,
            Err(Error::Http {
                status: StatusCode::IM_A_TEAPOT,
                message: "short and stout".to_owned(),
            })
        );
    }

    #[tokio::test]
    async fn nested_service_keeps_headers() {
        let base_url =
            spawn_test_backend(Router::new().route("/rest/v1/echo", get(echo_api_key))).await;
        let http = HttpService::new(&base_url)
            .with_header("apikey", "anon")
            .unwrap()
            .nest("/rest/v1");

        let got: Value = http.get("echo").await.unwrap();

        assert_eq!(got["apikey"], "anon");
    }

    #[test]
    fn segments_are_percent_encoded() {
        let http = HttpService::new("http://localhost:3001/storage/v1");

        let request = http
            .request_segments(reqwest::Method::GET, &["object", "attachments", "my receipt#1.pdf"])
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "http://localhost:3001/storage/v1/object/attachments/my%20receipt%231.pdf"
        );
    }

    #[test]
    fn joins_paths_without_double_slashes() {
        let http = HttpService::new("http://localhost:3001/");

        assert_eq!(http.url("/transactions"), "http://localhost:3001/transactions");
        assert_eq!(http.url(""), "http://localhost:3001");
    }
}
