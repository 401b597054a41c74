//! Objects in Supabase Storage, reached through its REST API under `/storage/v1`.

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::{
    Error, HttpService,
    database::Database,
    models::AccessToken,
    storage::{StorageClient, StoredObject},
};

/// The Storage API of a Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    http: HttpService,
}

impl SupabaseStorage {
    /// Use the Storage API of the project `database` is connected to.
    pub fn new(database: &Database) -> Self {
        Self {
            http: database.http().nest("storage/v1"),
        }
    }

    fn object_request(
        &self,
        method: Method,
        token: &AccessToken,
        prefix: &[&str],
        path: &str,
    ) -> Result<reqwest::RequestBuilder, Error> {
        let segments: Vec<&str> = prefix.iter().copied().chain(path.split('/')).collect();

        Ok(self
            .http
            .request_segments(method, &segments)?
            .bearer_auth(token.as_str()))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ObjectMetadata {
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ListedObject {
    name: String,
    /// Folders are listed without an ID.
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    metadata: Option<ObjectMetadata>,
}

#[async_trait]
impl StorageClient for SupabaseStorage {
    async fn upload(
        &self,
        token: &AccessToken,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<(), Error> {
        let request = self
            .object_request(Method::POST, token, &["object", bucket], path)?
            .header("content-type", content_type)
            .header("x-upsert", "true")
            .body(bytes);

        HttpService::send_empty(request).await
    }

    async fn download(
        &self,
        token: &AccessToken,
        bucket: &str,
        path: &str,
    ) -> Result<Bytes, Error> {
        let request =
            self.object_request(Method::GET, token, &["object", "authenticated", bucket], path)?;

        HttpService::send_bytes(request).await
    }

    async fn remove(
        &self,
        token: &AccessToken,
        bucket: &str,
        paths: &[String],
    ) -> Result<usize, Error> {
        let request = self
            .http
            .request_segments(Method::DELETE, &["object", bucket])?
            .bearer_auth(token.as_str())
            .json(&json!({ "prefixes": paths }));

        let removed: Vec<serde_json::Value> = HttpService::send_json(request).await?;

        Ok(removed.len())
    }

    async fn list(
        &self,
        token: &AccessToken,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<StoredObject>, Error> {
        let request = self
            .http
            .request_segments(Method::POST, &["object", "list", bucket])?
            .bearer_auth(token.as_str())
            .json(&json!({
                "prefix": prefix,
                "limit": 1000,
                "offset": 0,
                "sortBy": { "column": "name", "order": "asc" },
            }));

        let listed: Vec<ListedObject> = HttpService::send_json(request).await?;

        Ok(listed
            .into_iter()
            .filter(|object| object.id.is_some())
            .map(|object| StoredObject {
                size: object.metadata.and_then(|metadata| metadata.size),
                name: object.name,
            })
            .collect())
    }
}
