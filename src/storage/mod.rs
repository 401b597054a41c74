//! File storage for attachments.
//!
//! [StorageClient] is the raw object store, either Supabase Storage or a
//! directory on disk. [StorageService] binds a client to one bucket.

mod local;
mod supabase;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::StatusCode;
use serde::Serialize;

pub use local::LocalStorage;
pub use supabase::SupabaseStorage;

use crate::{Error, models::AccessToken};

/// An object in a bucket, as returned by [StorageClient::list].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    /// The object's name relative to the listed prefix.
    pub name: String,
    /// The size in bytes, if the store reports it.
    pub size: Option<u64>,
}

/// An object store organised into buckets.
///
/// Paths use `/` as the separator. The access token is forwarded to stores
/// that check permissions per user.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Store `bytes` at `path`, replacing any existing object.
    async fn upload(
        &self,
        token: &AccessToken,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<(), Error>;

    /// Fetch the object at `path`.
    async fn download(&self, token: &AccessToken, bucket: &str, path: &str)
    -> Result<Bytes, Error>;

    /// Delete the objects at `paths`, returning how many were deleted.
    async fn remove(
        &self,
        token: &AccessToken,
        bucket: &str,
        paths: &[String],
    ) -> Result<usize, Error>;

    /// The objects directly under `prefix`.
    async fn list(
        &self,
        token: &AccessToken,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<StoredObject>, Error>;
}

/// A [StorageClient] bound to a single bucket.
#[derive(Clone)]
pub struct StorageService {
    client: Arc<dyn StorageClient>,
    bucket: String,
}

impl std::fmt::Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

/// Stores report a missing object in different ways, this folds them into one.
fn not_found_as_attachment(error: Error) -> Error {
    match error {
        Error::Http { status, .. } if status == StatusCode::NOT_FOUND => {
            Error::NotFound("attachment")
        }
        Error::Http { message, .. } if message.to_ascii_lowercase().contains("not found") => {
            Error::NotFound("attachment")
        }
        error => error,
    }
}

impl StorageService {
    /// Use `bucket` of `client`.
    pub fn new(client: Arc<dyn StorageClient>, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_owned(),
        }
    }

    /// The name of the bucket objects are stored in.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Store `bytes` at `path`.
    pub async fn upload(
        &self,
        token: &AccessToken,
        path: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<(), Error> {
        self.client
            .upload(token, &self.bucket, path, content_type, bytes)
            .await
    }

    /// Fetch the object at `path`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no object at `path`.
    pub async fn download(&self, token: &AccessToken, path: &str) -> Result<Bytes, Error> {
        self.client
            .download(token, &self.bucket, path)
            .await
            .map_err(not_found_as_attachment)
    }

    /// Delete the object at `path`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no object at `path`.
    pub async fn remove(&self, token: &AccessToken, path: &str) -> Result<(), Error> {
        let removed = self
            .client
            .remove(token, &self.bucket, &[path.to_owned()])
            .await
            .map_err(not_found_as_attachment)?;

        match removed {
            0 => Err(Error::NotFound("attachment")),
            _ => Ok(()),
        }
    }

    /// The objects directly under `prefix`.
    pub async fn list(
        &self,
        token: &AccessToken,
        prefix: &str,
    ) -> Result<Vec<StoredObject>, Error> {
        self.client.list(token, &self.bucket, prefix).await
    }
}
