//! Objects stored as files in a local directory, one subdirectory per bucket.

use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use async_trait::async_trait;
use axum::body::Bytes;
use tokio::fs;

use crate::{
    Error,
    models::AccessToken,
    storage::{StorageClient, StoredObject},
};

/// A directory on disk used as an object store.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Store objects under `root`, which is created on first upload.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The file for `path` in `bucket`.
    ///
    /// # Errors
    /// Returns [Error::StorageError] if `path` would leave the bucket directory.
    fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf, Error> {
        let relative = Path::new(bucket).join(path);
        let stays_inside = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

        if stays_inside {
            Ok(self.root.join(relative))
        } else {
            Err(Error::StorageError(format!("invalid object path \"{path}\"")))
        }
    }
}

fn storage_error(error: std::io::Error) -> Error {
    match error.kind() {
        ErrorKind::NotFound => Error::NotFound("attachment"),
        _ => {
            tracing::error!("local storage failed: {error}");
            Error::StorageError(error.to_string())
        }
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn upload(
        &self,
        _token: &AccessToken,
        bucket: &str,
        path: &str,
        _content_type: &str,
        bytes: Bytes,
    ) -> Result<(), Error> {
        let file_path = self.object_path(bucket, path)?;

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(storage_error)?;
        }

        fs::write(&file_path, &bytes).await.map_err(storage_error)
    }

    async fn download(
        &self,
        _token: &AccessToken,
        bucket: &str,
        path: &str,
    ) -> Result<Bytes, Error> {
        let file_path = self.object_path(bucket, path)?;

        let contents = fs::read(&file_path).await.map_err(storage_error)?;

        Ok(Bytes::from(contents))
    }

    async fn remove(
        &self,
        _token: &AccessToken,
        bucket: &str,
        paths: &[String],
    ) -> Result<usize, Error> {
        let mut removed = 0;

        for path in paths {
            let file_path = self.object_path(bucket, path)?;

            match fs::remove_file(&file_path).await {
                Ok(()) => removed += 1,
                Err(error) if error.kind() == ErrorKind::NotFound => {}
                Err(error) => return Err(storage_error(error)),
            }
        }

        Ok(removed)
    }

    async fn list(
        &self,
        _token: &AccessToken,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<StoredObject>, Error> {
        let directory = self.object_path(bucket, prefix)?;

        let mut entries = match fs::read_dir(&directory).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(storage_error(error)),
        };

        let mut objects = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(storage_error)? {
            let metadata = entry.metadata().await.map_err(storage_error)?;

            if !metadata.is_file() {
                continue;
            }

            objects.push(StoredObject {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: Some(metadata.len()),
            });
        }

        objects.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(objects)
    }
}
