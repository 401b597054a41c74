//! Files attached to transactions, e.g. receipts.
//!
//! Attachments are objects in the storage bucket under
//! `transactions/<transaction_id>/<file_name>`. Every operation first checks
//! that the transaction exists for the session, so a user can never reach
//! another user's files through a transaction ID they do not own.

mod handlers;

use std::sync::Arc;

use axum::body::Bytes;

pub use handlers::{delete_attachment, get_attachment, get_attachments, post_attachment};

use crate::{
    Error, StorageService,
    endpoints::{self, format_endpoint},
    models::{AccessToken, Attachment},
    queries::TransactionQueries,
};

/// Stores and fetches the files attached to transactions.
#[derive(Clone)]
pub struct AttachmentService {
    storage: StorageService,
    transactions: Arc<dyn TransactionQueries>,
}

impl std::fmt::Debug for AttachmentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentService")
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

/// Check that `file_name` is a single, non-empty path segment.
fn check_file_name(file_name: &str) -> Result<(), Error> {
    let is_valid = !file_name.trim().is_empty()
        && !file_name.contains(['/', '\\'])
        && !file_name.contains("..");

    if is_valid {
        Ok(())
    } else {
        Err(Error::InvalidFileName(file_name.to_owned()))
    }
}

fn folder(transaction_id: &str) -> String {
    format!("transactions/{transaction_id}")
}

fn object_path(transaction_id: &str, file_name: &str) -> String {
    format!("{}/{file_name}", folder(transaction_id))
}

fn to_attachment(transaction_id: &str, file_name: String) -> Attachment {
    Attachment {
        url: format_endpoint(endpoints::ATTACHMENT, &[transaction_id, &file_name]),
        name: file_name,
        transaction_id: transaction_id.to_owned(),
    }
}

impl AttachmentService {
    /// Keep files in `storage` for the transactions reachable through `transactions`.
    pub fn new(storage: StorageService, transactions: Arc<dyn TransactionQueries>) -> Self {
        Self {
            storage,
            transactions,
        }
    }

    /// Store `bytes` as `file_name` on the transaction, replacing any file
    /// with the same name.
    ///
    /// # Errors
    /// Returns [Error::InvalidFileName] for names that are empty or contain a
    /// path separator, and [Error::NotFound] if the transaction does not exist.
    pub async fn attach(
        &self,
        token: &AccessToken,
        transaction_id: &str,
        file_name: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<Attachment, Error> {
        check_file_name(file_name)?;
        self.transactions.get(token, transaction_id).await?;

        let size = bytes.len();
        self.storage
            .upload(
                token,
                &object_path(transaction_id, file_name),
                content_type,
                bytes,
            )
            .await?;

        tracing::debug!("Attached {file_name} ({size} bytes) to transaction {transaction_id}");

        Ok(to_attachment(transaction_id, file_name.to_owned()))
    }

    /// The files attached to the transaction, sorted by name.
    pub async fn list(
        &self,
        token: &AccessToken,
        transaction_id: &str,
    ) -> Result<Vec<Attachment>, Error> {
        self.transactions.get(token, transaction_id).await?;

        let mut objects = self.storage.list(token, &folder(transaction_id)).await?;
        objects.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(objects
            .into_iter()
            .map(|object| to_attachment(transaction_id, object.name))
            .collect())
    }

    /// The contents of an attached file.
    pub async fn download(
        &self,
        token: &AccessToken,
        transaction_id: &str,
        file_name: &str,
    ) -> Result<Bytes, Error> {
        check_file_name(file_name)?;
        self.transactions.get(token, transaction_id).await?;

        self.storage
            .download(token, &object_path(transaction_id, file_name))
            .await
    }

    /// Delete an attached file.
    pub async fn remove(
        &self,
        token: &AccessToken,
        transaction_id: &str,
        file_name: &str,
    ) -> Result<(), Error> {
        check_file_name(file_name)?;
        self.transactions.get(token, transaction_id).await?;

        self.storage
            .remove(token, &object_path(transaction_id, file_name))
            .await
    }

    /// Delete every file attached to the transaction, e.g. before the
    /// transaction itself is deleted.
    pub async fn remove_all(&self, token: &AccessToken, transaction_id: &str) -> Result<(), Error> {
        self.transactions.get(token, transaction_id).await?;

        let objects = self.storage.list(token, &folder(transaction_id)).await?;
        let count = objects.len();

        for object in objects {
            self.storage
                .remove(token, &object_path(transaction_id, &object.name))
                .await?;
        }

        if count > 0 {
            tracing::debug!("Removed {count} attachments from transaction {transaction_id}");
        }

        Ok(())
    }
}
