//! Route handlers for uploading, listing, downloading and deleting attachments.

use axum::{
    Extension, Json,
    extract::{
        FromRef, Multipart, Path, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::{
    AppState, AttachmentService, Error,
    endpoints::encode_path_segment,
    models::{AccessToken, Attachment},
};

/// The multipart field that holds the uploaded file.
const FILE_FIELD: &str = "file";

/// The state needed for the attachment routes.
#[derive(Debug, Clone)]
pub struct AttachmentState {
    /// Stores and fetches the files.
    pub attachments: AttachmentService,
}

impl FromRef<AppState> for AttachmentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            attachments: state.attachments.clone(),
        }
    }
}

/// A route handler for listing the files attached to a transaction.
pub async fn get_attachments(
    State(state): State<AttachmentState>,
    Extension(token): Extension<AccessToken>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Vec<Attachment>>, Error> {
    state
        .attachments
        .list(&token, &transaction_id)
        .await
        .map(Json)
}

/// A route handler for attaching a file to a transaction.
///
/// Expects a multipart form with the file in the field named "file". The file
/// keeps the name it was uploaded with.
pub async fn post_attachment(
    State(state): State<AttachmentState>,
    Extension(token): Extension<AccessToken>,
    Path(transaction_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Attachment>, Error> {
    let mut multipart = multipart.map_err(|rejection| Error::Http {
        status: rejection.status(),
        message: rejection.body_text(),
    })?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| Error::MultipartError("the file has no name".to_owned()))?;
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_owned();
        let bytes = field.bytes().await.map_err(multipart_error)?;

        return state
            .attachments
            .attach(&token, &transaction_id, &file_name, &content_type, bytes)
            .await
            .map(Json);
    }

    Err(Error::MultipartError(format!(
        "expected a file in the \"{FILE_FIELD}\" field"
    )))
}

/// Keep the status axum picked, e.g. 413 for a body over the size limit.
fn multipart_error(error: MultipartError) -> Error {
    Error::Http {
        status: error.status(),
        message: error.body_text(),
    }
}

/// A route handler for downloading an attached file.
pub async fn get_attachment(
    State(state): State<AttachmentState>,
    Extension(token): Extension<AccessToken>,
    Path((transaction_id, file_name)): Path<(String, String)>,
) -> Result<Response, Error> {
    let bytes = state
        .attachments
        .download(&token, &transaction_id, &file_name)
        .await?;

    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        encode_path_segment(&file_name)
    );

    Ok((
        [
            (CONTENT_TYPE, "application/octet-stream".to_owned()),
            (CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// A route handler for deleting an attached file.
pub async fn delete_attachment(
    State(state): State<AttachmentState>,
    Extension(token): Extension<AccessToken>,
    Path((transaction_id, file_name)): Path<(String, String)>,
) -> Result<Json<Value>, Error> {
    state
        .attachments
        .remove(&token, &transaction_id, &file_name)
        .await?;

    Ok(Json(json!({})))
}
