//! Gallery handlers: health, listing, upload, delete and local download.

use axum::body::Body as AxumBody;
use axum::extract::multipart::MultipartError;
use axum::extract::{Extension, Multipart, Path};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Json as JsonResponse, Response};
use chrono::Utc;
use httpdate::fmt_http_date;
use serde::Serialize;
use std::path::Path as FsPath;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::gallery::{GalleryItem, build_gallery, upload_url};
use crate::http::{BaseUrl, attachment_disposition};
use crate::storage::{StorageError, UploadStore};

/// Multipart field carrying the uploaded photo.
pub const PHOTO_FIELD: &str = "photo";
const FILENAME_PREFIX: &str = "photo_";

/// Body returned after a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub url: String,
}

/// Plain confirmation body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Liveness check.
pub async fn health() -> &'static str {
    "Server is running"
}

/// Lists the catalog followed by every uploaded photo.
pub async fn list_wallpapers(
    BaseUrl(base_url): BaseUrl,
    Extension(store): Extension<Arc<UploadStore>>,
) -> Result<JsonResponse<Vec<GalleryItem>>, ApiError> {
    let uploads = store.list_files().await.map_err(|err| {
        error!(error = ?err, "read uploads dir failed");
        ApiError::Internal("Unable to read uploads folder".into())
    })?;
    let items = build_gallery(&base_url, &uploads);
    info!(uploads = uploads.len(), count = items.len(), "list wallpapers");
    Ok(JsonResponse(items))
}

/// Stores the `photo` field as `photo_<unix millis><ext>`.
pub async fn upload_photo(
    BaseUrl(base_url): BaseUrl,
    Extension(store): Extension<Arc<UploadStore>>,
    mut multipart: Multipart,
) -> Result<JsonResponse<UploadResponse>, ApiError> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }
        let Some(original_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            continue;
        };

        let filename = generate_filename(&original_name, Utc::now().timestamp_millis());
        let mut file = store.create(&filename).await.map_err(upload_write_error)?;
        let write_result: Result<u64, ApiError> = async {
            let mut size = 0u64;
            while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                size += chunk.len() as u64;
                file.file_mut()
                    .write_all(&chunk)
                    .await
                    .map_err(|err| ApiError::Internal(err.to_string()))?;
            }
            Ok(size)
        }
        .await;
        let size = match write_result {
            Ok(size) => size,
            Err(err) => {
                file.cleanup().await;
                return Err(err);
            }
        };
        file.finalize()
            .await
            .map_err(|err| ApiError::Internal(err.to_string()))?;

        info!(filename, original_name, size, "upload photo");
        let url = upload_url(&base_url, &filename);
        return Ok(JsonResponse(UploadResponse { filename, url }));
    }

    Err(ApiError::BadRequest("No file uploaded.".into()))
}

/// Removes an uploaded photo.
pub async fn delete_photo(
    Path(filename): Path<String>,
    Extension(store): Extension<Arc<UploadStore>>,
) -> Result<JsonResponse<MessageResponse>, ApiError> {
    store.delete(&filename).await?;
    info!(filename, "delete photo");
    Ok(JsonResponse(MessageResponse {
        message: "Photo deleted successfully".into(),
    }))
}

/// Streams an uploaded file back as an attachment.
pub async fn download_photo(
    Path(filename): Path<String>,
    Extension(store): Extension<Arc<UploadStore>>,
) -> Result<Response, ApiError> {
    let (target, metadata) = store.resolve_existing(&filename).await?;
    let file_size = metadata.len();
    let mime = mime_guess::from_path(&target).first_or_octet_stream();

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mime.essence_str())
            .map_err(|_| ApiError::Internal("invalid mime type".into()))?,
    );
    response_headers.insert(
        header::CONTENT_DISPOSITION,
        attachment_disposition(&filename),
    );
    response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(file_size));
    if let Ok(modified) = metadata.modified() {
        if let Ok(value) = HeaderValue::from_str(&fmt_http_date(modified)) {
            response_headers.insert(header::LAST_MODIFIED, value);
        }
    }

    // Existence was checked above; losing the file now is a transfer fault.
    let file = File::open(&target).await.map_err(|err| {
        warn!(filename, error = %err, "open for download failed");
        ApiError::Internal("Failed to download file".into())
    })?;

    info!(filename, size = file_size, "download photo");
    Ok((
        StatusCode::OK,
        response_headers,
        AxumBody::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

/// `photo_<millis>` plus the original extension when it is plain
/// alphanumeric.
pub fn generate_filename(original_name: &str, timestamp_millis: i64) -> String {
    let extension = FsPath::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    format!("{FILENAME_PREFIX}{timestamp_millis}{extension}")
}

/// Any storage fault while saving an upload is a server-side write failure,
/// including a missing uploads directory.
fn upload_write_error(err: StorageError) -> ApiError {
    match err {
        StorageError::Io(err) => ApiError::Internal(err.to_string()),
        other => other.into(),
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge(err.body_text());
    }
    ApiError::BadRequest(err.body_text())
}
