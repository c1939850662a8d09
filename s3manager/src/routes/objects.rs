use std::sync::Arc;
use std::time::Duration;

use aws_sdk_s3::primitives::ByteStream;
use axum::{
    body::Body,
    extract::{
        multipart::{Field, MultipartRejection},
        Multipart, Path, Query,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::{
    storage::ObjectStorage,
    types::{AppError, Configuration},
};

/// Longest lifetime S3 accepts for a presigned URL (7 days)
pub const MAX_URL_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

/// Path suffix that turns an object GET into a presigned URL request
const URL_SUFFIX: &str = "/url";

/// Query of a presigned URL request
#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    /// Lifetime of the URL in seconds
    pub expiry: Option<String>,
}

/// Presigned URL returned to the browser
#[derive(Debug, Serialize)]
pub struct UrlResponse {
    /// Presigned GET URL
    pub url: String,
    /// ISO-8601 UTC timestamp when the URL expires
    pub expires_at: String,
}

/// Location of an uploaded object
#[derive(Debug, Serialize)]
pub struct CreateObjectResponse {
    /// Bucket the object was written to
    pub bucket: String,
    /// Key of the new object
    pub key: String,
}

/// An uploaded file spooled to disk; the file is removed on drop
struct Upload {
    file_name: Option<String>,
    content_type: Option<String>,
    spool: NamedTempFile,
    size: u64,
}

/// Uploads the multipart `file` field, under the optional `path` prefix
///
/// The object key is `path` followed by the uploaded file name.
#[instrument(skip(storage, multipart))]
pub async fn create_object(
    Extension(storage): Extension<Arc<ObjectStorage>>,
    Path(bucket): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<CreateObjectResponse>), AppError> {
    let mut multipart =
        multipart.map_err(|e| AppError::bad_request("invalid_multipart", e.body_text()))?;

    let mut path = String::new();
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request("invalid_multipart", e.body_text()))?
    {
        let name = field.name().map(ToString::to_string);
        match name.as_deref() {
            Some("path") => {
                path = field
                    .text()
                    .await
                    .map_err(|e| AppError::bad_request("invalid_multipart", e.body_text()))?;
            }
            Some("file") => {
                let file_name = field.file_name().map(ToString::to_string);
                let content_type = field.content_type().map(ToString::to_string);
                let (spool, size) = spool_field(field).await?;
                upload = Some(Upload {
                    file_name,
                    content_type,
                    spool,
                    size,
                });
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| {
        AppError::bad_request("missing_file", "multipart field 'file' is required")
    })?;
    let file_name = upload
        .file_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::bad_request("missing_file_name", "uploaded file has no name"))?;

    let key = object_key(&path, &file_name);
    let content_type = upload
        .content_type
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());

    let body = ByteStream::from_path(upload.spool.path())
        .await
        .map_err(|e| AppError::internal(format!("error reading spooled upload: {e}")))?;
    let content_length = i64::try_from(upload.size)
        .map_err(|_| AppError::bad_request("invalid_multipart", "uploaded file is too large"))?;

    storage
        .put_object(&bucket, &key, body, content_length, &content_type)
        .await?;
    tracing::info!(%bucket, %key, size = upload.size, "object uploaded");

    Ok((
        StatusCode::CREATED,
        Json(CreateObjectResponse { bucket, key }),
    ))
}

/// Streams an object, or returns a presigned URL when the key ends in `/url`
#[instrument(skip(storage, configuration))]
pub async fn get_object(
    Extension(storage): Extension<Arc<ObjectStorage>>,
    Extension(configuration): Extension<Arc<Configuration>>,
    Path((bucket, key)): Path<(String, String)>,
    Query(query): Query<UrlQuery>,
) -> Result<Response, AppError> {
    if let Some(key) = key.strip_suffix(URL_SUFFIX) {
        return generate_url(&storage, &bucket, key, query.expiry.as_deref())
            .await
            .map(IntoResponse::into_response);
    }

    let download = storage.get_object(&bucket, &key).await?;

    let mut headers = HeaderMap::new();
    if configuration.force_download {
        headers.insert(header::CONTENT_TYPE, octet_stream());
        headers.insert(header::CONTENT_DISPOSITION, attachment(&key)?);
    } else {
        let content_type = download
            .content_type
            .as_deref()
            .and_then(|value| HeaderValue::from_str(value).ok())
            .unwrap_or_else(octet_stream);
        headers.insert(header::CONTENT_TYPE, content_type);
    }
    if let Some(length) = download.content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    let body = Body::from_stream(ReaderStream::new(download.body.into_async_read()));
    Ok((headers, body).into_response())
}

/// Deletes an object
#[instrument(skip(storage))]
pub async fn delete_object(
    Extension(storage): Extension<Arc<ObjectStorage>>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    storage.delete_object(&bucket, &key).await?;
    tracing::info!(%bucket, %key, "object removed");

    Ok(StatusCode::NO_CONTENT)
}

async fn generate_url(
    storage: &ObjectStorage,
    bucket: &str,
    key: &str,
    expiry: Option<&str>,
) -> Result<Json<UrlResponse>, AppError> {
    let expiry = parse_expiry(expiry)?;
    let presigned = storage.presigned_get_url(bucket, key, expiry).await?;

    Ok(Json(UrlResponse {
        url: presigned.url,
        expires_at: presigned.expires_at.to_rfc3339(),
    }))
}

/// Parses the `expiry` query parameter: whole seconds in `1..=MAX_URL_EXPIRY_SECS`
///
/// # Errors
///
/// Returns a 400 `AppError` when the value is missing, not a number or out of range
pub fn parse_expiry(expiry: Option<&str>) -> Result<Duration, AppError> {
    let raw = expiry.ok_or_else(|| {
        AppError::bad_request("invalid_expiry", "query parameter 'expiry' is required")
    })?;

    let secs: u64 = raw.trim().parse().map_err(|e| {
        AppError::bad_request("invalid_expiry", format!("error when converting expiry: {e}"))
    })?;

    if !(1..=MAX_URL_EXPIRY_SECS).contains(&secs) {
        return Err(AppError::bad_request(
            "invalid_expiry",
            format!("invalid expiry value: {secs}"),
        ));
    }

    Ok(Duration::from_secs(secs))
}

/// Streams a multipart field into a temporary file, returning it with its size
async fn spool_field(mut field: Field<'_>) -> Result<(NamedTempFile, u64), AppError> {
    let spool = NamedTempFile::new()
        .map_err(|e| AppError::internal(format!("error creating upload spool: {e}")))?;
    let handle = spool
        .reopen()
        .map_err(|e| AppError::internal(format!("error opening upload spool: {e}")))?;
    let mut file = tokio::fs::File::from_std(handle);

    let mut size = 0u64;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::bad_request("invalid_multipart", e.body_text()))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| AppError::internal(format!("error writing upload spool: {e}")))?;
        size += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| AppError::internal(format!("error writing upload spool: {e}")))?;

    Ok((spool, size))
}

/// Joins the upload prefix and file name into an object key
#[must_use]
pub fn object_key(path: &str, file_name: &str) -> String {
    if path.is_empty() || path.ends_with('/') {
        format!("{path}{file_name}")
    } else {
        format!("{path}/{file_name}")
    }
}

const fn octet_stream() -> HeaderValue {
    HeaderValue::from_static("application/octet-stream")
}

fn attachment(key: &str) -> Result<HeaderValue, AppError> {
    let file_name = key.rsplit('/').next().unwrap_or(key).replace('"', "\\\"");

    HeaderValue::from_bytes(format!("attachment; filename=\"{file_name}\"").as_bytes())
        .map_err(|e| AppError::internal(format!("invalid file name for download: {e}")))
}
