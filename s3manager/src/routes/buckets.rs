use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{rejection::JsonRejection, Path},
    http::StatusCode,
    response::Html,
    Extension, Json,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    storage::{BucketInfo, ObjectStorage},
    types::{AppError, Configuration},
    views::{breadcrumbs, BucketPage, BucketRow, BucketsPage, ObjectEntry},
};

/// Body of a create bucket request
#[derive(Debug, Deserialize)]
pub struct CreateBucketRequest {
    /// Name of the bucket to create
    pub name: String,
}

/// Renders all buckets, followed by the ones from the shared buckets list
#[instrument(skip(storage, configuration))]
pub async fn buckets_view(
    Extension(storage): Extension<Arc<ObjectStorage>>,
    Extension(configuration): Extension<Arc<Configuration>>,
) -> Result<Html<String>, AppError> {
    let mut buckets = storage.list_buckets().await?;

    if let Some((bucket, key)) = configuration.shared_buckets_location().map_err(|e| {
        AppError::internal(format!("error getting shared buckets object: {e}"))
    })? {
        buckets.extend(storage.shared_buckets(bucket, key).await?);
    }

    let page = BucketsPage {
        buckets: buckets.into_iter().map(BucketRow::from).collect(),
        allow_delete: configuration.allow_delete,
    };

    Ok(Html(page.render()?))
}

/// Renders the root of a bucket
pub async fn bucket_view(
    Extension(storage): Extension<Arc<ObjectStorage>>,
    Extension(configuration): Extension<Arc<Configuration>>,
    Path(bucket): Path<String>,
) -> Result<Html<String>, AppError> {
    render_bucket(&storage, &configuration, bucket, String::new()).await
}

/// Renders the objects under a prefix of a bucket
///
/// The path is always browsed as a folder, so `2024` lists `2024/`.
pub async fn bucket_path_view(
    Extension(storage): Extension<Arc<ObjectStorage>>,
    Extension(configuration): Extension<Arc<Configuration>>,
    Path((bucket, path)): Path<(String, String)>,
) -> Result<Html<String>, AppError> {
    render_bucket(&storage, &configuration, bucket, folder_prefix(path)).await
}

/// Appends the `/` delimiter to a non-empty prefix that lacks it
#[must_use]
pub fn folder_prefix(mut path: String) -> String {
    if !path.is_empty() && !path.ends_with('/') {
        path.push('/');
    }
    path
}

#[instrument(skip(storage, configuration))]
async fn render_bucket(
    storage: &ObjectStorage,
    configuration: &Configuration,
    bucket: String,
    path: String,
) -> Result<Html<String>, AppError> {
    let objects = storage
        .list_objects(&bucket, &path, configuration.list_recursive)
        .await?;

    let page = BucketPage {
        objects: objects
            .into_iter()
            .map(|object| ObjectEntry::new(object, &path))
            .collect(),
        allow_delete: configuration.allow_delete,
        paths: breadcrumbs(&path),
        bucket_name: bucket,
        current_path: path,
    };

    Ok(Html(page.render()?))
}

/// Creates a bucket from a JSON `{"name": ...}` body
#[instrument(skip(storage, payload))]
pub async fn create_bucket(
    Extension(storage): Extension<Arc<ObjectStorage>>,
    payload: Result<Json<CreateBucketRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BucketInfo>), AppError> {
    let Json(payload) = payload?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request(
            "invalid_bucket_name",
            "bucket name must not be empty",
        ));
    }

    let bucket = storage.create_bucket(name).await?;
    tracing::info!(bucket = %bucket.name, "bucket created");

    Ok((StatusCode::CREATED, Json(bucket)))
}

/// Deletes an empty bucket
#[instrument(skip(storage))]
pub async fn delete_bucket(
    Extension(storage): Extension<Arc<ObjectStorage>>,
    Path(bucket): Path<String>,
) -> Result<StatusCode, AppError> {
    storage.delete_bucket(&bucket).await?;
    tracing::info!(%bucket, "bucket removed");

    Ok(StatusCode::NO_CONTENT)
}
