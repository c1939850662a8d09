//! S3 operations behind the file manager
mod client;
mod error;
mod sse;
mod tls;

use std::sync::Arc;
use std::time::Duration;

use aws_sdk_s3::{
    presigning::PresigningConfig,
    primitives::{ByteStream, DateTime as SmithyDateTime},
    types::{BucketLocationConstraint, CreateBucketConfiguration},
    Client as S3Client,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub use client::build_client;
pub use error::{StorageError, StorageResult};
pub use sse::{CustomerKey, ServerSideEncryption, CUSTOMER_KEY_LEN};

/// Region in which buckets are created without a location constraint
const DEFAULT_REGION: &str = "us-east-1";

const DELIMITER: &str = "/";

/// A bucket as shown in the bucket list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketInfo {
    /// Bucket name
    pub name: String,
    /// Creation time, unknown for buckets from the shared list
    pub creation_date: Option<DateTime<Utc>>,
}

impl BucketInfo {
    /// A bucket known only by name
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creation_date: None,
        }
    }
}

/// An object or folder inside a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Full object key; folders end in `/`
    pub key: String,
    /// Size in bytes, 0 for folders
    pub size: i64,
    /// Last modification time, unknown for folders
    pub last_modified: Option<DateTime<Utc>>,
    /// Owner display name, if the server reports one
    pub owner: Option<String>,
    /// Storage class, if the server reports one
    pub storage_class: Option<String>,
    /// Whether this entry is a common prefix rather than an object
    pub is_folder: bool,
}

impl ObjectInfo {
    /// A folder entry for a common prefix
    #[must_use]
    pub fn folder(prefix: impl Into<String>) -> Self {
        Self {
            key: prefix.into(),
            size: 0,
            last_modified: None,
            owner: None,
            storage_class: None,
            is_folder: true,
        }
    }
}

/// Object body and the metadata needed to serve it
#[derive(Debug)]
pub struct ObjectDownload {
    /// Streaming object content
    pub body: ByteStream,
    /// Content type stored with the object
    pub content_type: Option<String>,
    /// Size in bytes
    pub content_length: Option<i64>,
}

/// Presigned URL with expiration information
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL for GET requests
    pub url: String,
    /// UTC timestamp when the URL expires
    pub expires_at: DateTime<Utc>,
}

/// Storage client for the file manager's S3 operations
pub struct ObjectStorage {
    s3_client: Arc<S3Client>,
    encryption: Option<ServerSideEncryption>,
}

impl ObjectStorage {
    /// Creates a new storage client
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `encryption` - Encryption applied to uploads (and SSE-C downloads)
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>, encryption: Option<ServerSideEncryption>) -> Self {
        Self {
            s3_client,
            encryption,
        }
    }

    /// Lists all buckets visible to the configured credentials
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` classified from the S3 response
    pub async fn list_buckets(&self) -> StorageResult<Vec<BucketInfo>> {
        let output = self
            .s3_client
            .list_buckets()
            .send()
            .await
            .map_err(|e| StorageError::from_sdk("error listing buckets", e))?;

        Ok(output
            .buckets()
            .iter()
            .filter_map(|bucket| {
                bucket.name().map(|name| BucketInfo {
                    name: name.to_string(),
                    creation_date: bucket.creation_date().and_then(to_chrono),
                })
            })
            .collect())
    }

    /// Fetches the YAML list of extra bucket names stored at `bucket/key`
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the object cannot be read, or
    /// `StorageError::Decode` if it is not a YAML list of strings
    pub async fn shared_buckets(&self, bucket: &str, key: &str) -> StorageResult<Vec<BucketInfo>> {
        let output = self
            .s3_client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::from_sdk("error getting shared buckets object", e))?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| {
                StorageError::Transport(format!("error reading shared buckets object: {e}"))
            })?
            .into_bytes();

        parse_shared_buckets(&bytes)
    }

    /// Lists the objects under `prefix`
    ///
    /// Unless `recursive` is set the listing stops at the next `/` and
    /// the common prefixes are returned as folder entries. All pages are
    /// fetched; entries are sorted by key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the bucket does not exist, or another
    /// `StorageError` classified from the S3 response
    pub async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> StorageResult<Vec<ObjectInfo>> {
        let mut pages = self
            .s3_client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .fetch_owner(true)
            .set_delimiter((!recursive).then(|| DELIMITER.to_string()))
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| StorageError::from_sdk("error listing objects", e))?;

            objects.extend(
                page.common_prefixes()
                    .iter()
                    .filter_map(|common| common.prefix())
                    .map(ObjectInfo::folder),
            );

            objects.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| {
                        let key = object.key()?;
                        Some(ObjectInfo {
                            key: key.to_string(),
                            size: object.size().unwrap_or_default(),
                            last_modified: object.last_modified().and_then(to_chrono),
                            owner: object
                                .owner()
                                .and_then(|owner| owner.display_name())
                                .map(ToString::to_string),
                            storage_class: object
                                .storage_class()
                                .map(|class| class.as_str().to_string()),
                            is_folder: key.ends_with(DELIMITER),
                        })
                    })
                    // The folder placeholder for the prefix itself is not an entry
                    .filter(|object| object.key != prefix),
            );
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    /// Creates a bucket in the client's region
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the bucket already exists, or another
    /// `StorageError` classified from the S3 response
    pub async fn create_bucket(&self, name: &str) -> StorageResult<BucketInfo> {
        let mut request = self.s3_client.create_bucket().bucket(name);

        let region = self.s3_client.config().region().map(ToString::to_string);
        if let Some(region) = region.filter(|r| r != DEFAULT_REGION) {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region.as_str()))
                    .build(),
            );
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::from_sdk("error creating bucket", e))?;

        Ok(BucketInfo {
            name: name.to_string(),
            creation_date: Some(Utc::now()),
        })
    }

    /// Deletes an empty bucket
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the bucket is not empty, or another
    /// `StorageError` classified from the S3 response
    pub async fn delete_bucket(&self, name: &str) -> StorageResult<()> {
        self.s3_client
            .delete_bucket()
            .bucket(name)
            .send()
            .await
            .map_err(|e| StorageError::from_sdk("error removing bucket", e))?;

        Ok(())
    }

    /// Uploads an object of `content_length` bytes, applying the configured
    /// server-side encryption
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` classified from the S3 response
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ByteStream,
        content_length: i64,
        content_type: &str,
    ) -> StorageResult<()> {
        let mut request = self
            .s3_client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .content_length(content_length)
            .body(body);

        if let Some(encryption) = &self.encryption {
            request = encryption.apply_to_put(request);
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::from_sdk("error putting object", e))?;

        Ok(())
    }

    /// Starts downloading an object
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the bucket or key does not exist, or
    /// another `StorageError` classified from the S3 response
    pub async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectDownload> {
        let mut request = self.s3_client.get_object().bucket(bucket).key(key);

        if let Some(encryption) = &self.encryption {
            request = encryption.apply_to_get(request);
        }

        let output = request
            .send()
            .await
            .map_err(|e| StorageError::from_sdk("error getting object", e))?;

        Ok(ObjectDownload {
            content_type: output.content_type().map(ToString::to_string),
            content_length: output.content_length(),
            body: output.body,
        })
    }

    /// Generates a presigned URL for GET operations
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Config` if the presigning config cannot be built
    /// (for example an expiry above one week), or a `StorageError` from signing
    pub async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expiry: Duration,
    ) -> StorageResult<PresignedUrl> {
        let presigned_config = PresigningConfig::expires_in(expiry).map_err(|e| {
            StorageError::Config(format!("Failed to create presigning config: {e}"))
        })?;

        let presigned = self
            .s3_client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigned_config)
            .await
            .map_err(|e| StorageError::from_sdk("error generating presigned URL", e))?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            expires_at: Utc::now() + expiry,
        })
    }

    /// Deletes an object
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` classified from the S3 response
    pub async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.s3_client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::from_sdk("error removing object", e))?;

        Ok(())
    }
}

/// Parses the shared buckets file: a YAML sequence of bucket names
///
/// An empty document is an empty list.
///
/// # Errors
///
/// Returns `StorageError::Decode` if the document is not a list of strings
pub fn parse_shared_buckets(document: &[u8]) -> StorageResult<Vec<BucketInfo>> {
    if document.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let names: Vec<String> = serde_yaml::from_slice(document)
        .map_err(|e| StorageError::Decode(format!("error parsing shared buckets: {e}")))?;

    Ok(names.into_iter().map(BucketInfo::named).collect())
}

fn to_chrono(timestamp: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}
