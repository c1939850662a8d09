//! Error types for storage operations

use aws_sdk_s3::{
    config::http::HttpResponse,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    operation::{
        create_bucket::CreateBucketError, delete_bucket::DeleteBucketError,
        delete_object::DeleteObjectError, get_object::GetObjectError,
        list_buckets::ListBucketsError, list_objects_v2::ListObjectsV2Error,
        put_object::PutObjectError,
    },
};
use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// S3 service error without a more specific mapping
    #[error("S3 service error: {0}")]
    S3Error(String),

    /// Bucket or object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bucket already exists or is not empty
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Credentials are not allowed to perform the operation
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Upstream service error (5xx from S3)
    #[error("Upstream service error: {0}")]
    UpstreamError(String),

    /// The request never got a response (connect failure, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Stored data could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Coarse classification of a modeled service error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorKind {
    NotFound,
    Conflict,
    AccessDenied,
    InvalidInput,
}

impl ErrorKind {
    fn from_code(code: &str) -> Option<Self> {
        match code {
            "NoSuchBucket" | "NoSuchKey" | "NotFound" => Some(Self::NotFound),
            "BucketAlreadyExists" | "BucketAlreadyOwnedByYou" | "BucketNotEmpty" => {
                Some(Self::Conflict)
            }
            "AccessDenied" | "AllAccessDisabled" | "InvalidAccessKeyId"
            | "SignatureDoesNotMatch" => Some(Self::AccessDenied),
            "InvalidBucketName" | "InvalidArgument" | "KeyTooLongError" | "InvalidRequest" => {
                Some(Self::InvalidInput)
            }
            _ => None,
        }
    }

    const fn from_status(status: u16) -> Option<Self> {
        match status {
            400 => Some(Self::InvalidInput),
            403 => Some(Self::AccessDenied),
            404 => Some(Self::NotFound),
            409 => Some(Self::Conflict),
            _ => None,
        }
    }

    fn into_error(self, detail: String) -> StorageError {
        match self {
            Self::NotFound => StorageError::NotFound(detail),
            Self::Conflict => StorageError::Conflict(detail),
            Self::AccessDenied => StorageError::AccessDenied(detail),
            Self::InvalidInput => StorageError::InvalidInput(detail),
        }
    }
}

/// Operation errors whose modeled variants carry a meaning of their own
pub(crate) trait ModeledError: ProvideErrorMetadata {
    /// Classification of the modeled variant, if any
    fn modeled_kind(&self) -> Option<ErrorKind> {
        None
    }
}

impl ModeledError for ListBucketsError {}
impl ModeledError for DeleteBucketError {}
impl ModeledError for PutObjectError {}
impl ModeledError for DeleteObjectError {}

impl ModeledError for ListObjectsV2Error {
    fn modeled_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::NoSuchBucket(_) => Some(ErrorKind::NotFound),
            _ => None,
        }
    }
}

impl ModeledError for GetObjectError {
    fn modeled_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::NoSuchKey(_) => Some(ErrorKind::NotFound),
            Self::InvalidObjectState(_) => Some(ErrorKind::Conflict),
            _ => None,
        }
    }
}

impl ModeledError for CreateBucketError {
    fn modeled_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::BucketAlreadyExists(_) | Self::BucketAlreadyOwnedByYou(_) => {
                Some(ErrorKind::Conflict)
            }
            _ => None,
        }
    }
}

impl StorageError {
    /// Wraps an SDK error with context, picking the most specific variant
    ///
    /// Service errors are classified by modeled variant, then by error code,
    /// then by HTTP status. Errors without a response are transport errors.
    pub(crate) fn from_sdk<E>(context: &str, error: SdkError<E, HttpResponse>) -> Self
    where
        E: ModeledError + std::error::Error + Send + Sync + 'static,
    {
        let detail = format!("{context}: {}", DisplayErrorContext(&error));

        match &error {
            SdkError::ServiceError(service_err) => {
                let err = service_err.err();
                let status = service_err.raw().status().as_u16();

                let kind = err
                    .modeled_kind()
                    .or_else(|| err.code().and_then(ErrorKind::from_code))
                    .or_else(|| ErrorKind::from_status(status));

                match kind {
                    Some(kind) => kind.into_error(detail),
                    None if status >= 500 => Self::UpstreamError(detail),
                    None => Self::S3Error(detail),
                }
            }
            SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => Self::Transport(detail),
            _ => Self::S3Error(detail),
        }
    }
}
