//! Server-side encryption applied to object uploads and downloads

use aws_sdk_s3::{
    operation::{
        get_object::builders::GetObjectFluentBuilder,
        put_object::builders::PutObjectFluentBuilder,
    },
    types::ServerSideEncryption as SseAlgorithm,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use md5::{Digest, Md5};

use crate::types::ConfigurationError;

/// Length in bytes of an SSE-C key (AES-256)
pub const CUSTOMER_KEY_LEN: usize = 32;

const CUSTOMER_ALGORITHM: &str = "AES256";

/// Encryption descriptor sent with every upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerSideEncryption {
    /// Keys managed by the storage provider (SSE-S3)
    S3Managed,
    /// Keys managed by KMS, optionally naming the key to use
    Kms {
        /// KMS key id, or `None` for the account default key
        key_id: Option<String>,
    },
    /// Keys supplied by the client on every request (SSE-C)
    Customer(CustomerKey),
}

/// Pre-encoded SSE-C key material
#[derive(Clone, PartialEq, Eq)]
pub struct CustomerKey {
    key_b64: String,
    key_md5_b64: String,
}

impl std::fmt::Debug for CustomerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerKey")
            .field("key_md5_b64", &self.key_md5_b64)
            .finish_non_exhaustive()
    }
}

impl CustomerKey {
    /// Encodes a raw 32-byte key for the SSE-C request headers
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidSseKey` when the key is not exactly 32 bytes
    pub fn new(raw: &[u8]) -> Result<Self, ConfigurationError> {
        if raw.len() != CUSTOMER_KEY_LEN {
            return Err(ConfigurationError::InvalidSseKey(format!(
                "SSE-C key must be {CUSTOMER_KEY_LEN} bytes, got {}",
                raw.len()
            )));
        }

        Ok(Self {
            key_b64: STANDARD.encode(raw),
            key_md5_b64: STANDARD.encode(Md5::digest(raw)),
        })
    }
}

impl ServerSideEncryption {
    /// Builds the descriptor from the `sse_type` / `sse_key` settings
    ///
    /// An empty type means no encryption is requested.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidSseType` for an unknown type and
    /// `ConfigurationError::InvalidSseKey` for a malformed SSE-C key
    pub fn from_settings(
        sse_type: &str,
        sse_key: &str,
    ) -> Result<Option<Self>, ConfigurationError> {
        match sse_type {
            "" => Ok(None),
            "SSE" => Ok(Some(Self::S3Managed)),
            "KMS" => Ok(Some(Self::Kms {
                key_id: (!sse_key.is_empty()).then(|| sse_key.to_string()),
            })),
            "SSE-C" => Ok(Some(Self::Customer(CustomerKey::new(sse_key.as_bytes())?))),
            other => Err(ConfigurationError::InvalidSseType(other.to_string())),
        }
    }

    /// Adds the encryption headers to a `PutObject` request
    #[must_use]
    pub fn apply_to_put(&self, request: PutObjectFluentBuilder) -> PutObjectFluentBuilder {
        match self {
            Self::S3Managed => request.server_side_encryption(SseAlgorithm::Aes256),
            Self::Kms { key_id } => request
                .server_side_encryption(SseAlgorithm::AwsKms)
                .set_ssekms_key_id(key_id.clone()),
            Self::Customer(key) => request
                .sse_customer_algorithm(CUSTOMER_ALGORITHM)
                .sse_customer_key(&key.key_b64)
                .sse_customer_key_md5(&key.key_md5_b64),
        }
    }

    /// Adds the headers a `GetObject` request needs to read back an encrypted object
    ///
    /// Only SSE-C requires the key on reads; the other modes decrypt transparently.
    #[must_use]
    pub fn apply_to_get(&self, request: GetObjectFluentBuilder) -> GetObjectFluentBuilder {
        match self {
            Self::Customer(key) => request
                .sse_customer_algorithm(CUSTOMER_ALGORITHM)
                .sse_customer_key(&key.key_b64)
                .sse_customer_key_md5(&key.key_md5_b64),
            Self::S3Managed | Self::Kms { .. } => request,
        }
    }
}
