//! Runtime configuration loaded from config files and the environment

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use super::SignatureType;
use crate::storage::ServerSideEncryption;

/// Name (without extension) of the optional config file
const CONFIG_FILE_NAME: &str = "config";

/// Errors raised while loading or validating the configuration
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// The config file or environment could not be read
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A required credential is missing
    #[error("please provide {0}")]
    MissingCredential(&'static str),

    /// `signature_type` is not a known value
    #[error("invalid SIGNATURE_TYPE: {0}")]
    InvalidSignatureType(String),

    /// `signature_type` is known but cannot be used with this client
    #[error("unsupported SIGNATURE_TYPE: {0}")]
    UnsupportedSignatureType(SignatureType),

    /// `sse_type` is not a known value
    #[error("invalid SSE_TYPE: {0}")]
    InvalidSseType(String),

    /// `sse_key` does not fit the selected encryption type
    #[error("invalid SSE_KEY: {0}")]
    InvalidSseKey(String),

    /// `iam_endpoint` is not a valid URI
    #[error("invalid IAM_ENDPOINT: {0}")]
    InvalidIamEndpoint(String),

    /// `shared_buckets_path` is not of the form `bucket/key`
    #[error("invalid SHARED_BUCKETS_PATH: {0}")]
    InvalidSharedBucketsPath(String),

    /// `log_format` is not `text` or `json`
    #[error("invalid LOG_FORMAT: {0}")]
    InvalidLogFormat(String),

    /// The CA certificate bundle could not be used
    #[error("failed to load CA certificate: {0}")]
    CaCert(String),
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Application configuration
///
/// Every field can be set in a `config.{yaml,toml,json}` file or through an
/// upper-case environment variable of the same name (`ACCESS_KEY_ID`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Host (and optional port) of the S3 API, without scheme
    pub endpoint: String,
    /// Use instance credentials instead of static keys
    pub use_iam: bool,
    /// Override for the instance metadata endpoint
    pub iam_endpoint: String,
    /// Static access key id
    pub access_key_id: String,
    /// Static secret access key
    pub secret_access_key: String,
    /// Signing region
    pub region: String,
    /// Expose the delete endpoints
    pub allow_delete: bool,
    /// Serve downloads as attachments
    pub force_download: bool,
    /// Talk to the endpoint over HTTPS
    pub use_ssl: bool,
    /// Accept any server certificate
    pub skip_ssl_verification: bool,
    /// Request signing mode, see [`SignatureType`]
    pub signature_type: String,
    /// List objects without a delimiter
    pub list_recursive: bool,
    /// Bind address, empty for all interfaces
    pub address: String,
    /// Bind port
    pub port: String,
    /// Per-request timeout in seconds
    pub timeout: u64,
    /// Server-side encryption type (`SSE`, `KMS`, `SSE-C`)
    pub sse_type: String,
    /// Key material for the encryption type
    pub sse_key: String,
    /// `bucket/key` of a YAML list of additional bucket names
    pub shared_buckets_path: String,
    /// PEM bundle of trusted CA certificates
    pub ca_cert: String,
    /// `text` or `json`
    pub log_format: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            endpoint: "s3.amazonaws.com".to_string(),
            use_iam: false,
            iam_endpoint: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            region: String::new(),
            allow_delete: true,
            force_download: true,
            use_ssl: true,
            skip_ssl_verification: false,
            signature_type: "V4".to_string(),
            list_recursive: false,
            address: String::new(),
            port: "8080".to_string(),
            timeout: 600,
            sse_type: String::new(),
            sse_key: String::new(),
            shared_buckets_path: String::new(),
            ca_cert: String::new(),
            log_format: "text".to_string(),
        }
    }
}

impl Configuration {
    /// Loads the configuration from `$HOME/.s3manager/config.*`, `./config.*`
    /// and the environment, in increasing order of precedence
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::Load` when a config file is malformed or a
    /// value has the wrong type
    pub fn load() -> Result<Self, ConfigurationError> {
        let mut search_dirs = Vec::new();
        if let Some(home) = std::env::var_os("HOME") {
            search_dirs.push(PathBuf::from(home).join(".s3manager"));
        }
        search_dirs.push(PathBuf::from("."));

        Self::load_from(&search_dirs)
    }

    /// Loads the configuration from the given directories and the environment
    ///
    /// Later directories override earlier ones; the environment overrides all files.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::Load` when a config file is malformed or a
    /// value has the wrong type
    pub fn load_from(search_dirs: &[PathBuf]) -> Result<Self, ConfigurationError> {
        let builder = search_dirs
            .iter()
            .fold(config::Config::builder(), |builder, dir| {
                builder.add_source(
                    config::File::with_name(&config_file_stem(dir)).required(false),
                )
            })
            .add_source(config::Environment::default());

        let configuration: Self = builder.build()?.try_deserialize()?;
        Ok(configuration)
    }

    /// Checks that the settings are consistent with each other
    ///
    /// # Errors
    ///
    /// Returns the first problem found, see [`ConfigurationError`]
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let signature_type = self.signature_type()?;

        if !self.use_iam && signature_type.is_signed() {
            if self.access_key_id.is_empty() {
                return Err(ConfigurationError::MissingCredential("ACCESS_KEY_ID"));
            }
            if self.secret_access_key.is_empty() {
                return Err(ConfigurationError::MissingCredential("SECRET_ACCESS_KEY"));
            }
        }

        self.server_side_encryption()?;
        self.shared_buckets_location()?;
        self.log_format()?;

        Ok(())
    }

    /// Parsed signing mode
    ///
    /// # Errors
    ///
    /// Returns an error for unknown or unsupported signature types
    pub fn signature_type(&self) -> Result<SignatureType, ConfigurationError> {
        let signature_type: SignatureType = self
            .signature_type
            .parse()
            .map_err(ConfigurationError::InvalidSignatureType)?;

        if !signature_type.is_supported() {
            return Err(ConfigurationError::UnsupportedSignatureType(signature_type));
        }

        Ok(signature_type)
    }

    /// Encryption descriptor for uploads, `None` when `sse_type` is empty
    ///
    /// # Errors
    ///
    /// Returns an error for unknown types or malformed keys
    pub fn server_side_encryption(
        &self,
    ) -> Result<Option<ServerSideEncryption>, ConfigurationError> {
        ServerSideEncryption::from_settings(&self.sse_type, &self.sse_key)
    }

    /// `(bucket, key)` of the shared buckets list, `None` when not configured
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidSharedBucketsPath` when the path has no `/`
    pub fn shared_buckets_location(&self) -> Result<Option<(&str, &str)>, ConfigurationError> {
        if self.shared_buckets_path.is_empty() {
            return Ok(None);
        }

        self.shared_buckets_path
            .split_once('/')
            .map(Some)
            .ok_or_else(|| {
                ConfigurationError::InvalidSharedBucketsPath(self.shared_buckets_path.clone())
            })
    }

    /// Parsed log output format
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidLogFormat` for anything but `text` or `json`
    pub fn log_format(&self) -> Result<LogFormat, ConfigurationError> {
        match self.log_format.to_lowercase().as_str() {
            "text" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigurationError::InvalidLogFormat(other.to_string())),
        }
    }

    /// Full endpoint URL including scheme
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{scheme}://{}", self.endpoint)
    }

    /// Signing region, falling back to `us-east-1`
    #[must_use]
    pub fn region_or_default(&self) -> &str {
        if self.region.is_empty() {
            "us-east-1"
        } else {
            &self.region
        }
    }

    /// `address:port` to bind the HTTP listener to
    #[must_use]
    pub fn bind_address(&self) -> String {
        let address = if self.address.is_empty() {
            "0.0.0.0"
        } else {
            &self.address
        };
        format!("{address}:{}", self.port)
    }

    /// Upper bound for handling a single request
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn config_file_stem(dir: &Path) -> String {
    dir.join(CONFIG_FILE_NAME).to_string_lossy().into_owned()
}
