//! Construction of the SDK client from the application configuration

use aws_config::{
    imds::{client::Client as ImdsClient, credentials::ImdsCredentialsProvider},
    timeout::TimeoutConfig,
    BehaviorVersion, Region,
};
use aws_sdk_s3::{config::Credentials, Client as S3Client};

use super::tls;
use crate::types::{Configuration, ConfigurationError};

const STATIC_CREDENTIALS_PROVIDER: &str = "s3manager";

/// Builds an S3 client for the configured endpoint
///
/// Path-style addressing is always used so that bucket names never have to
/// resolve as hostnames on S3-compatible servers.
///
/// # Errors
///
/// Returns a `ConfigurationError` for an invalid signature type, an invalid IAM
/// endpoint or an unusable CA bundle
pub async fn build_client(configuration: &Configuration) -> Result<S3Client, ConfigurationError> {
    let signature_type = configuration.signature_type()?;

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(configuration.region_or_default().to_string()))
        .endpoint_url(configuration.endpoint_url())
        .timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(configuration.request_timeout())
                .build(),
        );

    if configuration.use_iam {
        if !configuration.iam_endpoint.is_empty() {
            let imds_client = ImdsClient::builder()
                .endpoint(&configuration.iam_endpoint)
                .map_err(|e| ConfigurationError::InvalidIamEndpoint(e.to_string()))?
                .build();
            loader = loader.credentials_provider(
                ImdsCredentialsProvider::builder()
                    .imds_client(imds_client)
                    .build(),
            );
        }
        // Without an endpoint override the default provider chain resolves
        // environment, profile, container and instance credentials.
    } else if signature_type.is_signed() {
        loader = loader.credentials_provider(Credentials::new(
            &configuration.access_key_id,
            &configuration.secret_access_key,
            None,
            None,
            STATIC_CREDENTIALS_PROVIDER,
        ));
    } else {
        loader = loader.no_credentials();
    }

    if configuration.use_ssl {
        loader = loader.http_client(tls::http_client(configuration)?);
    }

    let sdk_config = loader.load().await;
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(true)
        .build();

    tracing::info!(
        endpoint = %configuration.endpoint_url(),
        region = configuration.region_or_default(),
        %signature_type,
        use_iam = configuration.use_iam,
        "S3 client configured"
    );

    Ok(S3Client::from_conf(s3_config))
}
