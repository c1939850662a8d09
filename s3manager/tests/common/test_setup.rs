use std::sync::Arc;

use aws_sdk_s3::{
    config::{BehaviorVersion, Credentials, Region},
    Client as S3Client,
};
use axum::{body::Body, http::Request, response::Response, Router};
use s3manager::{server, storage::ObjectStorage, types::Configuration};
use tower::ServiceExt;

use super::utils::MULTIPART_BOUNDARY;

/// Initialize tracing for tests
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Configuration used by most route tests
pub fn test_configuration() -> Configuration {
    Configuration {
        access_key_id: "test-access-key".to_string(),
        secret_access_key: "test-secret-key".to_string(),
        ..Configuration::default()
    }
}

/// A real client pointed at a local endpoint; only usable for offline work
/// such as presigning
pub fn offline_client() -> S3Client {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(Credentials::new(
            "test-access-key",
            "test-secret-key",
            None,
            None,
            "tests",
        ))
        .endpoint_url("http://localhost:9000")
        .force_path_style(true)
        .build();

    S3Client::from_conf(config)
}

/// Router wired to the given S3 client
pub struct TestSetup {
    pub router: Router,
    pub configuration: Arc<Configuration>,
}

impl TestSetup {
    pub fn new(s3_client: S3Client, configuration: Configuration) -> Self {
        setup_test_env();

        let configuration = Arc::new(configuration);
        let storage = Arc::new(ObjectStorage::new(Arc::new(s3_client), None));
        let router = server::router(configuration.clone(), storage);

        Self {
            router,
            configuration,
        }
    }

    pub async fn send_post_request(
        &self,
        route: &str,
        payload: serde_json::Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("POST")
            .header("Content-Type", "application/json")
            .body(Body::from(payload.to_string()))?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_raw_post_request(
        &self,
        route: &str,
        content_type: &str,
        body: impl Into<Body>,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("POST")
            .header("Content-Type", content_type)
            .body(body.into())?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_multipart_request(
        &self,
        route: &str,
        body: String,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_raw_post_request(
            route,
            &format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            body,
        )
        .await
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_delete_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("DELETE")
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }
}
