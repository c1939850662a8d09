use std::sync::Arc;

use anyhow::Context;
use s3manager::{
    server,
    storage::{build_client, ObjectStorage},
    types::{Configuration, LogFormat},
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let configuration = Configuration::load().context("error loading configuration")?;
    configuration
        .validate()
        .context("invalid configuration")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match configuration.log_format()? {
        LogFormat::Json => fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => fmt().with_env_filter(filter).init(),
    }

    let s3_client = build_client(&configuration)
        .await
        .context("error creating s3 client")?;
    let storage = Arc::new(ObjectStorage::new(
        Arc::new(s3_client),
        configuration.server_side_encryption()?,
    ));

    server::start(Arc::new(configuration), storage).await
}
