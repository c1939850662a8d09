use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Extension, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{routes, storage::ObjectStorage, types::Configuration};

/// Builds the application router with its shared dependencies attached
#[must_use]
pub fn router(configuration: Arc<Configuration>, storage: Arc<ObjectStorage>) -> Router {
    with_layers(
        routes::handler(configuration.allow_delete),
        configuration,
        storage,
    )
}

/// Uploads are spooled to disk, so the body size is not limited
fn with_layers(
    routes: Router,
    configuration: Arc<Configuration>,
    storage: Arc<ObjectStorage>,
) -> Router {
    routes
        .layer(DefaultBodyLimit::disable())
        .layer(tower_http::timeout::TimeoutLayer::new(
            configuration.request_timeout(),
        ))
        .layer(Extension(storage))
        .layer(Extension(configuration))
        .layer(TraceLayer::new_for_http())
}

/// Starts the server with the given configuration and dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(
    configuration: Arc<Configuration>,
    storage: Arc<ObjectStorage>,
) -> anyhow::Result<()> {
    let addr = configuration.bind_address();
    let router = router(configuration, storage);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🔄 S3 Manager started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
