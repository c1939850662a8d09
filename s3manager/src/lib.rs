//! Browser-based file manager for S3-compatible object storage

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

/// HTTP routes and handlers
pub mod routes;

/// Server setup and lifecycle
pub mod server;

/// S3 operations
pub mod storage;

/// Shared types: configuration, errors
pub mod types;

/// HTML pages
pub mod views;
