mod assets;
/// Bucket pages and bucket API
pub mod buckets;
mod health;
/// Object API: upload, download, share, delete
pub mod objects;

use axum::{
    response::Redirect,
    routing::{delete, get, post},
    Router,
};

/// Creates the router with all handler routes
///
/// The delete endpoints are only registered when `allow_delete` is set.
#[must_use]
pub fn handler(allow_delete: bool) -> Router {
    let object_routes = if allow_delete {
        get(objects::get_object).delete(objects::delete_object)
    } else {
        get(objects::get_object)
    };

    let router = Router::new()
        .route("/", get(|| async { Redirect::permanent("/buckets") }))
        .route("/health", get(health::handler))
        .route("/static/{file}", get(assets::handler))
        .route("/buckets", get(buckets::buckets_view))
        .route("/buckets/{bucket}", get(buckets::bucket_view))
        .route("/buckets/{bucket}/", get(buckets::bucket_view))
        .route("/buckets/{bucket}/{*path}", get(buckets::bucket_path_view))
        .route("/api/buckets", post(buckets::create_bucket))
        .route(
            "/api/buckets/{bucket}/objects",
            post(objects::create_object),
        )
        .route("/api/buckets/{bucket}/objects/{*key}", object_routes);

    if allow_delete {
        router.route("/api/buckets/{bucket}", delete(buckets::delete_bucket))
    } else {
        router
    }
}
