use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

const STYLE_CSS: &str = include_str!("../../static/style.css");
const APP_JS: &str = include_str!("../../static/app.js");

/// Serves the stylesheet and script embedded in the binary
#[allow(clippy::unused_async)]
pub async fn handler(Path(file): Path<String>) -> Response {
    let (content_type, body) = match file.as_str() {
        "style.css" => (mime::TEXT_CSS_UTF_8, STYLE_CSS),
        "app.js" => (mime::APPLICATION_JAVASCRIPT_UTF_8, APP_JS),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    ([(header::CONTENT_TYPE, content_type.as_ref())], body).into_response()
}
