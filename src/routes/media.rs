use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

/// GET /media/{*path}: blobs written by the local media host
pub async fn serve(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    // stored names are a single flat segment
    if path.is_empty() || path.contains(['/', '\\']) || path.starts_with('.') {
        return StatusCode::NOT_FOUND.into_response();
    }

    let full_path = state.config.local_media_path().join(&path);
    match tokio::fs::read(&full_path).await {
        Ok(data) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, mime.as_ref().to_string()),
                    (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
                ],
                data,
            )
                .into_response()
        }
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}
