use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

/// Serves a stored image by its generated filename.
pub async fn serve(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    match state.uploads.read(&filename).await {
        Some(data) => {
            let mime = mime_guess::from_path(&filename).first_or_octet_stream();
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, mime.as_ref().to_string()),
                    // Names are never reused, so the bytes never change
                    (
                        header::CACHE_CONTROL,
                        "public, max-age=31536000, immutable".to_string(),
                    ),
                ],
                data,
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
