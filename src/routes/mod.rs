pub mod assets;
pub mod create;
pub mod home;
pub mod interactions;
pub mod uploads;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full application router with state attached.
pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.config.storage.max_upload_bytes;

    Router::new()
        .route("/", get(home::index))
        .route("/post/{id}", get(home::post_detail))
        .route("/create", get(create::form).post(create::submit))
        .route("/like/{id}", post(interactions::like))
        .route("/comment/{id}", post(interactions::comment))
        .route("/uploads/{filename}", get(uploads::serve))
        .route("/assets/{*path}", get(assets::serve))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
