use askama::Template;
use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::response::Response;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::extractors::{redirect_with_flash, Flash, FlashMessage};
use crate::routes::home::Html;
use crate::state::AppState;
use crate::upload::{self, ALLOWED_EXTENSIONS};

#[derive(Template)]
#[template(path = "pages/create.html")]
pub struct CreateTemplate {
    pub allowed: String,
    pub max_upload_mb: usize,
    pub flashes: Vec<FlashMessage>,
}

pub async fn form(State(state): State<AppState>, flash: Flash) -> Response {
    flash.consume(Html(CreateTemplate {
        allowed: ALLOWED_EXTENSIONS.join(", "),
        max_upload_mb: state.config.storage.max_upload_bytes / (1024 * 1024),
        flashes: flash.messages(),
    }))
}

/// File field plus its client-side name, as submitted
struct ImageField {
    file_name: Option<String>,
    data: Bytes,
}

pub async fn submit(State(state): State<AppState>, mut multipart: Multipart) -> AppResult<Response> {
    let mut image: Option<ImageField> = None;
    let mut caption = String::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await?;
                image = Some(ImageField { file_name, data });
            }
            Some("caption") => caption = field.text().await?,
            _ => {}
        }
    }

    let client_name = image.as_ref().and_then(|f| f.file_name.as_deref());
    let filename = match upload::stored_filename(client_name) {
        Ok(filename) => filename,
        Err(rejection) => {
            warn!("Rejected upload {:?}: {}", client_name, rejection);
            return Ok(redirect_with_flash(
                "/create",
                FlashMessage::danger(rejection.to_string()),
            ));
        }
    };
    let data = image.map(|f| f.data).unwrap_or_default();

    // File first: a failed insert can orphan a file, never the reverse
    state.uploads.save(&filename, &data).await?;

    let post = match state.posts.create_post(&filename, &caption).await {
        Ok(post) => post,
        Err(e) => {
            if let Err(cleanup) = state.uploads.remove(&filename).await {
                warn!("Could not remove orphaned upload {}: {}", filename, cleanup);
            }
            return Err(e.into());
        }
    };

    info!("Created post {} with image {}", post.id, filename);
    Ok(redirect_with_flash(
        &format!("/post/{}", post.id),
        FlashMessage::success("Your post has been created!"),
    ))
}
