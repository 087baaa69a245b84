use axum::extract::State;
use axum::response::Redirect;
use axum::Form;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::AppResult;
use crate::extractors::{PostId, Referrer};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub content: String,
}

/// Bump the like counter, then go back where the click came from
pub async fn like(
    State(state): State<AppState>,
    PostId(id): PostId,
    Referrer(referrer): Referrer,
) -> AppResult<Redirect> {
    let likes = state.posts.increment_likes(id).await?;
    info!("Post {} now has {} like(s)", id, likes);

    Ok(Redirect::to(referrer.as_deref().unwrap_or("/")))
}

pub async fn comment(
    State(state): State<AppState>,
    PostId(id): PostId,
    Form(form): Form<CommentForm>,
) -> AppResult<Redirect> {
    if form.content.trim().is_empty() {
        // Blank comments are dropped silently, but unknown posts still 404
        state.posts.get_post(id).await?;
        debug!("Ignoring blank comment on post {}", id);
    } else {
        let comment = state.posts.add_comment(id, &form.content).await?;
        info!("Added comment {} to post {}", comment.id, id);
    }

    Ok(Redirect::to(&format!("/post/{}", id)))
}
