use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};

use crate::db::models::{Comment, Post};
use crate::error::AppResult;
use crate::extractors::{Flash, FlashMessage, PostId};
use crate::state::AppState;
use crate::upload::UploadStore;

// --- View structs ---

pub struct PostCard {
    pub id: i64,
    pub image_url: String,
    pub caption: String,
    pub likes: i64,
    pub comment_count: i64,
    pub time_since: String,
}

impl PostCard {
    pub fn new(post: &Post, comment_count: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: post.id,
            image_url: UploadStore::public_url(&post.image_filename),
            caption: post.caption.clone(),
            likes: post.likes,
            comment_count,
            time_since: post.time_since(now),
        }
    }
}

pub struct CommentView {
    pub username: String,
    pub content: String,
    pub time_since: String,
}

impl CommentView {
    pub fn new(comment: &Comment, now: DateTime<Utc>) -> Self {
        Self {
            username: comment.username.clone(),
            content: comment.content.clone(),
            time_since: comment.time_since(now),
        }
    }
}

// --- Templates ---

#[derive(Template)]
#[template(path = "pages/feed.html")]
pub struct FeedTemplate {
    pub posts: Vec<PostCard>,
    pub flashes: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "pages/post_detail.html")]
pub struct PostDetailTemplate {
    pub post: PostCard,
    pub comments: Vec<CommentView>,
    pub flashes: Vec<FlashMessage>,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

// --- Handlers ---

/// Feed of every post, newest first
pub async fn index(State(state): State<AppState>, flash: Flash) -> AppResult<Response> {
    let posts = state.posts.list_posts_desc().await?;
    let counts = state.posts.comment_counts().await?;

    let now = Utc::now();
    let posts = posts
        .iter()
        .map(|post| PostCard::new(post, counts.get(&post.id).copied().unwrap_or(0), now))
        .collect();

    Ok(flash.consume(Html(FeedTemplate {
        posts,
        flashes: flash.messages(),
    })))
}

pub async fn post_detail(
    State(state): State<AppState>,
    PostId(id): PostId,
    flash: Flash,
) -> AppResult<Response> {
    let post = state.posts.get_post(id).await?;
    let comments = state.posts.list_comments(id).await?;

    let now = Utc::now();
    let post = PostCard::new(&post, comments.len() as i64, now);
    let comments = comments
        .iter()
        .map(|comment| CommentView::new(comment, now))
        .collect();

    Ok(flash.consume(Html(PostDetailTemplate {
        post,
        comments,
        flashes: flash.messages(),
    })))
}
