// Repository pattern - isolates all database side effects
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::db::models::{Comment, Post, ANONYMOUS_USERNAME};
use crate::state::DbPool;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid: {0}")]
    Invalid(String),
}

/// Repository trait - every method is one transactional unit
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post with zero likes, stamped with the current time
    async fn create_post(&self, image_filename: &str, caption: &str)
        -> Result<Post, RepositoryError>;

    async fn get_post(&self, id: i64) -> Result<Post, RepositoryError>;

    /// Delete a post and all of its comments. Returns false if it did not exist.
    async fn delete_post(&self, id: i64) -> Result<bool, RepositoryError>;

    /// All posts, newest first
    async fn list_posts_desc(&self) -> Result<Vec<Post>, RepositoryError>;

    /// Attach a comment to an existing post. Blank content is rejected.
    async fn add_comment(&self, post_id: i64, content: &str) -> Result<Comment, RepositoryError>;

    /// Atomically bump the like counter, returning the new value
    async fn increment_likes(&self, id: i64) -> Result<i64, RepositoryError>;

    /// Comments on a post, oldest first
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, RepositoryError>;

    /// Comment count per post id; posts without comments are absent
    async fn comment_counts(&self) -> Result<HashMap<i64, i64>, RepositoryError>;
}

/// SQLite implementation
pub struct SqlitePostRepository {
    pool: DbPool,
}

impl SqlitePostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        image_filename: row.get(1)?,
        caption: row.get(2)?,
        created_at: row.get(3)?,
        likes: row.get(4)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        content: row.get(1)?,
        created_at: row.get(2)?,
        post_id: row.get(3)?,
        username: row.get(4)?,
    })
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    async fn create_post(
        &self,
        image_filename: &str,
        caption: &str,
    ) -> Result<Post, RepositoryError> {
        let conn = self.pool.get()?;
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO posts (image_filename, caption, created_at, likes)
             VALUES (?1, ?2, ?3, 0)",
            params![image_filename, caption, created_at],
        )?;

        Ok(Post {
            id: conn.last_insert_rowid(),
            image_filename: image_filename.to_string(),
            caption: caption.to_string(),
            created_at,
            likes: 0,
        })
    }

    async fn get_post(&self, id: i64) -> Result<Post, RepositoryError> {
        let conn = self.pool.get()?;

        conn.query_row(
            "SELECT id, image_filename, caption, created_at, likes FROM posts WHERE id = ?1",
            params![id],
            post_from_row,
        )
        .optional()?
        .ok_or_else(|| RepositoryError::NotFound(format!("post {}", id)))
    }

    async fn delete_post(&self, id: i64) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let comments = tx.execute("DELETE FROM comments WHERE post_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        tx.commit()?;

        if rows > 0 {
            tracing::debug!("Deleted post {} and {} comment(s)", id, comments);
        }
        Ok(rows > 0)
    }

    async fn list_posts_desc(&self) -> Result<Vec<Post>, RepositoryError> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT id, image_filename, caption, created_at, likes
             FROM posts
             ORDER BY created_at DESC, id DESC",
        )?;
        let posts = stmt
            .query_map([], post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    async fn add_comment(&self, post_id: i64, content: &str) -> Result<Comment, RepositoryError> {
        // Stored as submitted; trimming only decides blankness
        if content.trim().is_empty() {
            return Err(RepositoryError::Invalid("comment content is empty".into()));
        }

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let exists: bool = tx.query_row(
            "SELECT COUNT(*) > 0 FROM posts WHERE id = ?1",
            params![post_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(RepositoryError::NotFound(format!("post {}", post_id)));
        }

        let created_at = Utc::now();
        tx.execute(
            "INSERT INTO comments (content, created_at, post_id, username)
             VALUES (?1, ?2, ?3, ?4)",
            params![content, created_at, post_id, ANONYMOUS_USERNAME],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Comment {
            id,
            content: content.to_string(),
            created_at,
            post_id,
            username: ANONYMOUS_USERNAME.to_string(),
        })
    }

    async fn increment_likes(&self, id: i64) -> Result<i64, RepositoryError> {
        let conn = self.pool.get()?;

        // Single statement: concurrent likes cannot lose updates
        conn.query_row(
            "UPDATE posts SET likes = likes + 1 WHERE id = ?1 RETURNING likes",
            params![id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| RepositoryError::NotFound(format!("post {}", id)))
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, RepositoryError> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT id, content, created_at, post_id, username
             FROM comments
             WHERE post_id = ?1
             ORDER BY created_at ASC, id ASC",
        )?;
        let comments = stmt
            .query_map(params![post_id], comment_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }

    async fn comment_counts(&self) -> Result<HashMap<i64, i64>, RepositoryError> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare("SELECT post_id, COUNT(*) FROM comments GROUP BY post_id")?;
        let counts = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(counts)
    }
}

/// Type alias for Arc-wrapped repository (for AppState)
pub type DynPostRepository = Arc<dyn PostRepository>;
