use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::db;
use crate::db::repository::{DynPostRepository, SqlitePostRepository};
use crate::upload::UploadStore;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub posts: DynPostRepository,
    pub uploads: Arc<UploadStore>,
    pub config: Config,
}

impl AppState {
    /// Opens the database (creating and migrating it if needed) and the upload directory.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let pool = db::create_pool(config.db_path())?;
        db::run_migrations(&pool)?;

        let uploads = UploadStore::new(config.uploads_path().to_path_buf()).await?;

        Ok(Self {
            posts: Arc::new(SqlitePostRepository::new(pool)),
            uploads: Arc::new(uploads),
            config,
        })
    }
}
