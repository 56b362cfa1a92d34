// src/store/mod.rs

//! Durable comment store backed by SQLite.
//!
//! `CommentStore` is the single handle every component receives; it is opened
//! once at startup and closed on shutdown.

mod mutations;
mod pages;
pub mod relations;

use std::{str::FromStr, sync::Arc, time::Duration};

use async_trait::async_trait;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tokio::sync::{Mutex, MutexGuard};

use crate::{
    error::StoreResult,
    forest::{ChildSource, FetchOptions, Forest, fetch_subtree},
    models::comment::Comment,
    utils::snapshot::Snapshot,
};

#[derive(Debug, Clone)]
pub struct CommentStore {
    pool: SqlitePool,
    /// SQLite allows one writer at a time; write transactions queue here
    /// instead of failing with `SQLITE_BUSY` on lock upgrade.
    writer: Arc<Mutex<()>>,
    fetch: FetchOptions,
}

impl CommentStore {
    /// Opens (creating if needed) the database at `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(options)
            .await?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        CommentStore {
            pool,
            writer: Arc::new(Mutex::new(())),
            fetch: FetchOptions::default(),
        }
    }

    async fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().await
    }

    pub fn with_fetch_options(mut self, fetch: FetchOptions) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Fills the subtree below `root` up to `depth` levels, fetching sibling
    /// and cousin children concurrently.
    pub async fn bfs_get_comment_children(
        &self,
        root: &Comment,
        depth: u32,
        now: Snapshot,
    ) -> StoreResult<Forest> {
        fetch_subtree(Arc::new(self.clone()), root.clone(), depth, now, self.fetch).await
    }
}

#[async_trait]
impl ChildSource for CommentStore {
    async fn descendant_count(&self, id: i64, max_depth: Option<u32>) -> StoreResult<i64> {
        CommentStore::descendant_count(self, id, max_depth).await
    }

    async fn children(&self, parent_id: i64, now: Snapshot) -> StoreResult<Vec<Comment>> {
        self.children_of(parent_id, now).await
    }
}
