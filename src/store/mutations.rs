// src/store/mutations.rs

//! Transactional writes: posting, hiding and deleting comments, plus the
//! user/page fixtures comments hang off.

use super::{CommentStore, relations};
use crate::{
    error::{StoreError, StoreResult},
    models::user::AuthorIdentity,
    utils::snapshot::Snapshot,
};

impl CommentStore {
    /// Posts a comment and its relation edge in one transaction.
    ///
    /// Any failure drops the transaction, so a comment row never exists
    /// without its relation row.
    pub async fn post_comment(
        &self,
        page_url: &str,
        author: &AuthorIdentity,
        content: &str,
        parent_id: Option<i64>,
        now: Snapshot,
    ) -> StoreResult<i64> {
        let _writer = self.write_lock().await;
        let mut tx = self.pool.begin().await?;

        // 1. Resolve author and page
        let user_id = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM Users WHERE email = ? AND provider = ?",
        )
        .bind(&author.email)
        .bind(&author.provider)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::UserNotFound {
            email: author.email.clone(),
            provider: author.provider.clone(),
        })?;

        let page_id = sqlx::query_scalar::<_, i64>("SELECT id FROM Pages WHERE url = ?")
            .bind(page_url)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::PageNotFound(page_url.to_string()))?;

        // 2. A reply must stay on its parent's page
        if let Some(pid) = parent_id {
            let parent_page =
                sqlx::query_scalar::<_, i64>("SELECT pageId FROM Comments WHERE id = ?")
                    .bind(pid)
                    .fetch_optional(&mut *tx)
                    .await?;
            if parent_page != Some(page_id) {
                return Err(StoreError::InvalidParent(pid));
            }
        }

        // 3. Insert Comment
        let id = sqlx::query(
            "INSERT INTO Comments (userId, pageId, postedTime, content) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(page_id)
        .bind(now.epoch())
        .bind(content)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        // 4. Insert Relation
        let depth = match parent_id {
            Some(pid) => relations::parent_depth(&mut tx, pid).await? + 1,
            None => 0,
        };
        relations::insert_edge(&mut tx, parent_id, id, depth).await?;

        tx.commit().await?;

        tracing::info!(id, page = page_url, ?parent_id, depth, "comment posted");
        Ok(id)
    }

    /// Hides a comment from `now` on. A comment already hidden keeps its first stamp.
    pub async fn hide_comment(&self, id: i64, now: Snapshot) -> StoreResult<()> {
        let _writer = self.write_lock().await;
        let result =
            sqlx::query("UPDATE Comments SET hiddenTime = COALESCE(hiddenTime, ?) WHERE id = ?")
                .bind(now.epoch())
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("comment {id}")));
        }
        tracing::info!(id, "comment hidden");
        Ok(())
    }

    /// Reverses `hide_comment`.
    pub async fn unhide_comment(&self, id: i64) -> StoreResult<()> {
        let _writer = self.write_lock().await;
        let result = sqlx::query("UPDATE Comments SET hiddenTime = NULL WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("comment {id}")));
        }
        tracing::info!(id, "comment unhidden");
        Ok(())
    }

    /// Marks a comment deleted and clears its content. Relation edges stay,
    /// so replies remain reachable.
    pub async fn delete_comment(&self, id: i64, now: Snapshot) -> StoreResult<()> {
        let _writer = self.write_lock().await;
        let result = sqlx::query(
            "UPDATE Comments SET deletedTime = COALESCE(deletedTime, ?), content = '' WHERE id = ?",
        )
        .bind(now.epoch())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("comment {id}")));
        }
        tracing::info!(id, "comment deleted");
        Ok(())
    }

    /// Registers an author identity, returning the existing id when already known.
    pub async fn ensure_user(
        &self,
        author: &AuthorIdentity,
        name: Option<&str>,
    ) -> StoreResult<i64> {
        let _writer = self.write_lock().await;
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO Users (email, provider, name) VALUES (?, ?, ?)
            ON CONFLICT (email, provider)
                DO UPDATE SET name = COALESCE(excluded.name, Users.name)
            RETURNING id
            "#,
        )
        .bind(&author.email)
        .bind(&author.provider)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn create_page(
        &self,
        url: &str,
        comments_open_time: Option<i64>,
    ) -> StoreResult<i64> {
        let _writer = self.write_lock().await;
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO Pages (url, commentsOpenTime) VALUES (?, ?) RETURNING id",
        )
        .bind(url)
        .bind(comments_open_time)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => StoreError::DuplicatePage(url.to_string()),
            _ => StoreError::from(e),
        })?;

        tracing::info!(id, url, "page created");
        Ok(id)
    }
}
