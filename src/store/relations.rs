// src/store/relations.rs

//! Parent/child edges and the aggregates derived from them.
//!
//! The free functions run on any connection so the mutation service can call
//! them inside its transaction.

use sqlx::SqliteConnection;

use super::CommentStore;
use crate::{
    error::{StoreError, StoreResult},
    models::relation::Relation,
};

/// Depth recorded for `child_id`.
pub async fn get_depth(conn: &mut SqliteConnection, child_id: i64) -> StoreResult<i64> {
    sqlx::query_scalar::<_, i64>("SELECT depth FROM Relations WHERE childId = ?")
        .bind(child_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| StoreError::not_found(format!("comment {child_id}")))
}

/// Records that `child_id` replies to `parent_id` (or to the synthetic root).
///
/// The parent must already have a relation, which keeps the graph acyclic.
pub async fn insert_relation(
    conn: &mut SqliteConnection,
    parent_id: Option<i64>,
    child_id: i64,
    depth: i64,
) -> StoreResult<()> {
    let expected = match parent_id {
        Some(parent) => parent_depth(conn, parent).await? + 1,
        None => 0,
    };
    if depth != expected {
        return Err(StoreError::InvalidDepth {
            child: child_id,
            expected,
            got: depth,
        });
    }

    insert_edge(conn, parent_id, child_id, depth).await
}

/// Writes a relation row whose depth the caller already derived from the parent.
pub(super) async fn insert_edge(
    conn: &mut SqliteConnection,
    parent_id: Option<i64>,
    child_id: i64,
    depth: i64,
) -> StoreResult<()> {
    sqlx::query("INSERT INTO Relations (parentId, childId, depth) VALUES (?, ?, ?)")
        .bind(parent_id)
        .bind(child_id)
        .bind(depth)
        .execute(&mut *conn)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => StoreError::DuplicateRelation(child_id),
            _ => StoreError::from(e),
        })?;

    tracing::debug!(?parent_id, child_id, depth, "relation inserted");
    Ok(())
}

/// Depth of an existing parent; a missing parent is `InvalidParent`.
pub async fn parent_depth(conn: &mut SqliteConnection, parent_id: i64) -> StoreResult<i64> {
    match get_depth(conn, parent_id).await {
        Err(StoreError::NotFound(_)) => Err(StoreError::InvalidParent(parent_id)),
        other => other,
    }
}

/// Number of direct replies to `id`.
pub async fn child_count(conn: &mut SqliteConnection, id: i64) -> StoreResult<i64> {
    sqlx::query_scalar::<_, i64>(
        "SELECT (SELECT COUNT(*) FROM Relations WHERE parentId = ?) FROM Relations WHERE childId = ?",
    )
    .bind(id)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| StoreError::not_found(format!("comment {id}")))
}

/// Number of comments transitively below `id`, at most `max_depth` levels down.
///
/// The query yields -1 when `id` has no relation, which is reported as `NotFound`.
pub async fn descendant_count(
    conn: &mut SqliteConnection,
    id: i64,
    max_depth: Option<u32>,
) -> StoreResult<i64> {
    let bound = max_depth.map_or(i64::MAX, i64::from);
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        WITH RECURSIVE subtree (id, level) AS (
            SELECT childId, 0 FROM Relations WHERE childId = ?
            UNION ALL
            SELECT Relations.childId, subtree.level + 1
            FROM Relations
            JOIN subtree ON Relations.parentId = subtree.id
            WHERE subtree.level < ?
        )
        SELECT COUNT(*) - 1 FROM subtree
        "#,
    )
    .bind(id)
    .bind(bound)
    .fetch_one(&mut *conn)
    .await?;

    if count < 0 {
        return Err(StoreError::not_found(format!("comment {id}")));
    }
    Ok(count)
}

/// Top-level comment of the tree `id` belongs to.
pub async fn root_of(conn: &mut SqliteConnection, id: i64) -> StoreResult<i64> {
    sqlx::query_scalar::<_, i64>("SELECT rootId FROM Parents WHERE commentId = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| StoreError::not_found(format!("comment {id}")))
}

pub async fn get_relation(conn: &mut SqliteConnection, child_id: i64) -> StoreResult<Relation> {
    sqlx::query_as::<_, Relation>(
        "SELECT parentId AS parent_id, childId AS child_id, depth FROM Relations WHERE childId = ?",
    )
    .bind(child_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| StoreError::not_found(format!("comment {child_id}")))
}

impl CommentStore {
    pub async fn get_depth(&self, child_id: i64) -> StoreResult<i64> {
        let mut conn = self.pool.acquire().await?;
        get_depth(&mut conn, child_id).await
    }

    pub async fn insert_relation(
        &self,
        parent_id: Option<i64>,
        child_id: i64,
        depth: i64,
    ) -> StoreResult<()> {
        let _writer = self.write_lock().await;
        let mut tx = self.pool.begin().await?;
        insert_relation(&mut tx, parent_id, child_id, depth).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn child_count(&self, id: i64) -> StoreResult<i64> {
        let mut conn = self.pool.acquire().await?;
        child_count(&mut conn, id).await
    }

    pub async fn descendant_count(&self, id: i64, max_depth: Option<u32>) -> StoreResult<i64> {
        let mut conn = self.pool.acquire().await?;
        descendant_count(&mut conn, id, max_depth).await
    }

    pub async fn root_of(&self, id: i64) -> StoreResult<i64> {
        let mut conn = self.pool.acquire().await?;
        root_of(&mut conn, id).await
    }

    pub async fn get_relation(&self, child_id: i64) -> StoreResult<Relation> {
        let mut conn = self.pool.acquire().await?;
        get_relation(&mut conn, child_id).await
    }
}
