// src/store/pages.rs

//! Page assembly and comment reads.

use futures::{TryStreamExt, stream::BoxStream};
use sqlx::FromRow;

use super::CommentStore;
use crate::{
    error::{StoreError, StoreResult},
    forest::ForestBuilder,
    models::{
        comment::{Comment, CommentRow},
        page::{Page, PageInfo, PageRow, SortPaginate},
    },
    utils::snapshot::Snapshot,
};

/// Comment columns plus aggregates computed only for the rows picked by `seed`.
///
/// `seed` is a `FROM Relations ...` tail (joins and a WHERE clause) selecting
/// the wanted relation rows; the recursive walk starts from those rows alone,
/// so the cost follows the size of their subtrees, not of the database.
fn comment_select(seed: &str) -> String {
    format!(
        r#"
    WITH RECURSIVE subtree (startId, childId) AS (
        SELECT Relations.childId, Relations.childId
        FROM Relations {seed}
        UNION ALL
        SELECT subtree.startId, Relations.childId
        FROM Relations
        JOIN subtree ON Relations.parentId = subtree.childId
    )
    SELECT
        Comments.id AS id,
        Relations.parentId AS parent_id,
        Comments.hiddenTime AS hidden_time,
        Comments.deletedTime AS deleted_time,
        Comments.postedTime AS posted_time,
        Comments.content AS content,
        (SELECT COUNT(*) FROM Relations AS r WHERE r.parentId = Comments.id) AS children,
        counts.descendants AS descendants
    FROM Comments
    JOIN Relations ON Comments.id = Relations.childId
    JOIN (
        SELECT startId, COUNT(*) - 1 AS descendants FROM subtree GROUP BY startId
    ) AS counts ON counts.startId = Comments.id"#
    )
}

/// Comment columns of a whole page. Aggregates are filled in from the
/// assembled forest, which already holds every edge of the page.
const PAGE_COMMENT_SELECT: &str = r#"
    SELECT
        Comments.id AS id,
        Relations.parentId AS parent_id,
        Comments.hiddenTime AS hidden_time,
        Comments.deletedTime AS deleted_time,
        Comments.postedTime AS posted_time,
        Comments.content AS content,
        0 AS children,
        0 AS descendants,
        Pages.id AS page_id,
        Pages.url AS page_url,
        Pages.commentsOpenTime AS comments_open_time
    FROM Comments
    JOIN Pages ON Comments.pageId = Pages.id
    JOIN Relations ON Comments.id = Relations.childId"#;

#[derive(Debug, FromRow)]
struct PageCommentRow {
    #[sqlx(flatten)]
    comment: CommentRow,
    page_id: i64,
    page_url: String,
    comments_open_time: Option<i64>,
}

/// Builds a page from a row stream.
///
/// Some drivers report a missing page as a successful, empty result, so the
/// absence of rows is what signals `NotFound` here.
async fn assemble(
    mut rows: BoxStream<'_, Result<PageCommentRow, sqlx::Error>>,
    now: Snapshot,
    missing: impl FnOnce() -> StoreError,
) -> StoreResult<Page> {
    let builder = ForestBuilder::new(now);
    let mut info: Option<PageInfo> = None;

    while let Some(row) = rows.try_next().await? {
        if info.is_none() {
            let page = PageRow {
                id: row.page_id,
                url: row.page_url,
                comments_open_time: row.comments_open_time,
            };
            info = Some(page.resolve(now));
        }
        builder.insert(row.comment.resolve(now));
    }

    let info = info.ok_or_else(missing)?;
    let mut forest = builder.finish();
    forest.fill_aggregates();
    tracing::debug!(page = %info.url, comments = forest.len(), "page assembled");
    Ok(Page { info, forest })
}

impl CommentStore {
    /// Loads a page's full comment forest by url.
    pub async fn get_page_comments(&self, page_url: &str, now: Snapshot) -> StoreResult<Page> {
        let query = format!("{PAGE_COMMENT_SELECT}\n    WHERE Pages.url = ?");
        let rows = sqlx::query_as::<_, PageCommentRow>(&query)
            .bind(page_url)
            .fetch(&self.pool);
        assemble(rows, now, || StoreError::not_found(format!("page {page_url}"))).await
    }

    /// Loads a page's full comment forest by page id.
    pub async fn get_page_comments_by_id(&self, page_id: i64, now: Snapshot) -> StoreResult<Page> {
        let query = format!("{PAGE_COMMENT_SELECT}\n    WHERE Pages.id = ?");
        let rows = sqlx::query_as::<_, PageCommentRow>(&query)
            .bind(page_id)
            .fetch(&self.pool);
        assemble(rows, now, || StoreError::not_found(format!("page #{page_id}"))).await
    }

    /// Top-level comments of a page, sorted and paginated.
    ///
    /// A page without comments is `NotFound`; a slice past the last root of
    /// a page that has comments is empty.
    pub async fn get_page_root_comments(
        &self,
        page_url: &str,
        now: Snapshot,
        sort: SortPaginate,
    ) -> StoreResult<Vec<Comment>> {
        let query = sort.apply(&comment_select(
            "JOIN Comments ON Comments.id = Relations.childId
        JOIN Pages ON Comments.pageId = Pages.id
        WHERE Pages.url = ? AND Relations.parentId IS NULL",
        ));
        let rows = sqlx::query_as::<_, CommentRow>(&query)
            .bind(page_url)
            .fetch_all(&self.pool)
            .await?;

        if rows.is_empty() && !self.page_has_comments(page_url).await? {
            return Err(StoreError::not_found(format!("page {page_url}")));
        }
        Ok(rows.into_iter().map(|row| row.resolve(now)).collect())
    }

    async fn page_has_comments(&self, page_url: &str) -> StoreResult<bool> {
        let found = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM Comments
                JOIN Pages ON Comments.pageId = Pages.id
                WHERE Pages.url = ?
            )
            "#,
        )
        .bind(page_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(found != 0)
    }

    pub async fn get_page_info(&self, page_url: &str, now: Snapshot) -> StoreResult<PageInfo> {
        let page = sqlx::query_as::<_, PageRow>(
            "SELECT id, url, commentsOpenTime AS comments_open_time FROM Pages WHERE url = ?",
        )
        .bind(page_url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found(format!("page {page_url}")))?;

        Ok(page.resolve(now))
    }

    pub async fn get_comment_by_id(&self, id: i64, now: Snapshot) -> StoreResult<Comment> {
        let query = comment_select("WHERE Relations.childId = ?");
        let row = sqlx::query_as::<_, CommentRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("comment {id}")))?;

        Ok(row.resolve(now))
    }

    /// Direct replies to `comment`, ascending by id. Unknown comments have none.
    pub async fn get_comment_children(
        &self,
        comment: &Comment,
        now: Snapshot,
    ) -> StoreResult<Vec<Comment>> {
        self.children_of(comment.id, now).await
    }

    pub(super) async fn children_of(
        &self,
        parent_id: i64,
        now: Snapshot,
    ) -> StoreResult<Vec<Comment>> {
        let query = format!(
            "{}\n    ORDER BY Comments.id ASC",
            comment_select("WHERE Relations.parentId = ?")
        );
        let rows = sqlx::query_as::<_, CommentRow>(&query)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|row| row.resolve(now)).collect())
    }
}
