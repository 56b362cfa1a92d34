use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    error::AppError,
    forest::ThreadView,
    models::page::{Page, PageInfo, PageUrlParams, RootListParams},
    store::CommentStore,
    utils::snapshot::Snapshot,
};

/// A page and its nested threads.
#[derive(Debug, Serialize)]
pub struct PageResponse<'a> {
    pub page: &'a PageInfo,
    pub now: Snapshot,
    pub total: usize,
    pub comments: Vec<ThreadView<'a>>,
}

impl<'a> PageResponse<'a> {
    pub fn new(page: &'a Page) -> Self {
        PageResponse {
            page: &page.info,
            now: page.forest.now(),
            total: page.len(),
            comments: page.forest.thread_view(),
        }
    }
}

/// Fetch every comment of a page, by url.
pub async fn get_page_comments(
    State(store): State<CommentStore>,
    now: Snapshot,
    Query(params): Query<PageUrlParams>,
) -> Result<Response, AppError> {
    tracing::info!(page = %params.url, "fetching comments for page");
    let page = store.get_page_comments(&params.url, now).await?;
    Ok(Json(PageResponse::new(&page)).into_response())
}

/// Fetch every comment of a page, by page id.
pub async fn get_page_comments_by_id(
    State(store): State<CommentStore>,
    now: Snapshot,
    Path(page_id): Path<i64>,
) -> Result<Response, AppError> {
    tracing::info!(page_id, "fetching comments for page");
    let page = store.get_page_comments_by_id(page_id, now).await?;
    Ok(Json(PageResponse::new(&page)).into_response())
}

/// List the top-level comments of a page.
pub async fn get_page_root_comments(
    State(store): State<CommentStore>,
    now: Snapshot,
    Query(params): Query<RootListParams>,
) -> Result<impl IntoResponse, AppError> {
    let comments = store
        .get_page_root_comments(&params.url, now, params.sort())
        .await?;

    let view: Vec<serde_json::Value> = comments
        .iter()
        .map(|c| {
            serde_json::json!({
                "id": c.id,
                "content": c.display_content(),
                "posted_time": c.posted_time,
                "hidden": c.hidden,
                "deleted": c.deleted,
                "child_count": c.child_count,
                "descendant_count": c.descendant_count,
            })
        })
        .collect();

    Ok(Json(view))
}
