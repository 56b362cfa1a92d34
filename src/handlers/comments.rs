use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use validator::Validate;

use crate::{
    error::AppError,
    forest::ForestBuilder,
    models::{
        comment::{ChildrenParams, CreateCommentRequest},
        user::AuthorIdentity,
    },
    store::CommentStore,
    utils::snapshot::Snapshot,
};

/// Post a new comment (or a reply).
pub async fn create_comment(
    State(store): State<CommentStore>,
    now: Snapshot,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let author = AuthorIdentity::new(payload.email, payload.provider);
    let new_id = store
        .post_comment(
            &payload.page_url,
            &author,
            &payload.content,
            payload.parent_id,
            now,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": new_id })),
    ))
}

/// Fetch a single comment.
pub async fn get_comment(
    State(store): State<CommentStore>,
    now: Snapshot,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let comment = store.get_comment_by_id(id, now).await?;

    Ok(Json(serde_json::json!({
        "id": comment.id,
        "parent_id": comment.parent_id,
        "content": comment.display_content(),
        "posted_time": comment.posted_time,
        "hidden": comment.hidden,
        "deleted": comment.deleted,
        "child_count": comment.child_count,
        "descendant_count": comment.descendant_count,
    })))
}

/// Fetch the replies below a comment.
///
/// Without `depth` only direct children are loaded; with it the subtree is
/// fetched concurrently down to that depth.
pub async fn get_comment_children(
    State(store): State<CommentStore>,
    now: Snapshot,
    Path(id): Path<i64>,
    Query(params): Query<ChildrenParams>,
) -> Result<Response, AppError> {
    let comment = store.get_comment_by_id(id, now).await?;

    let forest = match params.depth {
        Some(depth) => store.bfs_get_comment_children(&comment, depth, now).await?,
        None => {
            let children = store.get_comment_children(&comment, now).await?;
            let builder = ForestBuilder::new(now);
            builder.insert_detached(comment);
            for child in children {
                builder.attach(id, child);
            }
            builder.finish()
        }
    };

    Ok(Json(serde_json::json!({
        "id": id,
        "now": forest.now(),
        "total": forest.len().saturating_sub(1),
        "replies": forest.thread_view_from(id),
    }))
    .into_response())
}

/// Hide a comment.
pub async fn hide_comment(
    State(store): State<CommentStore>,
    now: Snapshot,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    store.hide_comment(id, now).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reverse a hide.
pub async fn unhide_comment(
    State(store): State<CommentStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    store.unhide_comment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Soft-delete a comment: its content is cleared, its replies stay.
pub async fn delete_comment(
    State(store): State<CommentStore>,
    now: Snapshot,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    store.delete_comment(id, now).await?;
    Ok(StatusCode::NO_CONTENT)
}
