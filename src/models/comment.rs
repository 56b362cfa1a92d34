use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    models::relation::ROOT_ID,
    utils::{snapshot::Snapshot, visibility::Visibility},
};

/// A comment as seen at one snapshot instant.
///
/// `hidden` and `deleted` are resolved against the snapshot, and the counts are
/// derived from the relation forest rather than stored on the comment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub content: String,
    /// Epoch seconds.
    pub posted_time: i64,
    pub hidden: bool,
    pub deleted: bool,
    pub child_count: i64,
    pub descendant_count: i64,
}

impl Comment {
    /// Content as it should be presented: deleted comments show nothing.
    pub fn display_content(&self) -> &str {
        if self.deleted { "" } else { &self.content }
    }

    /// Adjacency key of the parent; top-level comments hang off the synthetic root.
    pub fn parent_key(&self) -> i64 {
        self.parent_id.unwrap_or(ROOT_ID)
    }
}

/// Raw comment row with its parent edge and aggregate counts.
#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub hidden_time: Option<i64>,
    pub deleted_time: Option<i64>,
    pub posted_time: i64,
    pub content: String,
    pub children: i64,
    pub descendants: i64,
}

impl CommentRow {
    /// Resolves the stored stamps against `now`.
    pub fn resolve(self, now: Snapshot) -> Comment {
        let visibility = Visibility::resolve(self.hidden_time, self.deleted_time, now);
        Comment {
            id: self.id,
            parent_id: self.parent_id,
            content: self.content,
            posted_time: self.posted_time,
            hidden: visibility.hidden,
            deleted: visibility.deleted,
            child_count: self.children,
            descendant_count: self.descendants,
        }
    }
}

/// DTO for posting a new comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(
        min = 1,
        max = 2048,
        message = "Page url must be between 1 and 2048 characters"
    ))]
    pub page_url: String,

    #[validate(email(message = "Author email is invalid"))]
    pub email: String,

    #[validate(length(
        min = 1,
        max = 64,
        message = "Provider must be between 1 and 64 characters"
    ))]
    pub provider: String,

    #[validate(length(
        min = 1,
        max = 10000,
        message = "Comment must be between 1 and 10000 characters"
    ))]
    pub content: String,

    /// Optional: the ID of the comment being replied to.
    pub parent_id: Option<i64>,
}

/// Query parameters for fetching the replies of a comment.
#[derive(Debug, Default, Deserialize)]
pub struct ChildrenParams {
    /// Relative depth of the subtree to fetch. Absent means direct children only.
    pub depth: Option<u32>,
}
