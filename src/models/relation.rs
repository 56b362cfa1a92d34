use serde::Serialize;
use sqlx::FromRow;

/// Adjacency key of the synthetic root every top-level comment hangs off.
pub const ROOT_ID: i64 = 0;

/// Represents the 'Relations' table: one parent edge per comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize)]
pub struct Relation {
    pub parent_id: Option<i64>,
    pub child_id: i64,
    pub depth: i64,
}
