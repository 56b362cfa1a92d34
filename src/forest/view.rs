// src/forest/view.rs

use serde::Serialize;

use super::Forest;
use crate::models::relation::ROOT_ID;

/// Nested rendition of a thread, derived from a [`Forest`] on demand.
///
/// Borrows every payload from the forest; deleted comments carry empty content.
#[derive(Debug, Serialize)]
pub struct ThreadView<'a> {
    pub id: i64,
    pub content: &'a str,
    pub posted_time: i64,
    pub hidden: bool,
    pub deleted: bool,
    pub child_count: i64,
    pub descendant_count: i64,
    pub replies: Vec<ThreadView<'a>>,
}

impl Forest {
    /// Nested view of every thread on the page.
    pub fn thread_view(&self) -> Vec<ThreadView<'_>> {
        self.thread_view_from(ROOT_ID)
    }

    /// Nested view of the replies below `id`.
    pub fn thread_view_from(&self, id: i64) -> Vec<ThreadView<'_>> {
        self.children(id)
            .iter()
            .filter_map(|&child| self.node_view(child))
            .collect()
    }

    fn node_view(&self, id: i64) -> Option<ThreadView<'_>> {
        let comment = self.get(id)?;
        Some(ThreadView {
            id,
            content: comment.display_content(),
            posted_time: comment.posted_time,
            hidden: comment.hidden,
            deleted: comment.deleted,
            child_count: comment.child_count,
            descendant_count: comment.descendant_count,
            replies: self.thread_view_from(id),
        })
    }
}
