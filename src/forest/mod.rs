// src/forest/mod.rs

//! In-memory comment forest: a flat id-keyed map of comments plus an
//! adjacency map from node id (0 being the synthetic root) to its children,
//! each bucket kept sorted ascending by id.

mod fetch;
mod traversal;
mod view;

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::{
    models::{comment::Comment, relation::ROOT_ID},
    utils::snapshot::Snapshot,
};

pub use fetch::{ChildSource, FetchOptions, fetch_subtree};
pub use traversal::{Bfs, Dfs};
pub use view::ThreadView;

/// A read-only forest of comments resolved at one snapshot instant.
#[derive(Debug, Clone)]
pub struct Forest {
    now: Snapshot,
    comments: HashMap<i64, Comment>,
    children: HashMap<i64, Vec<i64>>,
}

impl Forest {
    /// The snapshot instant every comment of this forest was resolved at.
    pub fn now(&self) -> Snapshot {
        self.now
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Comment> {
        self.comments.get(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.comments.contains_key(&id)
    }

    /// Direct children of `id` in ascending order; empty for leaves and unknown ids.
    pub fn children(&self, id: i64) -> &[i64] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Top-level comments (children of the synthetic root).
    pub fn roots(&self) -> &[i64] {
        self.children(ROOT_ID)
    }

    /// Every comment id, ascending.
    pub fn ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.comments.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.comments.values()
    }

    /// Level-order walk of the whole forest.
    pub fn bfs(&self) -> Bfs<'_> {
        Bfs::new(self, ROOT_ID)
    }

    /// Level-order walk below `root` (excluding `root` itself).
    pub fn bfs_from(&self, root: i64) -> Bfs<'_> {
        Bfs::new(self, root)
    }

    /// Pre-order walk of the whole forest, siblings ascending.
    pub fn dfs(&self) -> Dfs<'_> {
        Dfs::new(self, ROOT_ID)
    }

    /// Pre-order walk below `root` (excluding `root` itself).
    pub fn dfs_from(&self, root: i64) -> Dfs<'_> {
        Dfs::new(self, root)
    }

    /// Number of direct children, or `None` when `id` is not part of the forest.
    pub fn child_count(&self, id: i64) -> Option<usize> {
        self.knows(id).then(|| self.children(id).len())
    }

    /// Number of comments reachable below `id`, at most `max_depth` levels down.
    /// `None` when `id` is not part of the forest.
    pub fn descendant_count(&self, id: i64, max_depth: Option<u32>) -> Option<usize> {
        if !self.knows(id) {
            return None;
        }
        let walk = self.bfs_from(id);
        let walk = match max_depth {
            Some(depth) => walk.max_depth(depth),
            None => walk,
        };
        Some(walk.count())
    }

    /// Recomputes every comment's child and descendant counts from the
    /// edges held by this forest. Only meaningful for a complete page.
    pub fn fill_aggregates(&mut self) {
        let order: Vec<i64> = self.bfs().collect();
        let mut descendants: HashMap<i64, i64> = HashMap::with_capacity(order.len());

        // children come after their parent in level order
        for &id in order.iter().rev() {
            let below: i64 = self
                .children(id)
                .iter()
                .map(|child| 1 + descendants.get(child).copied().unwrap_or(0))
                .sum();
            descendants.insert(id, below);
        }

        for (&id, below) in &descendants {
            let children = self.children.get(&id).map_or(0, Vec::len) as i64;
            if let Some(comment) = self.comments.get_mut(&id) {
                comment.child_count = children;
                comment.descendant_count = *below;
            }
        }
    }

    fn knows(&self, id: i64) -> bool {
        id == ROOT_ID || self.contains(id)
    }
}

#[derive(Debug, Default)]
struct Parts {
    comments: HashMap<i64, Comment>,
    children: HashMap<i64, Vec<i64>>,
}

/// Collects comments into a [`Forest`].
///
/// Rows may arrive out of order and from several producers at once, so both
/// maps sit behind one lock that is held for a single insertion. `finish`
/// hands the maps over to an immutable `Forest` that needs no locking.
#[derive(Debug)]
pub struct ForestBuilder {
    now: Snapshot,
    parts: Mutex<Parts>,
}

impl ForestBuilder {
    pub fn new(now: Snapshot) -> Self {
        ForestBuilder {
            now,
            parts: Mutex::new(Parts::default()),
        }
    }

    /// Stores `comment` and files it under its own parent (or the synthetic root).
    pub fn insert(&self, comment: Comment) {
        let parent = comment.parent_key();
        self.attach(parent, comment);
    }

    /// Stores `comment` and files it under `parent`.
    pub fn attach(&self, parent: i64, comment: Comment) {
        let id = comment.id;
        let mut parts = self.parts.lock();
        parts.comments.insert(id, comment);
        let bucket = parts.children.entry(parent).or_default();
        if let Err(pos) = bucket.binary_search(&id) {
            bucket.insert(pos, id);
        }
    }

    /// Stores `comment` without filing it under any parent, e.g. a subtree root.
    pub fn insert_detached(&self, comment: Comment) {
        self.parts.lock().comments.insert(comment.id, comment);
    }

    pub fn finish(self) -> Forest {
        let parts = self.parts.into_inner();
        Forest {
            now: self.now,
            comments: parts.comments,
            children: parts.children,
        }
    }
}
