// src/forest/traversal.rs

use std::collections::VecDeque;

use super::Forest;

/// Lazy breadth-first walk over a [`Forest`].
///
/// Yields the descendants of the starting node in level order, siblings
/// ascending by id. Dropping the iterator abandons the walk.
#[derive(Debug, Clone)]
pub struct Bfs<'a> {
    forest: &'a Forest,
    queue: VecDeque<(i64, u32)>,
    max_depth: Option<u32>,
}

impl<'a> Bfs<'a> {
    pub fn new(forest: &'a Forest, root: i64) -> Self {
        let queue = forest.children(root).iter().map(|&id| (id, 1)).collect();
        Bfs {
            forest,
            queue,
            max_depth: None,
        }
    }

    /// Stops descending `depth` levels below the starting node.
    /// Must be called before the first `next`.
    pub fn max_depth(mut self, depth: u32) -> Self {
        if depth == 0 {
            self.queue.clear();
        }
        self.max_depth = Some(depth);
        self
    }
}

impl Iterator for Bfs<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        let (id, level) = self.queue.pop_front()?;
        if self.max_depth.is_none_or(|max| level < max) {
            self.queue
                .extend(self.forest.children(id).iter().map(|&child| (child, level + 1)));
        }
        Some(id)
    }
}

/// Lazy depth-first (pre-order) walk over a [`Forest`].
///
/// Siblings are visited in ascending id order, the same left-to-right order
/// as [`Bfs`]: children are pushed in descending order so the stack pops
/// the smallest first.
#[derive(Debug, Clone)]
pub struct Dfs<'a> {
    forest: &'a Forest,
    stack: Vec<i64>,
}

impl<'a> Dfs<'a> {
    pub fn new(forest: &'a Forest, root: i64) -> Self {
        let stack = forest.children(root).iter().rev().copied().collect();
        Dfs { forest, stack }
    }
}

impl Iterator for Dfs<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.forest.children(id).iter().rev().copied());
        Some(id)
    }
}
