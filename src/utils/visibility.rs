// src/utils/visibility.rs

//! Classifies stored hide/delete stamps against a snapshot instant.
//!
//! The comparison is strict: a comment stamped exactly at `now` is not yet
//! hidden (or deleted) for that snapshot.

use serde::Serialize;

use super::snapshot::Snapshot;

/// Resolved visibility flags of one comment at one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Visibility {
    pub hidden: bool,
    pub deleted: bool,
}

impl Visibility {
    pub fn resolve(hidden_time: Option<i64>, deleted_time: Option<i64>, now: Snapshot) -> Self {
        Visibility {
            hidden: is_before(hidden_time, now),
            deleted: is_before(deleted_time, now),
        }
    }
}

fn is_before(stamp: Option<i64>, now: Snapshot) -> bool {
    stamp.is_some_and(|t| t < now.epoch())
}
