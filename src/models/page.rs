use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{forest::Forest, utils::snapshot::Snapshot};

/// Represents the 'Pages' table in the database.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PageRow {
    pub id: i64,
    pub url: String,
    pub comments_open_time: Option<i64>,
}

/// Page metadata resolved at a snapshot instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub id: i64,
    pub url: String,
    pub comments_open_time: Option<i64>,
    /// Comments are open once the opening time has passed.
    pub open: bool,
}

impl PageRow {
    pub fn resolve(self, now: Snapshot) -> PageInfo {
        let open = self.comments_open_time.is_some_and(|t| t <= now.epoch());
        PageInfo {
            id: self.id,
            url: self.url,
            comments_open_time: self.comments_open_time,
            open,
        }
    }
}

/// One page's comment forest, rebuilt for every request.
#[derive(Debug, Clone)]
pub struct Page {
    pub info: PageInfo,
    pub forest: Forest,
}

impl Page {
    pub fn len(&self) -> usize {
        self.forest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forest.is_empty()
    }
}

/// Column a root listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootOrder {
    #[default]
    Id,
    PostedTime,
}

/// Sort and pagination of a page's top-level comments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortPaginate {
    pub order: RootOrder,
    pub desc: bool,
    /// A limit of 0 means no limit.
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl SortPaginate {
    /// Appends ORDER BY / LIMIT / OFFSET clauses to a query.
    ///
    /// Only fixed column names and integers are interpolated.
    pub fn apply(&self, query: &str) -> String {
        let column = match self.order {
            RootOrder::Id => "Comments.id",
            RootOrder::PostedTime => "Comments.postedTime",
        };
        let direction = if self.desc { "DESC" } else { "ASC" };
        // ties on postedTime fall back to id so the order stays deterministic
        let mut out = format!("{query}\nORDER BY {column} {direction}, Comments.id {direction}");

        match (self.limit.filter(|&n| n > 0), self.offset) {
            (Some(limit), offset) => {
                out.push_str(&format!("\nLIMIT {limit} OFFSET {}", offset.unwrap_or(0)));
            }
            (None, Some(offset)) => {
                out.push_str(&format!("\nLIMIT -1 OFFSET {offset}"));
            }
            (None, None) => {}
        }
        out
    }
}

/// Query parameters for looking a page up by url.
#[derive(Debug, Deserialize)]
pub struct PageUrlParams {
    pub url: String,
}

/// Query parameters for listing a page's top-level comments.
#[derive(Debug, Deserialize)]
pub struct RootListParams {
    pub url: String,
    #[serde(default)]
    pub order: RootOrder,
    #[serde(default)]
    pub desc: bool,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl RootListParams {
    pub fn sort(&self) -> SortPaginate {
        SortPaginate {
            order: self.order,
            desc: self.desc,
            limit: self.limit,
            offset: self.offset,
        }
    }
}
