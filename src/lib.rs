// src/lib.rs

pub mod config;
pub mod error;
pub mod forest;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

// Re-export specific items for convenience if needed
pub use error::{AppError, StoreError, StoreResult};
pub use forest::{Forest, ForestBuilder};
pub use routes::create_router;
pub use store::CommentStore;
pub use utils::snapshot::Snapshot;
