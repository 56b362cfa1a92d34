// src/utils/snapshot.rs

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{Request, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, StoreError, StoreResult};

/// One fixed instant (epoch seconds) used for every visibility decision of a
/// request. The core never reads the wall clock on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(i64);

impl Snapshot {
    /// The latest representable instant; everything stamped so far is in its past.
    pub const MAX: Snapshot = Snapshot(i64::MAX);

    pub const fn at(epoch_seconds: i64) -> Self {
        Snapshot(epoch_seconds)
    }

    /// Captures the wall clock. Only the request boundary calls this.
    pub fn now() -> Self {
        Snapshot(Utc::now().timestamp())
    }

    pub const fn epoch(self) -> i64 {
        self.0
    }

    pub fn as_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }

    /// Turns an optional snapshot into a required one.
    pub fn require(snapshot: Option<Snapshot>) -> StoreResult<Snapshot> {
        snapshot.ok_or(StoreError::MissingSnapshot)
    }
}

/// Axum Middleware: captures the request-wide snapshot instant.
///
/// Injects a `Snapshot` into the request extensions so every handler of the
/// request sees the same "now".
pub async fn snapshot_middleware(mut req: Request<Body>, next: Next) -> Response {
    let snapshot = Snapshot::now();
    tracing::debug!(now = snapshot.epoch(), "captured request snapshot");
    req.extensions_mut().insert(snapshot);
    next.run(req).await
}

/// Extracts the snapshot injected by `snapshot_middleware`.
/// Fails with `MissingSnapshot` when the middleware is not installed.
impl<S> FromRequestParts<S> for Snapshot
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Snapshot::require(parts.extensions.get::<Snapshot>().copied()).map_err(AppError::from)
    }
}
