// src/forest/fetch.rs

//! Bounded concurrent subtree fetch.
//!
//! Children of a subtree root live in a (possibly remote) store; fetching them
//! level by level serializes one round trip per level. Here a pool of workers
//! shares one work queue so round trips for siblings and cousins overlap.
//! The queue holds at most the descendant count captured up front, which
//! bounds every wait.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinSet,
};

use super::{Forest, ForestBuilder};
use crate::{
    error::{StoreError, StoreResult},
    models::comment::Comment,
    utils::snapshot::Snapshot,
};

/// Storage seam used by [`fetch_subtree`].
#[async_trait]
pub trait ChildSource: Send + Sync {
    /// Number of comments at most `max_depth` levels below `id`.
    /// Fails with `NotFound` when `id` has no relation.
    async fn descendant_count(&self, id: i64, max_depth: Option<u32>) -> StoreResult<i64>;

    /// Direct children of `parent_id`, ascending by id, resolved at `now`.
    async fn children(&self, parent_id: i64, now: Snapshot) -> StoreResult<Vec<Comment>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Upper bound on concurrent workers. `None` runs one worker per expected node.
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    id: i64,
    level: u32,
}

enum WorkerExit {
    /// This worker completed the last outstanding node.
    Finished,
    /// The queue closed underneath the worker.
    Closed,
}

#[derive(Debug)]
struct Progress {
    expected: usize,
    /// Nodes admitted into the queue so far, root included.
    admitted: AtomicUsize,
    /// Nodes admitted but not yet fully processed.
    outstanding: AtomicUsize,
}

impl Progress {
    fn new(expected: usize) -> Self {
        Progress {
            expected,
            admitted: AtomicUsize::new(1),
            outstanding: AtomicUsize::new(1),
        }
    }

    /// Claims a queue slot; fails once `expected` nodes were admitted.
    fn admit(&self) -> bool {
        let claimed = self
            .admitted
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.expected).then_some(n + 1)
            })
            .is_ok();
        if claimed {
            self.outstanding.fetch_add(1, Ordering::AcqRel);
        }
        claimed
    }

    /// Marks one node done; true when nothing is left.
    fn complete(&self) -> bool {
        self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1
    }
}

/// Fetches the subtree below `root`, at most `depth` levels deep.
///
/// The returned forest holds `root` (detached) and every fetched descendant
/// filed under its parent, so `forest.bfs_from(root.id)` walks the subtree.
/// The first worker error aborts every other worker and is returned; no
/// partial subtree is ever handed back.
pub async fn fetch_subtree<S>(
    source: Arc<S>,
    root: Comment,
    depth: u32,
    now: Snapshot,
    options: FetchOptions,
) -> StoreResult<Forest>
where
    S: ChildSource + ?Sized + 'static,
{
    let root_id = root.id;
    let descendants = source.descendant_count(root_id, Some(depth)).await?;
    let builder = ForestBuilder::new(now);
    builder.insert_detached(root);

    if descendants <= 0 {
        tracing::debug!(root = root_id, depth, "subtree has no descendants in range");
        return Ok(builder.finish());
    }

    let expected = usize::try_from(descendants + 1)
        .map_err(|e| StoreError::Storage(format!("descendant count out of range: {e}")))?;
    let workers = options
        .workers
        .map_or(expected, |limit| limit.clamp(1, expected));
    tracing::debug!(root = root_id, depth, expected, workers, "fetching subtree");

    let builder = Arc::new(builder);
    let progress = Arc::new(Progress::new(expected));
    let (sender, receiver) = mpsc::channel(expected);
    let queue = Arc::new(Mutex::new(receiver));

    sender
        .send(Pending {
            id: root_id,
            level: 0,
        })
        .await
        .map_err(|_| StoreError::Storage("subtree queue closed".to_string()))?;

    let mut set = JoinSet::new();
    for _ in 0..workers {
        set.spawn(run_worker(
            Arc::clone(&source),
            Arc::clone(&queue),
            sender.clone(),
            Arc::clone(&builder),
            Arc::clone(&progress),
            depth,
            now,
        ));
    }
    drop(sender);

    let mut outcome: StoreResult<bool> = Ok(false);
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(WorkerExit::Finished)) => {
                outcome = Ok(true);
                break;
            }
            Ok(Ok(WorkerExit::Closed)) => {}
            Ok(Err(err)) => {
                tracing::warn!(root = root_id, error = %err, "subtree fetch failed");
                outcome = Err(err);
                break;
            }
            Err(join_err) => {
                outcome = Err(StoreError::Storage(format!("fetch worker failed: {join_err}")));
                break;
            }
        }
    }

    // wake anything still parked on the queue and wait until it is gone
    set.abort_all();
    while set.join_next().await.is_some() {}

    if !outcome? {
        return Err(StoreError::Storage(format!(
            "subtree fetch below {root_id} ended before all nodes were processed"
        )));
    }

    let builder = Arc::try_unwrap(builder)
        .map_err(|_| StoreError::Storage("subtree builder still shared".to_string()))?;
    Ok(builder.finish())
}

async fn run_worker<S>(
    source: Arc<S>,
    queue: Arc<Mutex<mpsc::Receiver<Pending>>>,
    sender: mpsc::Sender<Pending>,
    builder: Arc<ForestBuilder>,
    progress: Arc<Progress>,
    depth: u32,
    now: Snapshot,
) -> StoreResult<WorkerExit>
where
    S: ChildSource + ?Sized,
{
    loop {
        let next = queue.lock().await.recv().await;
        let Some(node) = next else {
            return Ok(WorkerExit::Closed);
        };

        if node.level < depth {
            for child in source.children(node.id, now).await? {
                // posted after the snapshot; must not take a counted slot
                if child.posted_time > now.epoch() || !progress.admit() {
                    tracing::debug!(parent = node.id, child = child.id, "skipping late reply");
                    continue;
                }
                let pending = Pending {
                    id: child.id,
                    level: node.level + 1,
                };
                builder.attach(node.id, child);
                sender
                    .send(pending)
                    .await
                    .map_err(|_| StoreError::Storage("subtree queue closed".to_string()))?;
            }
        }

        if progress.complete() {
            return Ok(WorkerExit::Finished);
        }
    }
}
