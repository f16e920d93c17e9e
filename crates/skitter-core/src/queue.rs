use std::future::Future;

use chrono::{DateTime, Utc};

use crate::error::AppError;

/// Work distribution queues: serialized task snapshots awaiting promotion
/// (ready queue) and task ids cycling through the worker loop
/// (worker queue).
///
/// Implementations must make `claim_worker_rotate` a single atomic
/// operation so a claimed id is never lost between pop and re-push.
pub trait WorkQueue: Send + Sync + Clone {
    /// Append a serialized task snapshot to the ready queue.
    fn push_ready(&self, payload: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Remove one snapshot from the ready queue. An empty queue is a
    /// normal, frequent condition and returns `None`, not an error.
    /// Consumers must not assume strict FIFO across concurrent producers.
    fn pop_ready(&self) -> impl Future<Output = Result<Option<String>, AppError>> + Send;

    /// Append a task id to the worker queue.
    fn push_worker(&self, task_id: i64) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Atomically pop one id from the head of the worker queue and push
    /// it back onto the tail. The claimed entry is moved, not deleted,
    /// so in the absence of new work the same id cycles indefinitely —
    /// redelivery without acknowledgment tracking. Returns `None` when
    /// the queue is empty; callers back off with a fixed delay.
    fn claim_worker_rotate(&self) -> impl Future<Output = Result<Option<i64>, AppError>> + Send;
}

/// A URL and the time its crawl completed.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitedEntry {
    pub url: String,
    pub visited_at: DateTime<Utc>,
}

/// Fast membership/visited-timestamp structure, distinct from the durable
/// store's audit records. Backed by the same external queue/set service
/// as [`WorkQueue`].
pub trait DedupTracker: Send + Sync + Clone {
    /// Insert a URL into the discovered set. Idempotent — inserting a
    /// URL that is already a member is a no-op, not an error.
    fn mark_discovered(&self, url: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Membership test against the discovered set. The primitive
    /// underlying "avoid re-enqueueing a URL already seen"; the current
    /// crawl step inserts blindly and does not consult it first.
    fn is_discovered(&self, url: &str) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Record a completed crawl of a URL at the given time. Re-visiting
    /// a URL refreshes its timestamp.
    fn mark_visited(
        &self,
        url: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// List visited URLs in the inclusive time range, ascending by
    /// timestamp.
    fn visited_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<VisitedEntry>, AppError>> + Send;
}
