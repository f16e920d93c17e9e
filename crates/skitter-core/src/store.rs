use std::future::Future;

use crate::error::AppError;
use crate::task::Task;

/// Durable store for task, seed, and discovered-URL records.
///
/// All writes must be durable before the call returns — no async
/// write-back. Implementations are externally synchronized services; the
/// core performs no in-process locking around them.
pub trait TaskStore: Send + Sync + Clone {
    /// Insert a new task with the store's default state (`Stopped`).
    /// The store assigns the id.
    fn create_task(
        &self,
        name: &str,
        url: &str,
        priority: i32,
    ) -> impl Future<Output = Result<Task, AppError>> + Send;

    /// Idempotent upsert by id.
    fn save_task(&self, task: &Task) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Load a task by id. Missing tasks are `None`, not an error.
    fn load_task(&self, id: i64) -> impl Future<Output = Result<Option<Task>, AppError>> + Send;

    /// Record the seed URL a task was created from. Write-once:
    /// fails with [`AppError::ConstraintViolation`] if the URL already
    /// has a seed row.
    fn create_seed(&self, url: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Durably record a discovered URL. Idempotent — recording a URL
    /// that already exists is a no-op, not an error.
    fn record_url(&self, url: &str) -> impl Future<Output = Result<(), AppError>> + Send;
}
