use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::queue::WorkQueue;
use crate::store::TaskStore;
use crate::task::{ScheduleRequest, Task, TaskState};

/// One promotion tick: pop a snapshot from the ready queue, deserialize
/// it, and push the task id onto the worker queue.
///
/// Returns the promoted id, or `None` when the ready queue was empty.
/// A payload that fails to deserialize is dropped — it was already
/// popped — and surfaces as an error for the caller to log.
pub async fn promote_one<Q: WorkQueue>(queue: &Q) -> Result<Option<i64>, AppError> {
    let Some(payload) = queue.pop_ready().await? else {
        return Ok(None);
    };
    let task: Task = serde_json::from_str(&payload)?;
    queue.push_worker(task.id).await?;
    Ok(Some(task.id))
}

/// Schedules recurring crawl tasks and owns their periodic triggers.
///
/// Store and queue clients are injected at construction and held for the
/// scheduler's lifetime; triggers are independent spawned tasks that keep
/// firing until [`shutdown`](Self::shutdown). Pausing a task's execution
/// is handled by the state gate in the worker loop, not by disarming its
/// trigger.
pub struct Scheduler<S, Q>
where
    S: TaskStore,
    Q: WorkQueue + 'static,
{
    store: S,
    queue: Q,
    cancel: CancellationToken,
}

impl<S, Q> Scheduler<S, Q>
where
    S: TaskStore,
    Q: WorkQueue + 'static,
{
    pub fn new(store: S, queue: Q) -> Self {
        Self {
            store,
            queue,
            cancel: CancellationToken::new(),
        }
    }

    /// Create a new recurring crawl task: write the seed and the task
    /// (state `Stopped`) to the durable store, then arm a repeating
    /// trigger that promotes one ready-queue entry per interval.
    ///
    /// A duplicate seed URL fails with [`AppError::ConstraintViolation`]
    /// before any task row is written; the caller decides what to do,
    /// there is no retry.
    pub async fn schedule(&self, request: ScheduleRequest) -> Result<Task, AppError> {
        // A zero period would panic inside the spawned trigger's timer.
        if request.interval.is_zero() {
            return Err(AppError::ConfigError(
                "schedule interval must be at least one second".into(),
            ));
        }

        self.store.create_seed(&request.url).await?;
        let task = self
            .store
            .create_task(&request.name, &request.url, request.priority)
            .await?;

        self.register(request.interval);

        tracing::info!(
            task_id = task.id,
            name = %task.name,
            url = %task.url,
            interval_secs = request.interval.as_secs(),
            "Task scheduled"
        );
        Ok(task)
    }

    /// Serialize a task snapshot onto the ready queue, where it waits
    /// for the next promotion tick.
    pub async fn enqueue(&self, task: &Task) -> Result<(), AppError> {
        let payload = serde_json::to_string(task)?;
        self.queue.push_ready(&payload).await
    }

    /// Persist state `Running`. Already-queued worker entries are not
    /// touched; the state takes effect at the worker's next claim.
    pub async fn start_task(&self, id: i64) -> Result<Task, AppError> {
        self.set_state(id, TaskState::Running).await
    }

    /// Persist state `Paused`.
    pub async fn pause_task(&self, id: i64) -> Result<Task, AppError> {
        self.set_state(id, TaskState::Paused).await
    }

    /// Persist state `Stopped`.
    pub async fn stop_task(&self, id: i64) -> Result<Task, AppError> {
        self.set_state(id, TaskState::Stopped).await
    }

    /// Disarm all triggers owned by this scheduler.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    async fn set_state(&self, id: i64, state: TaskState) -> Result<Task, AppError> {
        let mut task = self
            .store
            .load_task(id)
            .await?
            .ok_or(AppError::TaskNotFound(id))?;
        task.state = state;
        task.updated_at = Utc::now();
        self.store.save_task(&task).await?;
        tracing::info!(task_id = id, %state, "Task state changed");
        Ok(task)
    }

    /// Arm a repeating promotion trigger. The first fire comes after one
    /// full interval, not immediately. A failed or empty tick is logged
    /// and skipped; the timer itself never aborts. Armed from
    /// registration until [`shutdown`](Self::shutdown); there is no
    /// paused trigger state — pausing is the worker's state gate.
    pub fn register(&self, period: Duration) {
        let queue = self.queue.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => match promote_one(&queue).await {
                        Ok(Some(task_id)) => {
                            tracing::debug!(task_id, "Promoted task to worker queue");
                        }
                        Ok(None) => {
                            tracing::debug!("Ready queue empty, skipping tick");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Promotion tick failed");
                        }
                    },
                }
            }
        });
    }
}
