use tokio_util::sync::CancellationToken;

use crate::crawl::CrawlService;
use crate::error::AppError;
use crate::queue::{DedupTracker, WorkQueue};
use crate::store::TaskStore;
use crate::task::{TaskState, WorkerConfig};
use crate::traits::Fetcher;

/// Events emitted by the worker for monitoring/logging.
#[derive(Debug, Clone)]
pub enum WorkerEvent<'a> {
    Started {
        worker_id: &'a str,
    },
    Polling,
    Claimed {
        task_id: i64,
    },
    /// The claimed id has no task row. The id stays in the worker queue
    /// (it was rotated to the tail before the load), so a later
    /// iteration will see it again.
    TaskMissing {
        task_id: i64,
    },
    /// The freshly loaded state is not `Running`; the iteration ends
    /// with no side effects.
    Skipped {
        task_id: i64,
        state: TaskState,
    },
    CrawlStarted {
        task_id: i64,
        url: &'a str,
    },
    CrawlCompleted {
        task_id: i64,
        links_found: usize,
    },
    CrawlFailed {
        task_id: i64,
        error: &'a str,
    },
    Stopped {
        worker_id: &'a str,
    },
}

/// Trait for receiving worker events (decoupled logging).
pub trait WorkerReporter: Send + Sync {
    fn report(&self, event: WorkerEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWorkerReporter;

impl WorkerReporter for TracingWorkerReporter {
    fn report(&self, event: WorkerEvent<'_>) {
        match event {
            WorkerEvent::Started { worker_id } => {
                tracing::info!(%worker_id, "Worker started");
            }
            WorkerEvent::Polling => {
                tracing::debug!("Polling worker queue");
            }
            WorkerEvent::Claimed { task_id } => {
                tracing::debug!(task_id, "Claimed task id");
            }
            WorkerEvent::TaskMissing { task_id } => {
                tracing::warn!(task_id, "Claimed id has no task row");
            }
            WorkerEvent::Skipped { task_id, state } => {
                tracing::debug!(task_id, %state, "Task not running, skipped");
            }
            WorkerEvent::CrawlStarted { task_id, url } => {
                tracing::info!(task_id, %url, "Crawl started");
            }
            WorkerEvent::CrawlCompleted {
                task_id,
                links_found,
            } => {
                tracing::info!(task_id, links_found, "Crawl completed");
            }
            WorkerEvent::CrawlFailed { task_id, error } => {
                tracing::warn!(task_id, %error, "Crawl failed");
            }
            WorkerEvent::Stopped { worker_id } => {
                tracing::info!(%worker_id, "Worker stopped");
            }
        }
    }
}

/// Outcome of a single worker iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polled {
    /// Worker queue was empty.
    Empty,
    /// Claimed id had no task row in the store.
    Missing,
    /// Task state was not `Running`; nothing executed.
    Skipped,
    /// Crawl step ran to completion.
    Crawled,
    /// Crawl step ran and failed; the failure was reported, the id
    /// keeps cycling.
    Failed,
}

/// The single long-running consumption loop.
///
/// Claims one id at a time from the worker queue (rotate-to-tail, so a
/// claimed id survives any later failure in the iteration), re-loads the
/// task from the durable store, and executes the crawl step only when
/// the freshly loaded state is `Running`. Sequential by design: one task
/// at a time, no parallel workers.
pub struct WorkerService<Q, S, F, D>
where
    Q: WorkQueue,
    S: TaskStore,
    F: Fetcher,
    D: DedupTracker,
{
    queue: Q,
    store: S,
    crawler: CrawlService<F, D, S>,
    config: WorkerConfig,
}

impl<Q, S, F, D> WorkerService<Q, S, F, D>
where
    Q: WorkQueue,
    S: TaskStore,
    F: Fetcher,
    D: DedupTracker,
{
    pub fn new(queue: Q, store: S, crawler: CrawlService<F, D, S>, config: WorkerConfig) -> Self {
        Self {
            queue,
            store,
            crawler,
            config,
        }
    }

    /// Run the worker loop until cancellation.
    ///
    /// Every iteration that does not execute a crawl — empty queue,
    /// skipped task, missing row, claim or load error — sleeps the fixed
    /// backoff before the next claim, so a queue holding only
    /// non-runnable ids cycles at the poll interval instead of
    /// busy-spinning. Errors are logged and never terminate the loop.
    pub async fn run<WR: WorkerReporter>(
        &self,
        cancel_token: CancellationToken,
        reporter: &WR,
    ) -> Result<(), AppError> {
        reporter.report(WorkerEvent::Started {
            worker_id: &self.config.worker_id,
        });

        loop {
            if cancel_token.is_cancelled() {
                break;
            }

            let backoff = match self.poll_once(reporter).await {
                Ok(Polled::Crawled) => false,
                Ok(_) => true,
                Err(e) => {
                    tracing::error!(error = %e, "Worker iteration failed");
                    true
                }
            };

            if backoff {
                tokio::select! {
                    () = tokio::time::sleep(self.config.backoff) => {}
                    () = cancel_token.cancelled() => break,
                }
            }
        }

        reporter.report(WorkerEvent::Stopped {
            worker_id: &self.config.worker_id,
        });

        Ok(())
    }

    /// One iteration: claim → load → state gate → crawl.
    ///
    /// The rotate happens before the load, so the id is preserved in the
    /// queue regardless of the load outcome. Claim and load errors
    /// propagate; crawl failures are absorbed and reported.
    pub async fn poll_once<WR: WorkerReporter>(
        &self,
        reporter: &WR,
    ) -> Result<Polled, AppError> {
        reporter.report(WorkerEvent::Polling);

        let Some(task_id) = self.queue.claim_worker_rotate().await? else {
            return Ok(Polled::Empty);
        };
        reporter.report(WorkerEvent::Claimed { task_id });

        let Some(task) = self.store.load_task(task_id).await? else {
            reporter.report(WorkerEvent::TaskMissing { task_id });
            return Ok(Polled::Missing);
        };

        if !task.state.is_runnable() {
            reporter.report(WorkerEvent::Skipped {
                task_id,
                state: task.state,
            });
            return Ok(Polled::Skipped);
        }

        reporter.report(WorkerEvent::CrawlStarted {
            task_id,
            url: &task.url,
        });

        match self.crawler.crawl(&task.url).await {
            Ok(page) => {
                reporter.report(WorkerEvent::CrawlCompleted {
                    task_id,
                    links_found: page.links.len(),
                });
                Ok(Polled::Crawled)
            }
            Err(e) => {
                let error = e.to_string();
                reporter.report(WorkerEvent::CrawlFailed {
                    task_id,
                    error: &error,
                });
                Ok(Polled::Failed)
            }
        }
    }
}
