pub mod crawl;
pub mod error;
pub mod queue;
pub mod scheduler;
pub mod store;
pub mod task;
pub mod testutil;
pub mod traits;
pub mod worker;

pub use crawl::CrawlService;
pub use error::AppError;
pub use queue::{DedupTracker, VisitedEntry, WorkQueue};
pub use scheduler::Scheduler;
pub use store::TaskStore;
pub use task::{ScheduleRequest, Task, TaskState, WorkerConfig};
pub use traits::{FetchedPage, Fetcher};
pub use worker::{TracingWorkerReporter, WorkerReporter, WorkerService};
