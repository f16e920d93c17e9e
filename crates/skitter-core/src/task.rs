use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Execution state of a crawl task.
///
/// Transitions happen only through explicit control calls
/// (start/pause/stop); the worker loop re-reads the current state before
/// every execution and never trusts a queued copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Stopped,
    Running,
    Paused,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Stopped => "stopped",
            TaskState::Running => "running",
            TaskState::Paused => "paused",
        }
    }

    /// Only `Running` tasks are executed by the worker loop.
    pub fn is_runnable(&self) -> bool {
        matches!(self, TaskState::Running)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stopped" => Ok(TaskState::Stopped),
            "running" => Ok(TaskState::Running),
            "paused" => Ok(TaskState::Paused),
            _ => Err(format!("Unknown task state: {}", s)),
        }
    }
}

/// A recurring crawl task tied to one seed URL.
///
/// The id is assigned by the durable store on creation. Serialized
/// snapshots of this struct are what flows through the ready queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub state: TaskState,
    /// Accepted at scheduling time and persisted, but not consulted by
    /// promotion or claim ordering.
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to schedule a new recurring crawl task.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub name: String,
    pub url: String,
    pub priority: i32,
    pub interval: Duration,
}

impl ScheduleRequest {
    pub fn new(name: impl Into<String>, url: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            priority: 0,
            interval,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Configuration for the worker loop.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub worker_id: String,
    /// Fixed sleep on an empty worker queue or a transient claim error.
    /// This is the sole backpressure mechanism; there is no exponential
    /// backoff or jitter.
    pub backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: format!("worker-{}", &Uuid::new_v4().to_string()[..8]),
            backoff: Duration::from_secs(1),
        }
    }
}

impl WorkerConfig {
    pub fn with_worker_id(mut self, id: impl Into<String>) -> Self {
        self.worker_id = id.into();
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}
