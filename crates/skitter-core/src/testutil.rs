//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::queue::{DedupTracker, VisitedEntry, WorkQueue};
use crate::store::TaskStore;
use crate::task::{Task, TaskState};
use crate::traits::{FetchedPage, Fetcher};

/// Build a task in the given state for assertions.
pub fn make_task(id: i64, state: TaskState) -> Task {
    Task {
        id,
        name: format!("task-{id}"),
        url: format!("http://example.com/{id}"),
        state,
        priority: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher recording every requested URL.
#[derive(Clone)]
pub struct MockFetcher {
    /// Queue of responses. Each call pops the first element; when empty,
    /// an empty page is returned.
    responses: Arc<Mutex<Vec<Result<FetchedPage, AppError>>>>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    /// Fetcher that always succeeds with an empty page.
    pub fn ok() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_page(page: FetchedPage) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Ok(page)])),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Err(error)])),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, AppError> {
        self.calls.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(FetchedPage::default())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockTaskStore
// ---------------------------------------------------------------------------

/// Mock durable store backed by in-memory collections.
#[derive(Clone)]
pub struct MockTaskStore {
    pub tasks: Arc<Mutex<Vec<Task>>>,
    pub seeds: Arc<Mutex<HashSet<String>>>,
    pub urls: Arc<Mutex<HashSet<String>>>,
    next_id: Arc<Mutex<i64>>,
    load_error: Arc<Mutex<Option<AppError>>>,
}

impl MockTaskStore {
    pub fn empty() -> Self {
        Self {
            tasks: Arc::new(Mutex::new(Vec::new())),
            seeds: Arc::new(Mutex::new(HashSet::new())),
            urls: Arc::new(Mutex::new(HashSet::new())),
            next_id: Arc::new(Mutex::new(1)),
            load_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Store whose next `load_task` call fails.
    pub fn with_load_error(error: AppError) -> Self {
        let store = Self::empty();
        *store.load_error.lock().unwrap() = Some(error);
        store
    }

    /// Insert a task row directly, bypassing id assignment.
    pub fn insert_task(&self, task: Task) -> Task {
        self.tasks.lock().unwrap().push(task.clone());
        task
    }
}

impl TaskStore for MockTaskStore {
    async fn create_task(&self, name: &str, url: &str, priority: i32) -> Result<Task, AppError> {
        let mut next_id = self.next_id.lock().unwrap();
        let task = Task {
            id: *next_id,
            name: name.to_string(),
            url: url.to_string(),
            state: TaskState::Stopped,
            priority,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        *next_id += 1;
        self.tasks.lock().unwrap().push(task.clone());
        Ok(task)
    }

    async fn save_task(&self, task: &Task) -> Result<(), AppError> {
        let mut tasks = self.tasks.lock().unwrap();
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task.clone(),
            None => tasks.push(task.clone()),
        }
        Ok(())
    }

    async fn load_task(&self, id: i64) -> Result<Option<Task>, AppError> {
        let mut err = self.load_error.lock().unwrap();
        if let Some(e) = err.take() {
            return Err(e);
        }
        Ok(self.tasks.lock().unwrap().iter().find(|t| t.id == id).cloned())
    }

    async fn create_seed(&self, url: &str) -> Result<(), AppError> {
        let mut seeds = self.seeds.lock().unwrap();
        if !seeds.insert(url.to_string()) {
            return Err(AppError::ConstraintViolation(format!(
                "seed URL already exists: {url}"
            )));
        }
        Ok(())
    }

    async fn record_url(&self, url: &str) -> Result<(), AppError> {
        self.urls.lock().unwrap().insert(url.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockQueue
// ---------------------------------------------------------------------------

/// Mock queue/set service. Implements both [`WorkQueue`] and
/// [`DedupTracker`], mirroring the single external service that backs
/// both in production.
#[derive(Clone)]
pub struct MockQueue {
    pub ready: Arc<Mutex<VecDeque<String>>>,
    pub worker: Arc<Mutex<VecDeque<i64>>>,
    pub discovered: Arc<Mutex<HashSet<String>>>,
    pub visited: Arc<Mutex<Vec<(String, DateTime<Utc>)>>>,
    pub claim_calls: Arc<Mutex<u32>>,
    claim_error: Arc<Mutex<Option<AppError>>>,
}

impl MockQueue {
    pub fn empty() -> Self {
        Self {
            ready: Arc::new(Mutex::new(VecDeque::new())),
            worker: Arc::new(Mutex::new(VecDeque::new())),
            discovered: Arc::new(Mutex::new(HashSet::new())),
            visited: Arc::new(Mutex::new(Vec::new())),
            claim_calls: Arc::new(Mutex::new(0)),
            claim_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Queue whose next `claim_worker_rotate` call fails.
    pub fn with_claim_error(error: AppError) -> Self {
        let queue = Self::empty();
        *queue.claim_error.lock().unwrap() = Some(error);
        queue
    }
}

impl WorkQueue for MockQueue {
    async fn push_ready(&self, payload: &str) -> Result<(), AppError> {
        self.ready.lock().unwrap().push_back(payload.to_string());
        Ok(())
    }

    async fn pop_ready(&self) -> Result<Option<String>, AppError> {
        Ok(self.ready.lock().unwrap().pop_front())
    }

    async fn push_worker(&self, task_id: i64) -> Result<(), AppError> {
        self.worker.lock().unwrap().push_back(task_id);
        Ok(())
    }

    async fn claim_worker_rotate(&self) -> Result<Option<i64>, AppError> {
        *self.claim_calls.lock().unwrap() += 1;
        let mut err = self.claim_error.lock().unwrap();
        if let Some(e) = err.take() {
            return Err(e);
        }
        let mut worker = self.worker.lock().unwrap();
        match worker.pop_front() {
            Some(id) => {
                worker.push_back(id);
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }
}

impl DedupTracker for MockQueue {
    async fn mark_discovered(&self, url: &str) -> Result<(), AppError> {
        self.discovered.lock().unwrap().insert(url.to_string());
        Ok(())
    }

    async fn is_discovered(&self, url: &str) -> Result<bool, AppError> {
        Ok(self.discovered.lock().unwrap().contains(url))
    }

    async fn mark_visited(&self, url: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        let mut visited = self.visited.lock().unwrap();
        match visited.iter_mut().find(|(u, _)| u == url) {
            Some(entry) => entry.1 = at,
            None => visited.push((url.to_string(), at)),
        }
        Ok(())
    }

    async fn visited_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<VisitedEntry>, AppError> {
        let mut entries: Vec<VisitedEntry> = self
            .visited
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, at)| *at >= from && *at <= to)
            .map(|(url, at)| VisitedEntry {
                url: url.clone(),
                visited_at: *at,
            })
            .collect();
        entries.sort_by_key(|e| e.visited_at);
        Ok(entries)
    }
}
