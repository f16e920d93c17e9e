//! Redis-backed implementation of the work queues and dedup sets.
//!
//! All four structures live in one Redis instance: two lists for the
//! ready and worker queues, a set for discovered URLs, and a sorted set
//! (scored by unix-millisecond timestamp) for visited URLs. Atomicity of
//! the rotate-claim comes from `RPOPLPUSH` being a single command.

use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use skitter_core::error::AppError;
use skitter_core::queue::{DedupTracker, VisitedEntry, WorkQueue};

use crate::config::QueueConfig;

/// Ready queue: serialized task snapshots awaiting promotion.
const READY_QUEUE_KEY: &str = "skitter:ready";
/// Worker queue: task ids cycling through the worker loop.
const WORKER_QUEUE_KEY: &str = "skitter:worker";
/// Discovered-URL dedup set.
const DISCOVERED_SET_KEY: &str = "skitter:discovered";
/// Visited URLs, scored by completion timestamp.
const VISITED_SET_KEY: &str = "skitter:visited";

/// Redis client handle for the queue/set service.
///
/// Cloning is cheap: the underlying `ConnectionManager` multiplexes one
/// connection and reconnects on failure. Constructed once at startup and
/// shared by the scheduler triggers and the worker loop.
#[derive(Clone)]
pub struct RedisQueue {
    conn: ConnectionManager,
}

impl RedisQueue {
    /// Connect to Redis. A failure here is fatal at startup; transient
    /// errors on individual commands are recoverable per call.
    pub async fn connect(config: &QueueConfig) -> Result<Self, AppError> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| AppError::QueueError(format!("Invalid Redis URL: {e}")))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::QueueError(format!("Failed to connect: {e}")))?;

        Ok(Self { conn })
    }

    /// Check queue service connectivity.
    pub async fn health_check(&self) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::QueueError(e.to_string()))?;
        Ok(())
    }
}

impl WorkQueue for RedisQueue {
    async fn push_ready(&self, payload: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(READY_QUEUE_KEY, payload)
            .await
            .map_err(|e| AppError::QueueError(e.to_string()))
    }

    async fn pop_ready(&self) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.clone();
        conn.rpop(READY_QUEUE_KEY, None)
            .await
            .map_err(|e| AppError::QueueError(e.to_string()))
    }

    async fn push_worker(&self, task_id: i64) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(WORKER_QUEUE_KEY, task_id)
            .await
            .map_err(|e| AppError::QueueError(e.to_string()))
    }

    async fn claim_worker_rotate(&self) -> Result<Option<i64>, AppError> {
        let mut conn = self.conn.clone();
        // Pop from the tail, push back onto the head, one command.
        conn.rpoplpush(WORKER_QUEUE_KEY, WORKER_QUEUE_KEY)
            .await
            .map_err(|e| AppError::QueueError(e.to_string()))
    }
}

impl DedupTracker for RedisQueue {
    async fn mark_discovered(&self, url: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(DISCOVERED_SET_KEY, url)
            .await
            .map_err(|e| AppError::QueueError(e.to_string()))
    }

    async fn is_discovered(&self, url: &str) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        conn.sismember(DISCOVERED_SET_KEY, url)
            .await
            .map_err(|e| AppError::QueueError(e.to_string()))
    }

    async fn mark_visited(&self, url: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.zadd::<_, _, _, ()>(VISITED_SET_KEY, url, at.timestamp_millis())
            .await
            .map_err(|e| AppError::QueueError(e.to_string()))
    }

    async fn visited_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<VisitedEntry>, AppError> {
        let mut conn = self.conn.clone();
        let raw: Vec<(String, i64)> = conn
            .zrangebyscore_withscores(
                VISITED_SET_KEY,
                from.timestamp_millis(),
                to.timestamp_millis(),
            )
            .await
            .map_err(|e| AppError::QueueError(e.to_string()))?;

        Ok(raw
            .into_iter()
            .filter_map(|(url, millis)| {
                DateTime::from_timestamp_millis(millis)
                    .map(|visited_at| VisitedEntry { url, visited_at })
            })
            .collect())
    }
}
