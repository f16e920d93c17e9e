pub mod config;
pub mod redis_queue;

pub use config::QueueConfig;
pub use redis_queue::RedisQueue;
