use skitter_core::AppError;

/// Configuration for the Redis queue/set service.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub url: String,
}

impl QueueConfig {
    /// Read configuration from environment variables.
    ///
    /// - `REDIS_URL` (required, e.g. "redis://localhost:6379")
    pub fn from_env() -> Result<Self, AppError> {
        let url = std::env::var("REDIS_URL").map_err(|_| {
            AppError::ConfigError("REDIS_URL not set. Required for the queue service.".into())
        })?;

        Ok(Self { url })
    }
}
