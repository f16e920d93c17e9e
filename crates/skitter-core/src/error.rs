use thiserror::Error;

/// Application-wide error types for Skitter.
#[derive(Error, Debug)]
pub enum AppError {
    /// Durable store operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Queue/set service operation failed.
    #[error("Queue error: {0}")]
    QueueError(String),

    /// A uniqueness constraint was violated (e.g., duplicate seed URL).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// JSON serialization/deserialization failed (queue payloads).
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// No task exists with the given id.
    #[error("Task {0} not found")]
    TaskNotFound(i64),

    /// HTTP request failed (fetching a page).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_error_from_serde() {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let app: AppError = err.into();
        assert!(matches!(app, AppError::SerializationError(_)));
    }

    #[test]
    fn test_display_includes_context() {
        let err = AppError::TaskNotFound(42);
        assert_eq!(err.to_string(), "Task 42 not found");

        let err = AppError::ConstraintViolation("seeds.url".into());
        assert!(err.to_string().contains("seeds.url"));
    }
}
