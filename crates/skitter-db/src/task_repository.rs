use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};

use skitter_core::error::AppError;
use skitter_core::store::TaskStore;
use skitter_core::task::{Task, TaskState};

/// PostgreSQL-backed durable store for tasks, seeds, and URL records.
#[derive(Clone)]
pub struct TaskRepository {
    pool: Pool<Postgres>,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List tasks, newest first.
    pub async fn list_tasks(&self, limit: usize) -> Result<Vec<Task>, AppError> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT * FROM tasks
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Find the most recently created task for a URL. Used at startup
    /// to resume a task whose seed already exists.
    pub async fn find_task_by_url(&self, url: &str) -> Result<Option<Task>, AppError> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT * FROM tasks
            WHERE url = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i64,
    name: String,
    url: String,
    state: String,
    priority: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            name: row.name,
            url: row.url,
            state: row.state.parse().unwrap_or(TaskState::Stopped),
            priority: row.priority,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl TaskStore for TaskRepository {
    async fn create_task(&self, name: &str, url: &str, priority: i32) -> Result<Task, AppError> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            INSERT INTO tasks (name, url, priority)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(url)
        .bind(priority)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.into())
    }

    async fn save_task(&self, task: &Task) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, name, url, state, priority, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                url = EXCLUDED.url,
                state = EXCLUDED.state,
                priority = EXCLUDED.priority,
                updated_at = NOW()
            "#,
        )
        .bind(task.id)
        .bind(&task.name)
        .bind(&task.url)
        .bind(task.state.as_str())
        .bind(task.priority)
        .bind(task.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn load_task(&self, id: i64) -> Result<Option<Task>, AppError> {
        let row = sqlx::query_as::<_, TaskRow>(r#"SELECT * FROM tasks WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    async fn create_seed(&self, url: &str) -> Result<(), AppError> {
        sqlx::query(r#"INSERT INTO seeds (url) VALUES ($1)"#)
            .bind(url)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::ConstraintViolation(format!("seed URL already exists: {url}"))
                }
                _ => AppError::DatabaseError(e.to_string()),
            })?;

        Ok(())
    }

    async fn record_url(&self, url: &str) -> Result<(), AppError> {
        sqlx::query(r#"INSERT INTO urls (url) VALUES ($1) ON CONFLICT (url) DO NOTHING"#)
            .bind(url)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
