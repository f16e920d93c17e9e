use skitter_core::error::AppError;
use skitter_core::store::TaskStore;
use skitter_core::task::TaskState;
use skitter_db::TaskRepository;

use crate::common::setup_test_db;

#[tokio::test]
async fn create_task_defaults_to_stopped() {
    let (pool, _container) = setup_test_db().await;
    let repo = TaskRepository::new(pool);

    let task = repo
        .create_task("docs", "http://example.com", 1)
        .await
        .unwrap();

    assert!(task.id > 0);
    assert_eq!(task.state, TaskState::Stopped);
    assert_eq!(task.priority, 1);
}

#[tokio::test]
async fn load_task_roundtrip() {
    let (pool, _container) = setup_test_db().await;
    let repo = TaskRepository::new(pool);

    let created = repo
        .create_task("docs", "http://example.com", 0)
        .await
        .unwrap();
    let loaded = repo.load_task(created.id).await.unwrap().unwrap();

    assert_eq!(loaded.id, created.id);
    assert_eq!(loaded.name, "docs");
    assert_eq!(loaded.url, "http://example.com");
}

#[tokio::test]
async fn load_missing_task_returns_none() {
    let (pool, _container) = setup_test_db().await;
    let repo = TaskRepository::new(pool);

    assert!(repo.load_task(999_999).await.unwrap().is_none());
}

#[tokio::test]
async fn save_task_persists_state_changes() {
    let (pool, _container) = setup_test_db().await;
    let repo = TaskRepository::new(pool);

    let mut task = repo
        .create_task("docs", "http://example.com", 0)
        .await
        .unwrap();

    for state in [TaskState::Running, TaskState::Paused, TaskState::Stopped] {
        task.state = state;
        repo.save_task(&task).await.unwrap();
        let loaded = repo.load_task(task.id).await.unwrap().unwrap();
        assert_eq!(loaded.state, state);
    }
}

#[tokio::test]
async fn save_task_is_idempotent() {
    let (pool, _container) = setup_test_db().await;
    let repo = TaskRepository::new(pool);

    let mut task = repo
        .create_task("docs", "http://example.com", 0)
        .await
        .unwrap();
    task.state = TaskState::Running;

    repo.save_task(&task).await.unwrap();
    repo.save_task(&task).await.unwrap();

    let tasks = repo.list_tasks(10).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].state, TaskState::Running);
}

#[tokio::test]
async fn duplicate_seed_url_is_a_constraint_violation() {
    let (pool, _container) = setup_test_db().await;
    let repo = TaskRepository::new(pool);

    repo.create_seed("http://x").await.unwrap();
    let err = repo.create_seed("http://x").await.unwrap_err();

    assert!(matches!(err, AppError::ConstraintViolation(_)));
}

#[tokio::test]
async fn schedule_writes_one_seed_and_one_stopped_task() {
    let (pool, _container) = setup_test_db().await;
    let repo = TaskRepository::new(pool.clone());

    // The scheduling entry point writes the seed first, then the task.
    repo.create_seed("http://x").await.unwrap();
    let task = repo.create_task("J", "http://x", 1).await.unwrap();

    let (seed_count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM seeds WHERE url = 'http://x'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(seed_count, 1);
    assert_eq!(task.state, TaskState::Stopped);

    // A second schedule of the same URL fails before a task is written.
    let err = repo.create_seed("http://x").await.unwrap_err();
    assert!(matches!(err, AppError::ConstraintViolation(_)));
}

#[tokio::test]
async fn record_url_is_idempotent() {
    let (pool, _container) = setup_test_db().await;
    let repo = TaskRepository::new(pool.clone());

    repo.record_url("http://example.com/a").await.unwrap();
    repo.record_url("http://example.com/a").await.unwrap();

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM urls")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn list_tasks_returns_newest_first() {
    let (pool, _container) = setup_test_db().await;
    let repo = TaskRepository::new(pool);

    let first = repo.create_task("a", "http://a", 0).await.unwrap();
    let second = repo.create_task("b", "http://b", 0).await.unwrap();

    let tasks = repo.list_tasks(10).await.unwrap();
    assert_eq!(tasks.len(), 2);
    // Same-timestamp creations can tie on created_at; ids break the tie.
    assert!(tasks.iter().any(|t| t.id == first.id));
    assert!(tasks.iter().any(|t| t.id == second.id));
}
