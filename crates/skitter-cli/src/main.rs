use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use skitter_client::ReqwestFetcher;
use skitter_core::error::AppError;
use skitter_core::queue::DedupTracker;
use skitter_core::store::TaskStore;
use skitter_core::task::{ScheduleRequest, WorkerConfig};
use skitter_core::worker::TracingWorkerReporter;
use skitter_core::{CrawlService, Scheduler, WorkerService};
use skitter_db::{Database, DatabaseConfig, TaskRepository};
use skitter_queue::{QueueConfig, RedisQueue};

#[derive(Parser)]
#[command(name = "skitter", version, about = "Recurring crawl-task scheduler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler service: register a recurring task and enter
    /// the worker loop until interrupted
    Run {
        /// Task name
        #[arg(short, long, env = "SKITTER_TASK_NAME")]
        name: String,

        /// Seed URL to crawl
        #[arg(short, long, env = "SKITTER_TASK_URL")]
        url: String,

        /// Promotion interval in seconds (minimum 1)
        #[arg(
            short,
            long,
            env = "SKITTER_INTERVAL",
            default_value_t = 2,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        interval: u64,

        /// Task priority (stored, not used for ordering)
        #[arg(short, long, default_value_t = 0)]
        priority: i32,

        /// Mark the task Running immediately instead of leaving it
        /// Stopped
        #[arg(long, default_value_t = false)]
        start: bool,
    },

    /// Create a task without running the service
    Schedule {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        url: String,

        #[arg(short, long, default_value_t = 0)]
        priority: i32,
    },

    /// Mark a task Running
    Start { task_id: i64 },

    /// Mark a task Paused
    Pause { task_id: i64 },

    /// Mark a task Stopped
    Stop { task_id: i64 },

    /// Show a task
    Status { task_id: i64 },

    /// List tasks, newest first
    Tasks {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// List URLs visited in the last N hours
    Visited {
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("skitter=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            name,
            url,
            interval,
            priority,
            start,
        } => {
            cmd_run(&name, &url, Duration::from_secs(interval), priority, start).await?;
        }
        Commands::Schedule {
            name,
            url,
            priority,
        } => {
            // Durable writes only; the promotion trigger is armed by
            // `run`, which owns the process lifetime.
            let repo = connect_db().await?;
            repo.create_seed(&url).await?;
            let task = repo.create_task(&name, &url, priority).await?;
            println!("Scheduled task {} ({})", task.id, task.name);
        }
        Commands::Start { task_id } => {
            let task = control(task_id, TaskAction::Start).await?;
            println!("Task {} is now {}", task.id, task.state);
        }
        Commands::Pause { task_id } => {
            let task = control(task_id, TaskAction::Pause).await?;
            println!("Task {} is now {}", task.id, task.state);
        }
        Commands::Stop { task_id } => {
            let task = control(task_id, TaskAction::Stop).await?;
            println!("Task {} is now {}", task.id, task.state);
        }
        Commands::Status { task_id } => {
            let repo = connect_db().await?;
            let task = repo
                .load_task(task_id)
                .await?
                .with_context(|| format!("No task with id {task_id}"))?;
            println!(
                "[{}] {} — {} (state: {}, priority: {}, updated: {})",
                task.id,
                task.name,
                task.url,
                task.state,
                task.priority,
                task.updated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            );
        }
        Commands::Tasks { limit } => {
            let repo = connect_db().await?;
            let tasks = repo.list_tasks(limit).await?;
            if tasks.is_empty() {
                println!("No tasks scheduled");
            }
            for task in tasks {
                println!(
                    "[{}] {} — {} (state: {})",
                    task.id, task.name, task.url, task.state
                );
            }
        }
        Commands::Visited { hours } => {
            let queue = connect_queue().await?;
            let to = Utc::now();
            let from = to - chrono::Duration::hours(hours);
            let entries = queue.visited_between(from, to).await?;
            if entries.is_empty() {
                println!("No URLs visited in the last {hours}h");
            }
            for entry in entries {
                println!(
                    "{} — {}",
                    entry.visited_at.format("%Y-%m-%d %H:%M:%S UTC"),
                    entry.url
                );
            }
        }
    }

    Ok(())
}

enum TaskAction {
    Start,
    Pause,
    Stop,
}

/// The long-lived service: connect store and queue, register the task,
/// prime the ready queue with one snapshot, and consume until ctrl-c.
async fn cmd_run(
    name: &str,
    url: &str,
    interval: Duration,
    priority: i32,
    start: bool,
) -> Result<()> {
    let repo = connect_db().await?;
    let queue = connect_queue().await?;

    let scheduler = Scheduler::new(repo.clone(), queue.clone());

    let request = ScheduleRequest::new(name, url, interval).with_priority(priority);
    let task = match scheduler.schedule(request).await {
        Ok(task) => task,
        // Seed already exists from an earlier run: resume the existing
        // task and re-arm its trigger.
        Err(AppError::ConstraintViolation(_)) => {
            let existing = repo
                .find_task_by_url(url)
                .await?
                .with_context(|| format!("Seed exists but no task found for {url}"))?;
            tracing::info!(task_id = existing.id, %url, "Resuming existing task");
            scheduler.register(interval);
            existing
        }
        Err(e) => return Err(e.into()),
    };

    scheduler.enqueue(&task).await?;

    if start {
        scheduler.start_task(task.id).await?;
    }

    let crawler = CrawlService::new(ReqwestFetcher::new()?, queue.clone(), repo.clone());
    let worker = WorkerService::new(queue, repo, crawler, WorkerConfig::default());

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    worker.run(cancel, &TracingWorkerReporter).await?;
    scheduler.shutdown();

    Ok(())
}

async fn control(task_id: i64, action: TaskAction) -> Result<skitter_core::Task> {
    let repo = connect_db().await?;
    let queue = connect_queue().await?;
    let scheduler = Scheduler::new(repo, queue);
    let task = match action {
        TaskAction::Start => scheduler.start_task(task_id).await?,
        TaskAction::Pause => scheduler.pause_task(task_id).await?,
        TaskAction::Stop => scheduler.stop_task(task_id).await?,
    };
    scheduler.shutdown();
    Ok(task)
}

/// Connect to PostgreSQL using DATABASE_URL and run migrations.
async fn connect_db() -> Result<TaskRepository> {
    let config = DatabaseConfig::from_env()?;
    let db = Database::connect(&config)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await?;
    Ok(db.task_repo())
}

/// Connect to Redis using REDIS_URL.
async fn connect_queue() -> Result<RedisQueue> {
    let config = QueueConfig::from_env()?;
    let queue = RedisQueue::connect(&config)
        .await
        .context("Failed to connect to queue service")?;
    Ok(queue)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    tracing::info!("Shutdown signal received");
}
