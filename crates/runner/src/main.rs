use std::sync::Arc;
use std::time::Duration;

use sabana_common::config::AppConfig;
use sabana_common::db;
use sabana_merge::SqlMergeJob;
use sabana_notifier::{NoopNotifier, Notifier, SlackWebhookNotifier};
use sabana_runner::schedule::CronSchedule;
use sabana_runner::scheduler::Scheduler;
use sabana_runner::task::{TaskIdentity, TaskRunner};

const DAG_TAGS: &[&str] = &["gold", "sabana", "merge", "notifications"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sabana_runner=info,sabana_merge=info,sabana_notifier=info".into()
            }),
        )
        .json()
        .init();

    tracing::info!("Sabana calculated-events runner starting...");

    // Load configuration
    let config = AppConfig::from_env()?;
    let schedule: CronSchedule = config.schedule_cron.parse()?;

    // Connect to the warehouse
    let database_url = config.database_url()?;
    let pool =
        db::create_pool(&config.merge_conn_id, &database_url, config.db_max_connections).await?;

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let notifier: Arc<dyn Notifier> = match config.webhook_url() {
        Some(url) => Arc::new(SlackWebhookNotifier::new(
            url,
            Duration::from_secs(config.notify_timeout_secs),
        )?),
        None => {
            tracing::warn!(
                conn_id = %config.notify_conn_id,
                "No webhook configured, run notifications are disabled"
            );
            Arc::new(NoopNotifier)
        }
    };

    let runner = TaskRunner::new(
        TaskIdentity {
            dag_id: config.dag_id.clone(),
            task_id: config.task_id.clone(),
            log_base_url: config.log_base_url.clone(),
        },
        Arc::new(SqlMergeJob::new(pool)),
        notifier,
    );

    tracing::info!(
        dag_id = %config.dag_id,
        task_id = %config.task_id,
        conn_id = %config.merge_conn_id,
        schedule = %schedule,
        catchup = false,
        tags = ?DAG_TAGS,
        "DAG loaded"
    );

    let scheduler = Scheduler::new(schedule, config.start_date, runner);

    // Run with graceful shutdown on Ctrl+C
    tokio::select! {
        result = scheduler.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Scheduler exited with error");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
    }

    tracing::info!("Sabana calculated-events runner stopped.");
    Ok(())
}
