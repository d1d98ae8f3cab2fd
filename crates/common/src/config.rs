use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::AppError;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Name of the pipeline as it appears in notifications
    pub dag_id: String,

    /// Name of the merge task as it appears in notifications
    pub task_id: String,

    /// 5-field cron expression (default: every 15 minutes)
    pub schedule_cron: String,

    /// No run is scheduled before this instant
    pub start_date: DateTime<Utc>,

    /// Logical name of the warehouse connection
    pub merge_conn_id: String,

    /// Logical name of the chat webhook connection
    pub notify_conn_id: String,

    /// Base URL used to build per-run log links
    pub log_base_url: Option<String>,

    /// Maximum number of PostgreSQL connections in the pool (default: 5)
    pub db_max_connections: u32,

    /// Webhook request timeout in seconds (default: 10)
    pub notify_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let start_date = std::env::var("START_DATE")
            .unwrap_or_else(|_| "2025-01-01T00:00:00Z".to_string());

        Ok(Self {
            dag_id: std::env::var("DAG_ID")
                .unwrap_or_else(|_| "sbn_calculated_events_15min".to_string()),
            task_id: std::env::var("TASK_ID").unwrap_or_else(|_| "merge_sabana".to_string()),
            schedule_cron: std::env::var("SCHEDULE_CRON")
                .unwrap_or_else(|_| "*/15 * * * *".to_string()),
            start_date: DateTime::parse_from_rfc3339(&start_date)
                .map_err(|_| anyhow::anyhow!("START_DATE must be an RFC 3339 timestamp"))?
                .with_timezone(&Utc),
            merge_conn_id: std::env::var("MERGE_CONN_ID")
                .unwrap_or_else(|_| "cnn_events_rappipay".to_string()),
            notify_conn_id: std::env::var("NOTIFY_CONN_ID")
                .unwrap_or_else(|_| "slack_notification_events".to_string()),
            log_base_url: std::env::var("LOG_BASE_URL").ok(),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            notify_timeout_secs: std::env::var("NOTIFY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("NOTIFY_TIMEOUT_SECS must be a valid u64"))?,
        })
    }

    /// Resolve the warehouse connection URL.
    ///
    /// Looks up `CONN_<MERGE_CONN_ID>` first and falls back to `DATABASE_URL`.
    pub fn database_url(&self) -> Result<String, AppError> {
        resolve_connection(&self.merge_conn_id)
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .ok_or_else(|| {
                AppError::Config(format!(
                    "no URL for connection '{}': set {} or DATABASE_URL",
                    self.merge_conn_id,
                    connection_env_var(&self.merge_conn_id)
                ))
            })
    }

    /// Resolve the chat webhook URL, if one is configured.
    pub fn webhook_url(&self) -> Option<String> {
        resolve_connection(&self.notify_conn_id)
    }
}

/// Environment variable that holds the URL for a logical connection id.
///
/// `cnn_events_rappipay` → `CONN_CNN_EVENTS_RAPPIPAY`
pub fn connection_env_var(conn_id: &str) -> String {
    let normalized: String = conn_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("CONN_{}", normalized)
}

/// Resolve a logical connection id to its URL. Empty values count as unset.
pub fn resolve_connection(conn_id: &str) -> Option<String> {
    std::env::var(connection_env_var(conn_id))
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
