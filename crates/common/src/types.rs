use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Lifecycle of a single task invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskState {
    /// Whether the run has finished. Terminal states never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }

    /// Legal transitions: Pending → Running → {Succeeded, Failed}.
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Pending, TaskState::Running)
                | (TaskState::Running, TaskState::Succeeded)
                | (TaskState::Running, TaskState::Failed)
        )
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Pending => write!(f, "pending"),
            TaskState::Running => write!(f, "running"),
            TaskState::Succeeded => write!(f, "succeeded"),
            TaskState::Failed => write!(f, "failed"),
        }
    }
}

/// Metadata describing one task invocation. Read-only once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunContext {
    pub run_id: Uuid,
    pub dag_id: String,
    pub task_id: String,
    /// Scheduled fire time of this run
    pub logical_ts: DateTime<Utc>,
    /// Link to this run's logs, when a log base URL is configured
    pub log_url: Option<String>,
}

impl RunContext {
    pub fn new(
        dag_id: impl Into<String>,
        task_id: impl Into<String>,
        logical_ts: DateTime<Utc>,
        log_base_url: Option<&str>,
    ) -> Self {
        let dag_id = dag_id.into();
        let task_id = task_id.into();
        let log_url = log_base_url.and_then(|base| {
            let execution_date = format_ts(logical_ts);
            let params = [
                ("dag_id", dag_id.as_str()),
                ("task_id", task_id.as_str()),
                ("execution_date", execution_date.as_str()),
            ];
            match Url::parse_with_params(base.trim_end_matches('/'), &params) {
                Ok(url) => Some(url.to_string()),
                Err(e) => {
                    tracing::warn!(base, error = %e, "Invalid log base URL, omitting log link");
                    None
                }
            }
        });

        Self {
            run_id: Uuid::new_v4(),
            dag_id,
            task_id,
            logical_ts,
            log_url,
        }
    }

    /// Logical timestamp rendered as RFC 3339.
    pub fn ts(&self) -> String {
        format_ts(self.logical_ts)
    }
}

/// Result of the task body, before notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TaskOutcome {
    Succeeded { rows_affected: u64 },
    Failed { error: String },
}

impl TaskOutcome {
    pub fn state(&self) -> TaskState {
        match self {
            TaskOutcome::Succeeded { .. } => TaskState::Succeeded,
            TaskOutcome::Failed { .. } => TaskState::Failed,
        }
    }
}

/// Post-execution report handed to the notifier. One per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub context: RunContext,
    pub outcome: TaskOutcome,
    pub finished_at: DateTime<Utc>,
}

impl TaskReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Succeeded { .. })
    }
}

/// A row of the denormalized calculated-events table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CalculatedEvent {
    pub event_url: String,
    pub event_time: DateTime<Utc>,
    pub event_name: Option<String>,
    pub group_name: Option<String>,
    pub city_name: Option<String>,
    pub category_name: Option<String>,
    pub yes_rsvp_count: Option<i32>,
    pub rsvp_limit: Option<i32>,
    /// Read as `fill_rate_pct::float8`
    pub fill_rate_pct: Option<f64>,
    pub load_ts: DateTime<Utc>,
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, false)
}
