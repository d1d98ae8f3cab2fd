//! One invocation of the merge task.
//!
//! Each run walks Pending → Running → {Succeeded, Failed} and then hands its
//! report to the notifier exactly once. There are no retries: a failed run
//! stays failed until the next scheduled slot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::Instrument;

use sabana_common::error::AppError;
use sabana_common::types::{RunContext, TaskOutcome, TaskReport, TaskState};
use sabana_merge::MergeJob;
use sabana_notifier::Notifier;

/// Identity of the task as reported in notifications and logs.
#[derive(Debug, Clone)]
pub struct TaskIdentity {
    pub dag_id: String,
    pub task_id: String,
    pub log_base_url: Option<String>,
}

/// Executes the merge job and reports the outcome.
pub struct TaskRunner {
    identity: TaskIdentity,
    job: Arc<dyn MergeJob>,
    notifier: Arc<dyn Notifier>,
}

impl TaskRunner {
    pub fn new(
        identity: TaskIdentity,
        job: Arc<dyn MergeJob>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            identity,
            job,
            notifier,
        }
    }

    /// Run the task for the slot `logical_ts` and notify the outcome.
    pub async fn run(&self, logical_ts: DateTime<Utc>) -> TaskReport {
        let context = RunContext::new(
            self.identity.dag_id.clone(),
            self.identity.task_id.clone(),
            logical_ts,
            self.identity.log_base_url.as_deref(),
        );

        let span = tracing::info_span!(
            "task_run",
            run_id = %context.run_id,
            dag_id = %context.dag_id,
            task_id = %context.task_id,
            logical_ts = %context.ts(),
        );

        self.run_in_context(context).instrument(span).await
    }

    async fn run_in_context(&self, context: RunContext) -> TaskReport {
        let mut state = TaskState::Pending;
        transition(&mut state, TaskState::Running);

        let outcome = self.execute_job().await;
        transition(&mut state, outcome.state());

        match &outcome {
            TaskOutcome::Succeeded { rows_affected } => {
                tracing::info!(rows_affected, "Task succeeded");
            }
            TaskOutcome::Failed { error } => {
                tracing::error!(error = %error, "Task failed");
            }
        }

        let report = TaskReport {
            context,
            outcome,
            finished_at: Utc::now(),
        };

        self.notifier.notify(&report).await;
        report
    }

    /// Run the job on its own tokio task so a panic fails the run instead of
    /// skipping the notification.
    async fn execute_job(&self) -> TaskOutcome {
        let job = Arc::clone(&self.job);
        let handle = tokio::spawn(async move { job.execute().await }.in_current_span());

        match handle.await {
            Ok(Ok(rows_affected)) => TaskOutcome::Succeeded { rows_affected },
            Ok(Err(e)) => TaskOutcome::Failed {
                error: e.to_string(),
            },
            Err(join_err) => TaskOutcome::Failed {
                error: AppError::Internal(format!("merge job aborted: {join_err}")).to_string(),
            },
        }
    }
}

fn transition(state: &mut TaskState, next: TaskState) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal task transition {state} -> {next}"
    );
    tracing::debug!(from = %state, to = %next, "Task state changed");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    enum Behavior {
        Succeed(u64),
        Fail(&'static str),
        Panic,
    }

    struct FakeJob(Behavior);

    #[async_trait]
    impl MergeJob for FakeJob {
        async fn execute(&self) -> Result<u64, AppError> {
            match self.0 {
                Behavior::Succeed(rows) => Ok(rows),
                Behavior::Fail(msg) => Err(AppError::Internal(msg.to_string())),
                Behavior::Panic => panic!("job exploded"),
            }
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        reports: Mutex<Vec<TaskReport>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, report: &TaskReport) {
            self.reports.lock().unwrap().push(report.clone());
        }
    }

    fn runner(behavior: Behavior) -> (TaskRunner, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let runner = TaskRunner::new(
            TaskIdentity {
                dag_id: "sbn_calculated_events_15min".to_string(),
                task_id: "merge_sabana".to_string(),
                log_base_url: Some("http://airflow/log".to_string()),
            },
            Arc::new(FakeJob(behavior)),
            notifier.clone(),
        );
        (runner, notifier)
    }

    fn slot() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 15, 0).unwrap()
    }

    #[tokio::test]
    async fn test_success_notifies_once() {
        let (runner, notifier) = runner(Behavior::Succeed(7));
        let report = runner.run(slot()).await;

        assert_eq!(report.outcome, TaskOutcome::Succeeded { rows_affected: 7 });
        assert_eq!(report.context.logical_ts, slot());
        assert_eq!(report.context.dag_id, "sbn_calculated_events_15min");
        assert!(report.context.log_url.is_some());

        let reports = notifier.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].is_success());
        assert_eq!(reports[0].context.run_id, report.context.run_id);
    }

    #[tokio::test]
    async fn test_failure_notifies_once_with_error() {
        let (runner, notifier) = runner(Behavior::Fail("relation does not exist"));
        let report = runner.run(slot()).await;

        assert_eq!(report.outcome.state(), TaskState::Failed);

        let reports = notifier.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        match &reports[0].outcome {
            TaskOutcome::Failed { error } => assert!(error.contains("relation does not exist")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_panicking_job_still_notifies_failure() {
        let (runner, notifier) = runner(Behavior::Panic);
        let report = runner.run(slot()).await;

        assert_eq!(report.outcome.state(), TaskState::Failed);
        assert_eq!(notifier.reports.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_each_run_gets_its_own_context() {
        let (runner, notifier) = runner(Behavior::Succeed(0));
        let first = runner.run(slot()).await;
        let second = runner.run(slot() + chrono::Duration::minutes(15)).await;

        assert_ne!(first.context.run_id, second.context.run_id);
        assert_eq!(notifier.reports.lock().unwrap().len(), 2);
    }
}
