use chrono::{DateTime, Utc};

use crate::schedule::CronSchedule;
use crate::task::TaskRunner;

/// Fires the task on its cron schedule, one run at a time.
///
/// The next slot is always computed from the current time once the previous
/// run has finished, so slots missed while a run was in progress (or while the
/// process was down) are skipped rather than caught up.
pub struct Scheduler {
    schedule: CronSchedule,
    start_date: DateTime<Utc>,
    runner: TaskRunner,
}

impl Scheduler {
    pub fn new(schedule: CronSchedule, start_date: DateTime<Utc>, runner: TaskRunner) -> Self {
        Self {
            schedule,
            start_date,
            runner,
        }
    }

    /// Next slot after `now`, never earlier than the start date and never at
    /// or before `last_slot`, even if the wall clock stepped backwards.
    pub fn next_slot(
        &self,
        now: DateTime<Utc>,
        last_slot: Option<DateTime<Utc>>,
    ) -> Option<DateTime<Utc>> {
        let now = last_slot.map_or(now, |last| now.max(last));
        if now < self.start_date {
            // A slot exactly at the start date is allowed
            let just_before = self.start_date - chrono::Duration::seconds(1);
            return self.schedule.next_after(just_before);
        }
        self.schedule.next_after(now)
    }

    /// Start the scheduling loop. Runs indefinitely until the task is cancelled.
    pub async fn run(&self) -> anyhow::Result<()> {
        tracing::info!(
            schedule = %self.schedule,
            start_date = %self.start_date,
            "Scheduler started"
        );

        let mut last_slot = None;

        loop {
            let now = Utc::now();
            let slot = self.next_slot(now, last_slot).ok_or_else(|| {
                anyhow::anyhow!("schedule '{}' never fires again", self.schedule)
            })?;

            let wait = (slot - now).to_std().unwrap_or_default();
            tracing::debug!(
                next_run = %slot,
                wait_secs = wait.as_secs(),
                "Waiting for next slot"
            );
            tokio::time::sleep(wait).await;

            let report = self.runner.run(slot).await;
            last_slot = Some(slot);
            tracing::info!(
                run_id = %report.context.run_id,
                state = %report.outcome.state(),
                "Run finished"
            );
        }
    }
}
