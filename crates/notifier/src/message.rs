//! Chat message text for run reports.
//!
//! Uses Slack `mrkdwn`: `*bold*`, `` `code` `` and `<url|label>` links.

use sabana_common::types::{RunContext, TaskOutcome, TaskReport};

/// Render the message for a finished run.
pub fn render(report: &TaskReport) -> String {
    match &report.outcome {
        TaskOutcome::Succeeded { .. } => success_text(&report.context),
        TaskOutcome::Failed { error } => failure_text(&report.context, error),
    }
}

pub fn failure_text(ctx: &RunContext, error: &str) -> String {
    let mut msg = format!(
        ":red_circle: *Airflow task failed*\n\
         *DAG:* `{}`\n\
         *Task:* `{}`\n\
         *When:* `{}`\n\
         *Error:* `{}`",
        ctx.dag_id,
        ctx.task_id,
        ctx.ts(),
        error
    );
    push_log_link(&mut msg, ctx);
    msg
}

pub fn success_text(ctx: &RunContext) -> String {
    let mut msg = format!(
        ":white_check_mark: *Airflow task succeeded*\n\
         *DAG:* `{}`\n\
         *Task:* `{}`\n\
         *When:* `{}`",
        ctx.dag_id,
        ctx.task_id,
        ctx.ts()
    );
    push_log_link(&mut msg, ctx);
    msg
}

fn push_log_link(msg: &mut String, ctx: &RunContext) {
    if let Some(url) = &ctx.log_url {
        msg.push_str(&format!("\n<{}|Ver logs>", url));
    }
}
