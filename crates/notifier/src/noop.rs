use async_trait::async_trait;

use sabana_common::types::TaskReport;

use crate::Notifier;

/// Discards reports. Used when no webhook connection is configured.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, report: &TaskReport) {
        tracing::debug!(
            run_id = %report.context.run_id,
            state = %report.outcome.state(),
            "Notification skipped, no channel configured"
        );
    }
}
