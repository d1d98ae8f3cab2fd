//! Run notifications.
//!
//! After every task run the runner hands a [`TaskReport`] to a [`Notifier`].
//! Delivery is best-effort: implementations log their own failures and never
//! return them, so a broken chat channel can't change or hide a run's outcome.

pub mod message;
pub mod noop;
pub mod slack;

use async_trait::async_trait;

use sabana_common::types::TaskReport;

pub use noop::NoopNotifier;
pub use slack::SlackWebhookNotifier;

/// Receives exactly one report per task run.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver the report. Must not panic and must not propagate delivery errors.
    async fn notify(&self, report: &TaskReport);
}
