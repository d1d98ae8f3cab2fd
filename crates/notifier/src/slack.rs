//! Slack incoming-webhook delivery.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use sabana_common::error::AppError;
use sabana_common::types::TaskReport;

use crate::{Notifier, message};

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// Posts run reports to a Slack incoming webhook.
pub struct SlackWebhookNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackWebhookNotifier {
    pub fn new(webhook_url: String, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Notify(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            webhook_url,
        })
    }

    /// Post a plain text message. Non-2xx responses are errors.
    pub async fn send(&self, text: &str) -> Result<(), AppError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&WebhookPayload { text })
            .send()
            .await
            .map_err(|e| AppError::Notify(format!("webhook request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Notify(format!(
                "webhook returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for SlackWebhookNotifier {
    async fn notify(&self, report: &TaskReport) {
        let text = message::render(report);
        let kind = if report.is_success() { "success" } else { "fail" };

        match self.send(&text).await {
            Ok(()) => {
                tracing::info!(
                    run_id = %report.context.run_id,
                    kind,
                    "Slack notification sent"
                );
            }
            Err(e) => {
                tracing::error!(
                    run_id = %report.context.run_id,
                    kind,
                    error = %e,
                    "Slack notification error"
                );
            }
        }
    }
}
