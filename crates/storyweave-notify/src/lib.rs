//! Fire-and-forget judge notifications.
//!
//! When a story enters `judging`, the server pushes the full
//! [`JudgeContext`] to the configured webhook so the external judge can
//! start scoring without polling. Delivery is best-effort: the state
//! transition has already committed by the time the notification fires, a
//! failed delivery is logged and dropped, and the judge can always recover
//! by pulling `GET /api/stories/{id}/judge-context` instead.

use std::time::Duration;

use storyweave_types::JudgeContext;

/// How long to wait for the webhook before giving up.
const NOTIFY_TIMEOUT_SECS: u64 = 10;

/// Errors that can occur delivering a judge notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The HTTP request could not be sent or timed out.
    #[error("judge webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The webhook answered with a non-success status.
    #[error("judge webhook returned {status}: {body}")]
    Rejected {
        /// The HTTP status returned.
        status: reqwest::StatusCode,
        /// The response body, for the log.
        body: String,
    },
}

/// HTTP client for the judge webhook.
#[derive(Debug, Clone)]
pub struct JudgeNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl JudgeNotifier {
    /// Create a notifier targeting the given webhook URL.
    pub fn new(webhook_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: webhook_url.to_owned(),
        }
    }

    /// POST the judge context to the webhook and await the response.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Request`] if the request cannot be sent and
    /// [`NotifyError::Rejected`] for a non-success status.
    pub async fn notify(&self, context: &JudgeContext) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .timeout(Duration::from_secs(NOTIFY_TIMEOUT_SECS))
            .json(context)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(NotifyError::Rejected { status, body });
        }

        tracing::info!(story = %context.story.id, "Judge notified");
        Ok(())
    }

    /// Deliver the notification on a background task.
    ///
    /// The caller's request has already committed and must not wait on, or
    /// fail because of, the webhook; failures are logged at warn and
    /// dropped.
    pub fn spawn_notify(&self, context: JudgeContext) {
        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(error) = notifier.notify(&context).await {
                tracing::warn!(
                    story = %context.story.id,
                    %error,
                    "Judge notification failed; judge must pull the context"
                );
            }
        });
    }
}
