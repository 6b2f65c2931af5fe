//! Notification dispatcher and sinks.
//!
//! The dispatcher hands one [`ChangeEvent`] to every configured sink and
//! records each outcome independently: a webhook failure never
//! suppresses the email attempt and vice versa. Sink errors are logged
//! here and summarized in a [`DispatchReport`]; they are never raised in
//! a way that could abort the surrounding batch loop. The caller (the
//! detector) decides what a failure means for the watermark.

use serde::Serialize;

use super::email::EmailSink;
use crate::config::WebhookConfig;
use crate::domain::{ChangeEvent, MetricDelta};
use crate::error::GatewayError;

/// Per-sink delivery failure. Stays inside the notification path.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The webhook receiver answered outside the 2xx range.
    #[error("webhook returned status {status}")]
    Http {
        /// Response status code.
        status: u16,
    },
    /// Connection, DNS, or timeout failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),
    /// Email build or SMTP failure.
    #[error("email error: {0}")]
    Email(String),
}

/// JSON body posted to the webhook receiver.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookPayload<'a> {
    table_name: &'a str,
    record_details: &'a serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    change: Option<&'a MetricDelta>,
}

/// Webhook sink: one bounded-timeout POST per event.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    /// Builds the sink with a client whose timeout bounds every request.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] when the HTTP client cannot be
    /// constructed.
    pub fn new(config: &WebhookConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Internal(format!("webhook client build failed: {e}")))?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    /// Posts the event. Any non-2xx response or transport error is a
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Http`] or [`SinkError::Transport`].
    pub async fn deliver(&self, event: &ChangeEvent) -> Result<(), SinkError> {
        let payload = WebhookPayload {
            table_name: event.table.as_str(),
            record_details: &event.record,
            change: event.metric.as_ref(),
        };
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SinkError::Http {
                status: status.as_u16(),
            })
        }
    }
}

/// One configured notification destination.
#[derive(Debug, Clone)]
pub enum NotificationSink {
    /// Outbound HTTP POST.
    Webhook(WebhookSink),
    /// Templated SMTP mail.
    Email(EmailSink),
    /// Scriptable sink for tests.
    #[cfg(test)]
    Mock(mock::MockSink),
}

impl NotificationSink {
    /// Short label used in per-sink log lines.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Webhook(_) => "webhook",
            Self::Email(_) => "email",
            #[cfg(test)]
            Self::Mock(_) => "mock",
        }
    }

    /// Delivers one event to this sink.
    ///
    /// # Errors
    ///
    /// Returns the sink's [`SinkError`] on failure.
    pub async fn deliver(&self, event: &ChangeEvent) -> Result<(), SinkError> {
        match self {
            Self::Webhook(sink) => sink.deliver(event).await,
            Self::Email(sink) => sink.deliver(event).await,
            #[cfg(test)]
            Self::Mock(sink) => sink.deliver(event),
        }
    }
}

/// Outcome of dispatching one event to every configured sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchReport {
    /// Number of sinks attempted.
    pub attempted: usize,
    /// Number of sinks that failed.
    pub failed: usize,
}

impl DispatchReport {
    /// `true` when every attempted sink succeeded (vacuously true with
    /// no sinks configured). This is the signal the watermark protocol
    /// keys on: with a single watermark per table, the least reliable
    /// sink decides whether it advances.
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Fans one event out to all configured sinks.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    sinks: Vec<NotificationSink>,
}

impl Dispatcher {
    /// Creates a dispatcher over an explicit sink list.
    #[must_use]
    pub fn new(sinks: Vec<NotificationSink>) -> Self {
        Self { sinks }
    }

    /// Builds the dispatcher from the optional sink configurations.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] when a configured sink cannot be
    /// constructed.
    pub fn from_config(
        webhook: Option<&WebhookConfig>,
        email: Option<crate::config::EmailConfig>,
    ) -> Result<Self, GatewayError> {
        let mut sinks = Vec::new();
        if let Some(cfg) = webhook {
            sinks.push(NotificationSink::Webhook(WebhookSink::new(cfg)?));
        }
        if let Some(cfg) = email {
            sinks.push(NotificationSink::Email(EmailSink::new(cfg)?));
        }
        Ok(Self::new(sinks))
    }

    /// Number of configured sinks.
    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Attempts every sink for one event, independently.
    ///
    /// Failures are logged per sink and tallied in the report; nothing
    /// propagates.
    pub async fn dispatch(&self, event: &ChangeEvent) -> DispatchReport {
        let mut report = DispatchReport::default();
        for sink in &self.sinks {
            report.attempted += 1;
            match sink.deliver(event).await {
                Ok(()) => {
                    tracing::debug!(
                        sink = sink.label(),
                        table = %event.table,
                        row_id = event.row_id,
                        "notification delivered"
                    );
                }
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(
                        sink = sink.label(),
                        table = %event.table,
                        row_id = event.row_id,
                        error = %err,
                        "notification failed"
                    );
                }
            }
        }
        report
    }
}
