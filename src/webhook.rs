//! Fire-and-forget notification of tracked message sends.
//!
//! The notifier owns everything it needs once spawned. Its outcome is logged and never
//! reaches the caller's response.

use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::{config::WebhookConfig, context::RequestContext, proxy::CLIENT};

const SECRET_HEADER: &str = "x-webhook-secret";

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("upstream response is not JSON: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook responded with status {0}")]
    Rejected(reqwest::StatusCode),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSummary {
    pub path: String,
    pub method: String,
    pub body: Value,
}

/// Stand-in for a streaming response body that is never read by the notifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "stream_started")]
pub struct StreamMarker {
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WebhookPayload {
    MessageSent {
        timestamp: String,
        prompt: String,
        request: RequestSummary,
        response: Value,
    },
    StreamStarted {
        timestamp: String,
        prompt: String,
        request: RequestSummary,
        response: StreamMarker,
    },
}

/// What the notifier is allowed to see of the upstream response.
#[derive(Debug, Clone)]
pub enum UpstreamOutcome {
    /// The body is being streamed to the caller and must not be touched.
    Streaming,
    /// A buffered copy of a non-streaming body.
    Buffered(Bytes),
}

/// Everything a detached notification needs, moved into the task.
#[derive(Debug, Clone)]
pub struct Notification {
    pub context: RequestContext,
    pub request_body: Value,
    pub outcome: UpstreamOutcome,
}

fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// First message content of the request, or an empty string.
pub fn extract_prompt(body: &Value) -> String {
    match body.pointer("/messages/0/content") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

impl Notification {
    pub fn into_payload(self) -> Result<WebhookPayload, NotifyError> {
        let timestamp = now_iso8601();
        let prompt = extract_prompt(&self.request_body);
        let request = RequestSummary {
            path: self.context.path,
            method: self.context.method.to_string(),
            body: self.request_body,
        };

        Ok(match self.outcome {
            UpstreamOutcome::Streaming => WebhookPayload::StreamStarted {
                response: StreamMarker {
                    timestamp: timestamp.clone(),
                },
                timestamp,
                prompt,
                request,
            },
            UpstreamOutcome::Buffered(bytes) => WebhookPayload::MessageSent {
                response: serde_json::from_slice(&bytes)?,
                timestamp,
                prompt,
                request,
            },
        })
    }
}

async fn deliver(webhook: &WebhookConfig, notification: Notification) -> Result<(), NotifyError> {
    let payload = notification.into_payload()?;

    let mut request = CLIENT.post(&webhook.url).json(&payload);
    if let Some(secret) = &webhook.secret {
        request = request.header(SECRET_HEADER, secret.clone());
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(NotifyError::Rejected(status));
    }

    debug!(status = %status, "Webhook accepted notification");
    Ok(())
}

/// Spawns delivery as a detached task. The handle is intentionally dropped.
pub fn dispatch(webhook: WebhookConfig, notification: Notification) {
    let span = info_span!(
        "webhook",
        request_id = %notification.context.id,
        kind = ?notification.context.classification.kind,
        stream = notification.context.classification.is_stream,
    );

    tokio::spawn(
        async move {
            match deliver(&webhook, notification).await {
                Ok(()) => info!(url = %webhook.url, "Webhook notified"),
                Err(e) => warn!(url = %webhook.url, error = %e, "Webhook notification dropped"),
            }
        }
        .instrument(span),
    );
}
