//! Outbound webhook notification.
//!
//! One POST, one attempt: the webhook is a best-effort side notification and
//! never changes the pipeline's terminal status. The shared secret travels
//! as a payload field for receiver-side verification.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use intake_models::{human_size, truncate_chars, TaskRecord};

use crate::config::WebhookSettings;

/// Bound on the delivery attempt.
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Error messages in failure payloads are truncated to this many characters.
pub const ERROR_MESSAGE_LIMIT: usize = 500;

/// Build the success payload.
pub fn success_payload(
    secret: &str,
    record: &TaskRecord,
    page_url: Option<&str>,
    processed_at: DateTime<Utc>,
) -> Value {
    let input = &record.input;
    let content = record.synthesis.as_ref().map(|s| &s.content);
    let info = record.acquisition.as_ref().map(|a| &a.info);

    let page_title = content
        .and_then(|c| c.primary_title())
        .unwrap_or(input.task_name.as_str());

    json!({
        "status": "success",
        "secret": secret,
        "task_id": input.task_id.as_str(),
        "row_index": input.row_index,
        "task_name": input.task_name,
        "page_title": page_title,
        "titles": content.map(|c| c.titles.clone()).unwrap_or_default(),
        "summary": content.map(|c| c.summary.clone()).unwrap_or_default(),
        "tags": content.map(|c| c.tags.clone()).unwrap_or_default(),
        "classification": content.and_then(|c| c.classification.clone()),
        "audience": content.and_then(|c| c.audience.clone()),
        "keywords": content.and_then(|c| c.keywords.clone()),
        "publish_window": content.and_then(|c| c.publish_window.clone()),
        "media_url": record.media_url(),
        "thumbnail_url": record.thumbnail_url(),
        "page_url": page_url,
        "media_info": {
            "duration": info.and_then(|i| i.duration),
            "title": info.and_then(|i| i.title.clone()),
            "platform": info.and_then(|i| i.extractor.clone()),
        },
        "stats": {
            "media_size": record.acquisition.as_ref().map(|a| human_size(a.media_size)),
            "thumbnail_generated": record.thumbnail_url().is_some(),
            "storage_prefix": record.publication.as_ref().and_then(|p| p.key_prefix.clone()),
            "placeholder_used": record
                .acquisition
                .as_ref()
                .map(|a| a.placeholder_used)
                .unwrap_or(false),
        },
        "processed_at": processed_at.to_rfc3339(),
    })
}

/// Build the failure payload. The error message carries enough for the
/// receiver to mark the originating worklist row as failed.
pub fn error_payload(
    secret: &str,
    record: &TaskRecord,
    error_message: &str,
    processed_at: DateTime<Utc>,
) -> Value {
    json!({
        "status": "error",
        "secret": secret,
        "task_id": record.input.task_id.as_str(),
        "row_index": record.input.row_index,
        "task_name": record.input.task_name,
        "error_message": truncate_chars(error_message, ERROR_MESSAGE_LIMIT),
        "processed_at": processed_at.to_rfc3339(),
    })
}

/// Webhook delivery client.
pub struct WebhookNotifier {
    http: reqwest::Client,
    settings: WebhookSettings,
    debug_payload: bool,
}

impl WebhookNotifier {
    pub fn new(settings: WebhookSettings, debug_payload: bool) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
            debug_payload,
        }
    }

    /// Deliver a success notification.
    pub async fn send_success(&self, record: &TaskRecord, page_url: Option<&str>) {
        let payload = success_payload(&self.settings.secret, record, page_url, Utc::now());
        self.deliver(&payload).await;
    }

    /// Deliver a failure notification.
    pub async fn send_failure(&self, record: &TaskRecord, error_message: &str) {
        let payload = error_payload(&self.settings.secret, record, error_message, Utc::now());
        self.deliver(&payload).await;
    }

    /// Single delivery attempt; any failure is logged and swallowed.
    async fn deliver(&self, payload: &Value) {
        if self.settings.test_mode {
            info!("Test mode: skipping webhook delivery");
            return;
        }
        let Some(url) = self.settings.url.as_deref() else {
            warn!("No webhook URL configured, skipping delivery");
            return;
        };

        if self.debug_payload {
            debug!(payload = %payload, "Webhook payload");
        }

        let result = self
            .http
            .post(url)
            .timeout(WEBHOOK_TIMEOUT)
            .header("User-Agent", "intake-runner/0.1")
            .json(payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!(status = %response.status(), "Webhook delivered");
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                error!(status = %status, body = %body, "Webhook rejected");
            }
            Err(e) => {
                error!(error = %e, "Webhook delivery failed");
            }
        }
    }
}
