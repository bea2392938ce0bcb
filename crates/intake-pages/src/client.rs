//! Page-database REST client.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{PagesError, PagesResult};
use crate::properties::{build_children, build_properties, PageDraft};

/// Default request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the page-database client.
#[derive(Debug, Clone)]
pub struct PagesConfig {
    /// API bearer token
    pub api_token: String,
    /// Database the result pages are created in
    pub database_id: String,
    /// API base, e.g. `https://api.notion.com/v1`
    pub base_url: String,
    /// Existing page to write status back to, if the worklist created one
    pub page_id: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl PagesConfig {
    /// Read config from environment variables.
    ///
    /// Returns `None` when the integration is not configured; the caller
    /// skips page persistence with a warning in that case.
    pub fn from_env() -> Option<Self> {
        let api_token = std::env::var("PAGES_API_TOKEN").ok().filter(|v| !v.is_empty())?;
        let database_id = std::env::var("PAGES_DATABASE_ID")
            .ok()
            .filter(|v| !v.is_empty())?;

        Some(Self {
            api_token,
            database_id,
            base_url: std::env::var("PAGES_BASE_URL")
                .unwrap_or_else(|_| "https://api.notion.com/v1".to_string()),
            page_id: std::env::var("PAGES_PAGE_ID").ok().filter(|v| !v.is_empty()),
            timeout: REQUEST_TIMEOUT,
        })
    }
}

/// Stable reference to a created or updated page.
#[derive(Debug, Clone, Deserialize)]
pub struct PageHandle {
    pub id: String,
    pub url: String,
}

/// Page-database API client.
#[derive(Clone)]
pub struct PagesClient {
    http: reqwest::Client,
    config: PagesConfig,
}

impl PagesClient {
    pub fn new(config: PagesConfig) -> PagesResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PagesError::ConfigError(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Create a result page in the configured database.
    ///
    /// One attempt; callers wrap this in their retry policy using
    /// [`PagesError::is_retryable`].
    pub async fn create_page(&self, draft: &PageDraft) -> PagesResult<PageHandle> {
        let body = json!({
            "parent": { "database_id": self.config.database_id },
            "properties": build_properties(draft),
            "children": build_children(draft),
        });

        debug!(database_id = %self.config.database_id, "Creating result page");

        let response = self
            .http
            .post(format!("{}/pages", self.config.base_url))
            .bearer_auth(&self.config.api_token)
            .json(&body)
            .send()
            .await?;

        let handle: PageHandle = Self::parse_response(response).await?;
        info!(page_id = %handle.id, url = %handle.url, "Created result page");
        Ok(handle)
    }

    /// Update the status field on an existing page.
    pub async fn update_status(&self, page_id: &str, status_label: &str) -> PagesResult<()> {
        let body = json!({
            "properties": {
                "Status": { "select": { "name": status_label } }
            }
        });

        let response = self
            .http
            .patch(format!("{}/pages/{}", self.config.base_url, page_id))
            .bearer_auth(&self.config.api_token)
            .json(&body)
            .send()
            .await?;

        Self::check_status(response).await?;
        info!(page_id = %page_id, status = %status_label, "Updated page status");
        Ok(())
    }

    /// The page this run should write status back to, if configured.
    pub fn writeback_page_id(&self) -> Option<&str> {
        self.config.page_id.as_deref()
    }

    async fn check_status(response: reqwest::Response) -> PagesResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after_ms = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(|secs| secs * 1000);
        let message = response.text().await.unwrap_or_default();

        Err(PagesError::Api {
            status: status.as_u16(),
            message,
            retry_after_ms,
        })
    }

    async fn parse_response(response: reqwest::Response) -> PagesResult<PageHandle> {
        let response = Self::check_status(response).await?;
        response
            .json::<PageHandle>()
            .await
            .map_err(|e| PagesError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use intake_models::SynthesisContent;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn draft() -> PageDraft {
        PageDraft {
            task_name: "Demo".into(),
            status_label: "Completed".into(),
            assignee: "".into(),
            videographer: "".into(),
            source_url: "https://example.com/v/1".into(),
            media_url: None,
            thumbnail_url: None,
            notes: "".into(),
            content: SynthesisContent::fallback("Demo"),
            processed_at: Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
        }
    }

    fn client_for(server: &MockServer) -> PagesClient {
        PagesClient::new(PagesConfig {
            api_token: "token".into(),
            database_id: "db123".into(),
            base_url: server.uri(),
            page_id: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_page_parses_handle() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "page-1",
                "url": "https://pages.example.com/page-1"
            })))
            .mount(&server)
            .await;

        let handle = client_for(&server).create_page(&draft()).await.unwrap();
        assert_eq!(handle.id, "page-1");
        assert_eq!(handle.url, "https://pages.example.com/page-1");
    }

    #[tokio::test]
    async fn test_rate_limit_is_retryable_with_backoff_hint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pages"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("Retry-After", "2")
                    .set_body_string("rate limited"),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).create_page(&draft()).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.retry_after_ms(), Some(2000));
    }

    #[tokio::test]
    async fn test_validation_error_is_not_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pages"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string("body.properties.Tags.multi_select invalid"),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).create_page(&draft()).await.unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.field_hint().is_some());
    }

    #[tokio::test]
    async fn test_update_status() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/pages/page-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        client_for(&server)
            .update_status("page-9", "Completed")
            .await
            .unwrap();
    }
}
