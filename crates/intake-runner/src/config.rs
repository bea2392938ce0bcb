//! Runner configuration.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use url::Url;

use crate::error::{RunnerError, RunnerResult};

/// Default bound on the download subprocess, seconds.
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 600;

/// Per-task parameters from the worklist row.
#[derive(Debug, Clone)]
pub struct TaskParams {
    pub source_url: String,
    pub task_name: String,
    pub row_index: String,
    pub assignee: String,
    pub videographer: String,
    pub shoot_date: NaiveDate,
    pub notes: String,
}

/// Webhook delivery settings.
#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub url: Option<String>,
    pub secret: String,
    /// Suppresses delivery while the rest of the pipeline runs
    pub test_mode: bool,
}

/// Full runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub task: TaskParams,
    pub webhook: WebhookSettings,
    /// Substitute placeholder content instead of aborting on download failure
    pub tolerant: bool,
    /// Dump outbound webhook payloads at debug level
    pub debug_payload: bool,
    pub download_timeout: Duration,
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false)
}

fn env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl RunnerConfig {
    /// Read configuration from environment variables.
    ///
    /// Nothing is validated here; [`RunnerConfig::validate`] runs before any
    /// side-effecting stage.
    pub fn from_env() -> Self {
        let shoot_date = std::env::var("SHOOT_DATE")
            .ok()
            .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
            .unwrap_or_else(|| Utc::now().date_naive());

        Self {
            task: TaskParams {
                source_url: env_or_default("VIDEO_URL", ""),
                task_name: env_or_default("TASK_NAME", ""),
                row_index: env_or_default("ROW_INDEX", ""),
                assignee: env_or_default("ASSIGNEE", ""),
                videographer: env_or_default("VIDEOGRAPHER", ""),
                shoot_date,
                notes: env_or_default("NOTES", ""),
            },
            webhook: WebhookSettings {
                url: std::env::var("WEBHOOK_URL").ok().filter(|v| !v.is_empty()),
                secret: env_or_default("WEBHOOK_SECRET", ""),
                test_mode: env_flag("TEST_MODE"),
            },
            tolerant: env_flag("SKIP_FAILED_DOWNLOADS"),
            debug_payload: env_flag("DEBUG_MODE"),
            download_timeout: Duration::from_secs(
                std::env::var("DOWNLOAD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            ),
        }
    }

    /// Check required inputs before any side effect.
    pub fn validate(&self) -> RunnerResult<()> {
        if self.task.source_url.is_empty() {
            return Err(RunnerError::config_error("VIDEO_URL not set"));
        }
        let parsed = Url::parse(&self.task.source_url)
            .map_err(|e| RunnerError::config_error(format!("VIDEO_URL is not a valid URL: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RunnerError::config_error(format!(
                "VIDEO_URL must be http(s), got {}",
                parsed.scheme()
            )));
        }
        if self.task.task_name.trim().is_empty() {
            return Err(RunnerError::config_error("TASK_NAME not set"));
        }
        if self.task.row_index.trim().is_empty() {
            return Err(RunnerError::config_error("ROW_INDEX not set"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn base_config() -> RunnerConfig {
        RunnerConfig {
            task: TaskParams {
                source_url: "https://example.com/v/1".into(),
                task_name: "Demo".into(),
                row_index: "7".into(),
                assignee: "".into(),
                videographer: "".into(),
                shoot_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                notes: "".into(),
            },
            webhook: WebhookSettings {
                url: None,
                secret: "".into(),
                test_mode: false,
            },
            tolerant: false,
            debug_payload: false,
            download_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_missing_url_fails() {
        let mut config = base_config();
        config.task.source_url = "".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_url_fails() {
        let mut config = base_config();
        config.task.source_url = "not a url".into();
        assert!(config.validate().is_err());

        config.task.source_url = "ftp://example.com/v".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_row_index_fails() {
        let mut config = base_config();
        config.task.row_index = " ".into();
        assert!(config.validate().is_err());
    }
}
