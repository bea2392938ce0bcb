//! Parsed downloader metadata sidecar.

use serde::{Deserialize, Serialize};

/// Subset of the downloader's `.info.json` sidecar that the pipeline uses.
///
/// Every field is optional; sidecars vary wildly across platforms and the
/// sidecar itself may be missing entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub extractor: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl MediaInfo {
    /// Stand-in info when no sidecar was produced.
    pub fn fallback(task_name: &str) -> Self {
        Self {
            title: Some(task_name.to_string()),
            ..Default::default()
        }
    }

    /// Duration for logs and payloads, "unknown" when absent.
    pub fn duration_label(&self) -> String {
        match self.duration {
            Some(secs) => format!("{:.0}s", secs),
            None => "unknown".to_string(),
        }
    }
}
