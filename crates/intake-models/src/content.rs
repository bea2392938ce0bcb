//! Synthesized-content contract and deterministic fallback.
//!
//! The language model is asked for a JSON object matching [`SynthesisContent`].
//! Whatever comes back is validated against the limits below; anything that
//! fails validation is replaced wholesale by [`SynthesisContent::fallback`],
//! which is built from the task name alone and always passes the same checks.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::truncate_chars;

/// Maximum number of title candidates kept.
pub const MAX_TITLES: usize = 5;
/// Maximum characters per title candidate.
pub const MAX_TITLE_CHARS: usize = 30;
/// Maximum number of tags kept.
pub const MAX_TAGS: usize = 10;
/// Maximum summary length accepted by persistence targets.
pub const MAX_SUMMARY_CHARS: usize = 2000;

/// Violations of the synthesized-content contract.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("no title candidates")]
    MissingTitles,

    #[error("empty summary")]
    MissingSummary,

    #[error("no tags")]
    MissingTags,

    #[error("title exceeds {MAX_TITLE_CHARS} chars: {0}")]
    TitleTooLong(String),

    #[error("summary exceeds {MAX_SUMMARY_CHARS} chars ({0})")]
    SummaryTooLong(usize),

    #[error("tag missing '#' prefix: {0}")]
    BadTagFormat(String),
}

/// Descriptive metadata produced by the synthesis stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SynthesisContent {
    pub titles: Vec<String>,
    pub summary: String,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_window: Option<String>,
}

impl SynthesisContent {
    /// Validate against the content contract.
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.titles.iter().all(|t| t.trim().is_empty()) {
            return Err(ContentError::MissingTitles);
        }
        if self.summary.trim().is_empty() {
            return Err(ContentError::MissingSummary);
        }
        if self.tags.iter().all(|t| t.trim().is_empty()) {
            return Err(ContentError::MissingTags);
        }
        for title in &self.titles {
            if title.chars().count() > MAX_TITLE_CHARS {
                return Err(ContentError::TitleTooLong(title.clone()));
            }
        }
        let summary_len = self.summary.chars().count();
        if summary_len > MAX_SUMMARY_CHARS {
            return Err(ContentError::SummaryTooLong(summary_len));
        }
        for tag in &self.tags {
            if !tag.starts_with('#') {
                return Err(ContentError::BadTagFormat(tag.clone()));
            }
        }
        Ok(())
    }

    /// Drop candidates beyond the list bounds.
    ///
    /// The model occasionally over-delivers; extra entries are trimmed rather
    /// than treated as a contract violation.
    pub fn clamp_to_limits(mut self) -> Self {
        self.titles.truncate(MAX_TITLES);
        self.tags.truncate(MAX_TAGS);
        if let Some(keywords) = self.keywords.as_mut() {
            keywords.truncate(MAX_TAGS);
        }
        self
    }

    /// Deterministic templated content derived from the task name alone.
    ///
    /// Used whenever the model call fails, returns malformed JSON, or fails
    /// validation. Must itself always satisfy [`SynthesisContent::validate`].
    pub fn fallback(task_name: &str) -> Self {
        let name = task_name.trim();
        let name = if name.is_empty() { "Untitled clip" } else { name };
        let short = truncate_chars(name, MAX_TITLE_CHARS);

        let mut titles = vec![short.clone()];
        let highlights = truncate_chars(&format!("{} Highlights", name), MAX_TITLE_CHARS);
        if highlights != short {
            titles.push(highlights);
        }
        let must_see = truncate_chars(&format!("Must-See: {}", name), MAX_TITLE_CHARS);
        if !titles.contains(&must_see) {
            titles.push(must_see);
        }

        Self {
            titles,
            summary: format!("Key moments from {}, ready to publish.", name),
            tags: vec![
                "#shortvideo".to_string(),
                "#highlights".to_string(),
                "#mustsee".to_string(),
                "#share".to_string(),
                "#trending".to_string(),
            ],
            classification: Some("general".to_string()),
            audience: Some("General audience".to_string()),
            keywords: Some(vec![
                name.to_string(),
                "short video".to_string(),
                "highlights".to_string(),
            ]),
            publish_window: Some("20:00-22:00".to_string()),
        }
        .clamp_to_limits()
    }

    /// First title candidate, used as the page title.
    pub fn primary_title(&self) -> Option<&str> {
        self.titles.iter().map(|t| t.as_str()).find(|t| !t.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_content() -> SynthesisContent {
        SynthesisContent {
            titles: vec!["A title".into()],
            summary: "A summary.".into(),
            tags: vec!["#one".into(), "#two".into()],
            classification: None,
            audience: None,
            keywords: None,
            publish_window: None,
        }
    }

    #[test]
    fn test_valid_content_passes() {
        assert!(valid_content().validate().is_ok());
    }

    #[test]
    fn test_missing_required_fields_fail() {
        let mut c = valid_content();
        c.titles = vec![];
        assert_eq!(c.validate(), Err(ContentError::MissingTitles));

        let mut c = valid_content();
        c.summary = "   ".into();
        assert_eq!(c.validate(), Err(ContentError::MissingSummary));

        let mut c = valid_content();
        c.tags = vec![];
        assert_eq!(c.validate(), Err(ContentError::MissingTags));
    }

    #[test]
    fn test_title_length_limit() {
        let mut c = valid_content();
        c.titles = vec!["x".repeat(MAX_TITLE_CHARS + 1)];
        assert!(matches!(c.validate(), Err(ContentError::TitleTooLong(_))));
    }

    #[test]
    fn test_tag_prefix_required() {
        let mut c = valid_content();
        c.tags = vec!["notag".into()];
        assert_eq!(
            c.validate(),
            Err(ContentError::BadTagFormat("notag".into()))
        );
    }

    #[test]
    fn test_clamp_to_limits() {
        let mut c = valid_content();
        c.titles = (0..10).map(|i| format!("t{}", i)).collect();
        c.tags = (0..20).map(|i| format!("#t{}", i)).collect();
        let c = c.clamp_to_limits();
        assert_eq!(c.titles.len(), MAX_TITLES);
        assert_eq!(c.tags.len(), MAX_TAGS);
    }

    #[test]
    fn test_fallback_is_schema_valid() {
        let c = SynthesisContent::fallback("Friday Launch Recap");
        assert!(c.validate().is_ok());
        assert!(c.titles.iter().any(|t| t.contains("Friday Launch Recap")));
        assert!(c.titles.len() <= MAX_TITLES);
        assert!(c.tags.len() <= MAX_TAGS);
    }

    #[test]
    fn test_fallback_is_deterministic() {
        assert_eq!(
            SynthesisContent::fallback("Demo"),
            SynthesisContent::fallback("Demo")
        );
    }

    #[test]
    fn test_fallback_handles_long_and_empty_names() {
        let long = "n".repeat(200);
        assert!(SynthesisContent::fallback(&long).validate().is_ok());
        assert!(SynthesisContent::fallback("").validate().is_ok());
    }

    #[test]
    fn test_parse_tolerates_missing_optionals() {
        let c: SynthesisContent = serde_json::from_str(
            r##"{"titles":["t"],"summary":"s","tags":["#a"]}"##,
        )
        .unwrap();
        assert!(c.classification.is_none());
        assert!(c.validate().is_ok());
    }
}
