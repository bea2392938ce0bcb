//! Language-model content synthesis.
//!
//! Sends one structured-output chat completion and validates the response
//! against the content contract. This stage never fails the pipeline: any
//! call error, parse error or contract violation degrades to the
//! deterministic fallback content.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use intake_models::{MediaInfo, SynthesisContent, SynthesisOutcome, MAX_TAGS, MAX_TITLES, MAX_TITLE_CHARS};

use crate::config::TaskParams;
use crate::error::{RunnerError, RunnerResult};
use crate::retry::{retry_with_policy, RetryPolicy};

/// Bound on the completion call.
const LLM_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Language-model credentials and model selection.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl LlmConfig {
    /// Read config from environment variables.
    ///
    /// Returns `None` when no credential is configured; synthesis then
    /// short-circuits to fallback content without attempting a call.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|v| !v.is_empty())?;
        Some(Self {
            api_key,
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Chat-completions client.
pub struct SynthesisClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl SynthesisClient {
    pub fn new(config: LlmConfig) -> RunnerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(LLM_TIMEOUT)
            .build()
            .map_err(RunnerError::Http)?;
        Ok(Self { http, config })
    }

    /// One completion call, validated against the content contract.
    async fn complete(&self, prompt: &str) -> RunnerResult<SynthesisContent> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            temperature: 0.7,
            max_tokens: 1000,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RunnerError::synthesis_failed(format!(
                "completion API returned {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| RunnerError::synthesis_failed(format!("unreadable response: {}", e)))?;

        let text = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| RunnerError::synthesis_failed("no choices in response"))?;

        parse_content(text)
    }
}

/// Parse model output into validated content, tolerating markdown fences.
fn parse_content(text: &str) -> RunnerResult<SynthesisContent> {
    let text = text.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_prefix("```").unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);

    let content: SynthesisContent = serde_json::from_str(text.trim())
        .map_err(|e| RunnerError::synthesis_failed(format!("malformed JSON: {}", e)))?;
    let content = content.clamp_to_limits();
    content
        .validate()
        .map_err(|e| RunnerError::synthesis_failed(format!("contract violation: {}", e)))?;
    Ok(content)
}

/// Build the structured-output prompt from task metadata.
pub fn build_prompt(task: &TaskParams, info: &MediaInfo) -> String {
    let mut context = vec![
        format!("- Task name: {}", task.task_name),
    ];
    if !task.assignee.is_empty() {
        context.push(format!("- Assignee: {}", task.assignee));
    }
    if !task.videographer.is_empty() {
        context.push(format!("- Videographer: {}", task.videographer));
    }
    context.push(format!("- Duration: {}", info.duration_label()));
    if let Some(title) = &info.title {
        context.push(format!("- Original title: {}", title));
    }
    if let Some(extractor) = &info.extractor {
        context.push(format!("- Source platform: {}", extractor));
    }
    if let Some(description) = &info.description {
        let head: String = description.chars().take(500).collect();
        context.push(format!("- Source description: {}", head));
    }
    if !task.notes.is_empty() {
        context.push(format!("- Notes: {}", task.notes));
    }

    format!(
        r##"You are a short-form video content strategist. Based on the video
information below, produce publishing metadata.

## Video information
{context}

## Return ONLY a single JSON object with this schema:
{{
  "titles": ["catchy title 1", "catchy title 2", "catchy title 3"],
  "summary": "what the video delivers and why it is worth watching",
  "tags": ["#tag1", "#tag2", "#tag3", "#tag4", "#tag5"],
  "classification": "content category (e.g. tutorial, entertainment, lifestyle)",
  "audience": "primary viewer profile",
  "keywords": ["keyword1", "keyword2", "keyword3"],
  "publish_window": "suggested time-of-day window"
}}

## Requirements:
- At most {max_titles} titles, each {max_title_chars} characters or fewer.
- At most {max_tags} tags, every tag starting with '#'.
- Mix popular and long-tail tags.
- Titles should create curiosity without clickbait.
"##,
        context = context.join("\n"),
        max_titles = MAX_TITLES,
        max_title_chars = MAX_TITLE_CHARS,
        max_tags = MAX_TAGS,
    )
}

/// What the synthesis stage hands back to the controller.
#[derive(Debug)]
pub struct SynthesisStageResult {
    pub outcome: SynthesisOutcome,
    /// Set when fallback was forced by a failure; `None` both on success and
    /// on the expected no-credential short-circuit.
    pub degraded_reason: Option<String>,
}

/// Run the synthesis stage. Never fails; degrades to fallback content.
pub async fn run(
    client: Option<&SynthesisClient>,
    task: &TaskParams,
    info: &MediaInfo,
) -> SynthesisStageResult {
    let Some(client) = client else {
        warn!("No language-model credential configured, using fallback content");
        return SynthesisStageResult {
            outcome: SynthesisOutcome {
                content: SynthesisContent::fallback(&task.task_name),
                fallback_used: true,
            },
            degraded_reason: None,
        };
    };

    let prompt = build_prompt(task, info);
    let policy = RetryPolicy::new("llm_completion").with_max_retries(1);

    match retry_with_policy(
        &policy,
        RunnerError::is_transient,
        |_| None,
        || client.complete(&prompt),
    )
    .await
    {
        Ok(content) => {
            info!(
                titles = content.titles.len(),
                tags = content.tags.len(),
                "Synthesized content accepted"
            );
            SynthesisStageResult {
                outcome: SynthesisOutcome {
                    content,
                    fallback_used: false,
                },
                degraded_reason: None,
            }
        }
        Err(e) => {
            warn!(error = %e, "Synthesis degraded to fallback content");
            SynthesisStageResult {
                outcome: SynthesisOutcome {
                    content: SynthesisContent::fallback(&task.task_name),
                    fallback_used: true,
                },
                degraded_reason: Some(format!("synthesis degraded to fallback: {}", e)),
            }
        }
    }
}
