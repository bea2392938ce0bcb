//! Page property and body assembly.
//!
//! The page-database API enforces hard field limits: rich-text content caps
//! at 2000 characters and select-option names at 100. Everything assembled
//! here is clamped to those limits before it goes on the wire.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use intake_models::{truncate_chars, SynthesisContent, MAX_SUMMARY_CHARS, MAX_TAGS, MAX_TITLES};

/// Maximum characters in a select/multi-select option name.
const MAX_OPTION_CHARS: usize = 100;

/// Everything needed to render one result page.
#[derive(Debug, Clone)]
pub struct PageDraft {
    pub task_name: String,
    pub status_label: String,
    pub assignee: String,
    pub videographer: String,
    pub source_url: String,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub notes: String,
    pub content: SynthesisContent,
    pub processed_at: DateTime<Utc>,
}

/// Clean an option name so the API accepts it.
pub fn sanitize_option_name(name: &str) -> String {
    let cleaned = name.replace(['\n', '\r'], " ");
    let trimmed = cleaned.trim();
    let capped = truncate_chars(trimmed, MAX_OPTION_CHARS);
    if capped.is_empty() {
        "untitled option".to_string()
    } else {
        capped
    }
}

fn rich_text(content: &str) -> Value {
    json!({ "rich_text": [{ "text": { "content": content } }] })
}

fn multi_select(names: impl Iterator<Item = String>) -> Value {
    let options: Vec<Value> = names.map(|name| json!({ "name": name })).collect();
    json!({ "multi_select": options })
}

/// Assemble page properties from a draft.
pub fn build_properties(draft: &PageDraft) -> Value {
    let mut properties = serde_json::Map::new();

    properties.insert(
        "Task Name".to_string(),
        json!({ "title": [{ "text": { "content": draft.task_name } }] }),
    );
    properties.insert(
        "Status".to_string(),
        json!({ "select": { "name": draft.status_label } }),
    );

    if !draft.assignee.is_empty() {
        properties.insert("Assignee".to_string(), rich_text(&draft.assignee));
    }
    if !draft.videographer.is_empty() {
        properties.insert("Videographer".to_string(), rich_text(&draft.videographer));
    }
    properties.insert(
        "Processed At".to_string(),
        rich_text(&draft.processed_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
    );

    if !draft.source_url.is_empty() {
        properties.insert("Source URL".to_string(), json!({ "url": draft.source_url }));
    }
    if let Some(url) = &draft.media_url {
        properties.insert("Media URL".to_string(), json!({ "url": url }));
    }
    if let Some(url) = &draft.thumbnail_url {
        properties.insert("Thumbnail URL".to_string(), json!({ "url": url }));
    }

    if !draft.content.summary.is_empty() {
        properties.insert(
            "Summary".to_string(),
            rich_text(&truncate_chars(&draft.content.summary, MAX_SUMMARY_CHARS)),
        );
    }

    let titles: Vec<String> = draft
        .content
        .titles
        .iter()
        .filter(|t| !t.trim().is_empty())
        .take(MAX_TITLES)
        .map(|t| sanitize_option_name(t))
        .collect();
    if !titles.is_empty() {
        properties.insert(
            "Title Ideas".to_string(),
            multi_select(titles.into_iter()),
        );
    }

    let tags: Vec<String> = draft
        .content
        .tags
        .iter()
        .filter(|t| !t.trim().is_empty())
        .take(MAX_TAGS)
        .map(|t| sanitize_option_name(t))
        .collect();
    if !tags.is_empty() {
        properties.insert("Tags".to_string(), multi_select(tags.into_iter()));
    }

    Value::Object(properties)
}

fn heading(level: u8, text: &str) -> Value {
    let kind = match level {
        1 => "heading_1",
        2 => "heading_2",
        _ => "heading_3",
    };
    let mut block = serde_json::Map::new();
    block.insert("object".to_string(), json!("block"));
    block.insert("type".to_string(), json!(kind));
    block.insert(
        kind.to_string(),
        json!({ "rich_text": [{ "text": { "content": text } }] }),
    );
    Value::Object(block)
}

fn paragraph(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": { "rich_text": [{ "text": { "content": text } }] }
    })
}

/// Assemble the page body blocks from a draft.
pub fn build_children(draft: &PageDraft) -> Value {
    let mut blocks = Vec::new();

    blocks.push(heading(1, &draft.task_name));
    blocks.push(json!({
        "object": "block",
        "type": "callout",
        "callout": {
            "rich_text": [{ "text": { "content": format!(
                "{} at {}",
                draft.status_label,
                draft.processed_at.format("%Y-%m-%d %H:%M")
            ) } }],
            "color": "green_background"
        }
    }));

    let mut info_lines = Vec::new();
    if !draft.assignee.is_empty() {
        info_lines.push(format!("Assignee: {}", draft.assignee));
    }
    if !draft.videographer.is_empty() {
        info_lines.push(format!("Videographer: {}", draft.videographer));
    }
    if !draft.notes.is_empty() {
        info_lines.push(format!("Notes: {}", draft.notes));
    }
    if !info_lines.is_empty() {
        blocks.push(heading(2, "Basic Info"));
        blocks.push(paragraph(&info_lines.join("\n")));
    }

    blocks.push(heading(2, "Generated Content"));
    if !draft.content.summary.is_empty() {
        blocks.push(heading(3, "Summary"));
        blocks.push(paragraph(&truncate_chars(
            &draft.content.summary,
            MAX_SUMMARY_CHARS,
        )));
    }
    let titles: Vec<&String> = draft.content.titles.iter().take(MAX_TITLES).collect();
    if !titles.is_empty() {
        blocks.push(heading(3, "Title Ideas"));
        for title in titles {
            blocks.push(json!({
                "object": "block",
                "type": "numbered_list_item",
                "numbered_list_item": { "rich_text": [{ "text": { "content": title } }] }
            }));
        }
    }
    if !draft.content.tags.is_empty() {
        let tag_line = draft
            .content
            .tags
            .iter()
            .take(MAX_TAGS)
            .cloned()
            .collect::<Vec<_>>()
            .join(" • ");
        blocks.push(heading(3, "Tags"));
        blocks.push(paragraph(&tag_line));
    }

    if !draft.source_url.is_empty() {
        blocks.push(json!({ "object": "block", "type": "divider", "divider": {} }));
        blocks.push(heading(3, "Source"));
        blocks.push(json!({
            "object": "block",
            "type": "bookmark",
            "bookmark": { "url": draft.source_url }
        }));
    }

    Value::Array(blocks)
}
