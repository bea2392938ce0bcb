//! Small shared helpers.

/// Maximum length of a sanitized filename stem.
const MAX_STEM_LEN: usize = 100;

/// Make a task name safe for filesystem and storage-key use.
///
/// Strips path separators, shell-hostile punctuation and control characters,
/// then caps the length.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect();
    let trimmed = cleaned.trim();
    let capped: String = trimmed.chars().take(MAX_STEM_LEN).collect();
    if capped.is_empty() {
        "untitled".to_string()
    } else {
        capped
    }
}

/// Human-readable file size (B/KB/MB/GB/TB).
pub fn human_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.1}{}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1}TB", size)
}

/// Truncate a string to at most `max_chars` characters, char-boundary safe.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
