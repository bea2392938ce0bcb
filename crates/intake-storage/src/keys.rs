//! Deterministic object key scheme and content types.

use chrono::NaiveDate;

use intake_models::TaskId;

/// Kind of published artifact; determines the key's top-level prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Video,
    Thumbnail,
    Metadata,
}

impl ArtifactKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "videos",
            ArtifactKind::Thumbnail => "thumbnails",
            ArtifactKind::Metadata => "metadata",
        }
    }
}

/// Build the object key `{artifact}/{date}/{task_id}/{filename}`.
///
/// Task-id scoping keeps concurrent tasks from colliding in the bucket.
pub fn object_key(
    kind: ArtifactKind,
    date: NaiveDate,
    task_id: &TaskId,
    filename: &str,
) -> String {
    format!(
        "{}/{}/{}/{}",
        kind.prefix(),
        date.format("%Y-%m-%d"),
        task_id,
        filename
    )
}

/// Content type from a filename extension.
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    match ext.as_str() {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_scheme() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let id = TaskId::from_string("abc123def456");
        assert_eq!(
            object_key(ArtifactKind::Video, date, &id, "video.mp4"),
            "videos/2025-06-01/abc123def456/video.mp4"
        );
        assert_eq!(
            object_key(ArtifactKind::Thumbnail, date, &id, "thumbnail.jpg"),
            "thumbnails/2025-06-01/abc123def456/thumbnail.jpg"
        );
        assert_eq!(
            object_key(ArtifactKind::Metadata, date, &id, "metadata.json"),
            "metadata/2025-06-01/abc123def456/metadata.json"
        );
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("video.mp4"), "video/mp4");
        assert_eq!(content_type_for("clip.WEBM"), "video/webm");
        assert_eq!(content_type_for("thumb.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("metadata.json"), "application/json");
        assert_eq!(content_type_for("weird.bin"), "application/octet-stream");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
