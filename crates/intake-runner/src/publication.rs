//! Publication stage: push artifacts to object storage.
//!
//! This stage never fails the pipeline. Unconfigured or broken storage, and
//! any per-file upload failure, degrade the media URL back to the original
//! source URL.

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use intake_models::{human_size, AcquisitionOutcome, PublicationOutcome, TaskId};
use intake_storage::{content_type_for, object_key, ArtifactKind, R2Client, StorageState};

use crate::config::TaskParams;

/// What the publication stage hands back to the controller.
#[derive(Debug)]
pub struct PublicationStageResult {
    pub outcome: PublicationOutcome,
    /// Set when configured storage rejected an upload; `None` both on
    /// success and when storage was simply never configured.
    pub degraded_reason: Option<String>,
}

/// Run the publication stage.
pub async fn run(
    storage: &StorageState,
    task: &TaskParams,
    task_id: &TaskId,
    acquisition: &AcquisitionOutcome,
) -> PublicationStageResult {
    match storage {
        StorageState::Unconfigured => {
            info!("Storage unconfigured, passing source URL through");
            PublicationStageResult {
                outcome: passthrough(task),
                degraded_reason: None,
            }
        }
        StorageState::Failed(reason) => {
            warn!(reason = %reason, "Storage unavailable, passing source URL through");
            PublicationStageResult {
                outcome: passthrough(task),
                degraded_reason: Some(format!("storage unavailable: {}", reason)),
            }
        }
        StorageState::Ready(client) => publish(client, task, task_id, acquisition).await,
    }
}

/// Degraded outcome: the original source URL stands in for the media URL.
fn passthrough(task: &TaskParams) -> PublicationOutcome {
    PublicationOutcome {
        media_url: task.source_url.clone(),
        thumbnail_url: None,
        key_prefix: None,
        degraded: true,
    }
}

/// Filename for an artifact under the task's key prefix, keeping the
/// workspace file's extension.
fn artifact_filename(stem: &str, path: &std::path::Path) -> String {
    match path.extension().map(|e| e.to_string_lossy().to_lowercase()) {
        Some(ext) if !ext.is_empty() => format!("{}.{}", stem, ext),
        _ => stem.to_string(),
    }
}

async fn publish(
    client: &R2Client,
    task: &TaskParams,
    task_id: &TaskId,
    acquisition: &AcquisitionOutcome,
) -> PublicationStageResult {
    let date = task.shoot_date;
    let mut degraded_reason = None;

    // Media upload; failure degrades to the source URL, same as
    // unconfigured storage.
    let video_name = artifact_filename("video", &acquisition.media_path);
    let video_key = object_key(ArtifactKind::Video, date, task_id, &video_name);
    let media_url = match client
        .upload_file(
            &acquisition.media_path,
            &video_key,
            content_type_for(&video_name),
        )
        .await
    {
        Ok(()) => client.public_url(&video_key),
        Err(e) => {
            warn!(key = %video_key, error = %e, "Media upload failed, using source URL");
            degraded_reason = Some(format!("media upload failed: {}", e));
            task.source_url.clone()
        }
    };

    // Thumbnail upload; failure just means no thumbnail URL.
    let mut thumbnail_url = None;
    if let Some(thumb_path) = &acquisition.thumbnail_path {
        let thumb_name = artifact_filename("thumbnail", thumb_path);
        let thumb_key = object_key(ArtifactKind::Thumbnail, date, task_id, &thumb_name);
        match client
            .upload_file(thumb_path, &thumb_key, content_type_for(&thumb_name))
            .await
        {
            Ok(()) => thumbnail_url = Some(client.public_url(&thumb_key)),
            Err(e) => {
                warn!(key = %thumb_key, error = %e, "Thumbnail upload failed");
                if degraded_reason.is_none() {
                    degraded_reason = Some(format!("thumbnail upload failed: {}", e));
                }
            }
        }
    }

    // Metadata sidecar; non-critical.
    let metadata = json!({
        "task_id": task_id.as_str(),
        "task_name": task.task_name,
        "source_url": task.source_url,
        "assignee": task.assignee,
        "videographer": task.videographer,
        "upload_time": Utc::now().to_rfc3339(),
        "media_info": acquisition.info,
        "placeholder_used": acquisition.placeholder_used,
        "file_sizes": {
            "media": human_size(acquisition.media_size),
        },
    });
    let metadata_key = object_key(ArtifactKind::Metadata, date, task_id, "metadata.json");
    match serde_json::to_vec_pretty(&metadata) {
        Ok(bytes) => {
            if let Err(e) = client
                .upload_bytes(bytes, &metadata_key, "application/json")
                .await
            {
                warn!(key = %metadata_key, error = %e, "Metadata upload failed (non-critical)");
            }
        }
        Err(e) => warn!(error = %e, "Metadata serialization failed (non-critical)"),
    }

    let key_prefix = video_key
        .rsplit_once('/')
        .map(|(prefix, _)| prefix.to_string());

    info!(media_url = %media_url, thumbnail = thumbnail_url.is_some(), "Publication finished");

    PublicationStageResult {
        outcome: PublicationOutcome {
            media_url,
            thumbnail_url,
            key_prefix,
            degraded: degraded_reason.is_some(),
        },
        degraded_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::Path;

    fn task() -> TaskParams {
        TaskParams {
            source_url: "https://example.com/v/1".into(),
            task_name: "Demo".into(),
            row_index: "7".into(),
            assignee: "".into(),
            videographer: "".into(),
            shoot_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            notes: "".into(),
        }
    }

    fn acquisition() -> AcquisitionOutcome {
        AcquisitionOutcome {
            media_path: "/tmp/ws/Demo.mp4".into(),
            media_size: 1024,
            thumbnail_path: None,
            info: Default::default(),
            placeholder_used: false,
        }
    }

    #[tokio::test]
    async fn test_unconfigured_storage_passes_source_url_through() {
        let result = run(
            &StorageState::Unconfigured,
            &task(),
            &TaskId::from_string("abc123def456"),
            &acquisition(),
        )
        .await;

        assert_eq!(result.outcome.media_url, "https://example.com/v/1");
        assert!(result.outcome.thumbnail_url.is_none());
        assert!(result.outcome.degraded);
        assert!(result.degraded_reason.is_none());
    }

    #[tokio::test]
    async fn test_failed_storage_degrades_with_reason() {
        let result = run(
            &StorageState::Failed("bad credentials".into()),
            &task(),
            &TaskId::from_string("abc123def456"),
            &acquisition(),
        )
        .await;

        assert_eq!(result.outcome.media_url, "https://example.com/v/1");
        assert!(result.degraded_reason.unwrap().contains("bad credentials"));
    }

    #[test]
    fn test_artifact_filename_keeps_extension() {
        assert_eq!(artifact_filename("video", Path::new("/ws/Demo.MP4")), "video.mp4");
        assert_eq!(artifact_filename("thumbnail", Path::new("/ws/t.webp")), "thumbnail.webp");
        assert_eq!(artifact_filename("video", Path::new("/ws/noext")), "video");
    }
}
