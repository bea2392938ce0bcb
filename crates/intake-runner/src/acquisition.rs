//! Acquisition stage: fetch media into the task workspace.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use intake_media::{download_media, extract_frame, load_media_info, MediaError, TaskWorkspace};
use intake_models::{AcquisitionOutcome, MediaInfo};

use crate::config::TaskParams;
use crate::error::RunnerResult;

/// Marker bytes written when tolerant mode substitutes for real media.
const PLACEHOLDER_BYTES: &[u8] = b"placeholder artifact: source media unavailable\n";
const PLACEHOLDER_FILENAME: &str = "placeholder.mp4";

/// What the acquisition stage hands back to the controller.
#[derive(Debug)]
pub struct AcquisitionStageResult {
    pub outcome: AcquisitionOutcome,
    /// Set when the tolerant-mode placeholder stood in for real media.
    pub degraded_reason: Option<String>,
}

/// Run the acquisition stage.
///
/// In tolerant mode every download failure degrades to a placeholder
/// artifact; otherwise the classified error propagates and fails the task.
pub async fn run(
    task: &TaskParams,
    workspace: &TaskWorkspace,
    tolerant: bool,
    timeout: Duration,
) -> RunnerResult<AcquisitionStageResult> {
    match download_media(&task.source_url, &task.task_name, workspace.path(), timeout).await {
        Ok(artifacts) => {
            let thumbnail_path = match artifacts.thumbnail_path {
                Some(path) => Some(path),
                None => try_extract_thumbnail(&artifacts.media_path, workspace).await,
            };
            let info = load_media_info(artifacts.info_path.as_deref(), &task.task_name);

            Ok(AcquisitionStageResult {
                outcome: AcquisitionOutcome {
                    media_path: artifacts.media_path,
                    media_size: artifacts.media_size,
                    thumbnail_path,
                    info,
                    placeholder_used: false,
                },
                degraded_reason: None,
            })
        }
        Err(e) if tolerant => tolerant_fallback(task, workspace, e),
        Err(e) => Err(e.into()),
    }
}

/// Frame-extraction fallback when the downloader produced no thumbnail.
/// Failure here means "no thumbnail", never a stage failure.
async fn try_extract_thumbnail(
    media_path: &std::path::Path,
    workspace: &TaskWorkspace,
) -> Option<PathBuf> {
    let output = workspace.path().join("thumbnail.jpg");
    match extract_frame(media_path, &output).await {
        Ok(()) => Some(output),
        Err(e) => {
            warn!(error = %e, "Thumbnail extraction failed, continuing without one");
            None
        }
    }
}

/// Manufacture the tolerant-mode placeholder artifact.
fn tolerant_fallback(
    task: &TaskParams,
    workspace: &TaskWorkspace,
    error: MediaError,
) -> RunnerResult<AcquisitionStageResult> {
    warn!(
        kind = %error.failure_kind(),
        error = %error,
        "Acquisition failed, substituting placeholder content"
    );

    let media_path = write_placeholder(workspace)?;
    info!(path = %media_path.display(), "Placeholder artifact created");

    Ok(AcquisitionStageResult {
        outcome: AcquisitionOutcome {
            media_size: PLACEHOLDER_BYTES.len() as u64,
            media_path,
            thumbnail_path: None,
            info: MediaInfo::fallback(&task.task_name),
            placeholder_used: true,
        },
        degraded_reason: Some(format!(
            "acquisition degraded to placeholder ({}): {}",
            error.failure_kind(),
            error
        )),
    })
}

fn write_placeholder(workspace: &TaskWorkspace) -> std::io::Result<PathBuf> {
    let path = workspace.path().join(PLACEHOLDER_FILENAME);
    std::fs::write(&path, PLACEHOLDER_BYTES)?;
    Ok(path)
}
