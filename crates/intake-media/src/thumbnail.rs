//! One-shot thumbnail frame extraction.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

/// Offset into the media the frame is taken from.
const FRAME_TIMESTAMP: &str = "00:00:01";

/// Bound on the extraction subprocess.
const EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// Extract a single high-quality frame from `video_path` into `output_path`.
///
/// Used when the downloader produced no thumbnail of its own. Callers treat
/// failure as "no thumbnail", not as a stage failure.
pub async fn extract_frame(
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> MediaResult<()> {
    let video_path = video_path.as_ref();
    let output_path = output_path.as_ref();

    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let output = tokio::time::timeout(
        EXTRACT_TIMEOUT,
        Command::new("ffmpeg")
            .arg("-i")
            .arg(video_path)
            .args(["-ss", FRAME_TIMESTAMP, "-vframes", "1", "-q:v", "2", "-y"])
            .arg(output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output(),
    )
    .await
    .map_err(|_| MediaError::Timeout(EXTRACT_TIMEOUT.as_secs()))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("ffmpeg stderr: {}", stderr);
        return Err(MediaError::FfmpegFailed {
            message: stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("unknown error")
                .to_string(),
            exit_code: output.status.code(),
        });
    }

    if !output_path.exists() {
        return Err(MediaError::FfmpegFailed {
            message: "frame file not created".to_string(),
            exit_code: None,
        });
    }

    info!(output = %output_path.display(), "Extracted thumbnail frame");
    Ok(())
}
