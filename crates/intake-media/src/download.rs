//! Media download using yt-dlp.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};
use intake_models::{sanitize_filename, MediaInfo};

/// Browser-like user agent sent to extractors.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Format selector: capped at 720p, merged into mp4.
const FORMAT_SELECTOR: &str = "bestvideo[height<=720]+bestaudio/best[height<=720]";

const MEDIA_EXTENSIONS: [&str; 4] = ["mp4", "webm", "mkv", "mov"];
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Files the downloader left in the workspace.
#[derive(Debug, Clone)]
pub struct DownloadedArtifacts {
    pub media_path: PathBuf,
    pub media_size: u64,
    pub thumbnail_path: Option<PathBuf>,
    pub info_path: Option<PathBuf>,
}

/// Download media plus thumbnail/metadata sidecars into `dir`.
///
/// The subprocess is bounded by `timeout`; stderr is captured for failure
/// classification. A zero exit code without a locatable media file is still
/// an error.
pub async fn download_media(
    url: &str,
    task_name: &str,
    dir: &Path,
    timeout: Duration,
) -> MediaResult<DownloadedArtifacts> {
    which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)?;

    let output_template = dir
        .join(format!("{}.%(ext)s", sanitize_filename(task_name)))
        .to_string_lossy()
        .into_owned();
    let args = build_args(url, &output_template);

    info!(url = %url, dir = %dir.display(), "Starting media download");
    debug!(args = ?args, "yt-dlp invocation");

    let output = tokio::time::timeout(
        timeout,
        Command::new("yt-dlp")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output(),
    )
    .await
    .map_err(|_| MediaError::Timeout(timeout.as_secs()))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("yt-dlp stderr: {}", stderr);
        let last_line = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("unknown error");
        return Err(MediaError::download_failed(
            &stderr,
            format!(
                "yt-dlp exited with {}: {}",
                output.status.code().unwrap_or(-1),
                last_line
            ),
        ));
    }

    let artifacts = locate_artifacts(dir)?;
    info!(
        media = %artifacts.media_path.display(),
        size_mb = artifacts.media_size as f64 / 1_048_576.0,
        thumbnail = artifacts.thumbnail_path.is_some(),
        sidecar = artifacts.info_path.is_some(),
        "Download complete"
    );
    Ok(artifacts)
}

/// Downloader argument list; split out for testability.
fn build_args(url: &str, output_template: &str) -> Vec<String> {
    vec![
        "--format".to_string(),
        FORMAT_SELECTOR.to_string(),
        "--merge-output-format".to_string(),
        "mp4".to_string(),
        "--write-thumbnail".to_string(),
        "--write-info-json".to_string(),
        "--no-playlist".to_string(),
        "--extractor-retries".to_string(),
        "3".to_string(),
        "--user-agent".to_string(),
        USER_AGENT.to_string(),
        "--output".to_string(),
        output_template.to_string(),
        url.to_string(),
    ]
}

/// Locate media/thumbnail/sidecar files in the workspace by extension.
pub fn locate_artifacts(dir: &Path) -> MediaResult<DownloadedArtifacts> {
    let mut media: Option<PathBuf> = None;
    let mut thumbnail: Option<PathBuf> = None;
    let mut info: Option<PathBuf> = None;

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if MEDIA_EXTENSIONS.contains(&ext.as_str()) && !name.contains("info") {
            media = Some(path);
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            thumbnail = Some(path);
        } else if name.ends_with(".info.json") || (ext == "json" && name.contains("info")) {
            info = Some(path);
        }
    }

    let media_path = media.ok_or_else(|| {
        let available = std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        MediaError::NoMediaFound { available }
    })?;
    let media_size = media_path.metadata()?.len();

    Ok(DownloadedArtifacts {
        media_path,
        media_size,
        thumbnail_path: thumbnail,
        info_path: info,
    })
}

/// Parse the downloader's `.info.json` sidecar, degrading to task-name
/// defaults when it is missing or unreadable.
pub fn load_media_info(info_path: Option<&Path>, task_name: &str) -> MediaInfo {
    let Some(path) = info_path else {
        warn!("No metadata sidecar produced, using task-name defaults");
        return MediaInfo::fallback(task_name);
    };

    match std::fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str::<MediaInfo>(&raw) {
            Ok(info) => info,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unparseable metadata sidecar");
                MediaInfo::fallback(task_name)
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unreadable metadata sidecar");
            MediaInfo::fallback(task_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_build_args_includes_required_flags() {
        let args = build_args("https://example.com/v/1", "/tmp/out.%(ext)s");
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(args.contains(&"--write-thumbnail".to_string()));
        assert!(args.contains(&"--write-info-json".to_string()));
        assert!(args.contains(&FORMAT_SELECTOR.to_string()));
        assert_eq!(args.last().unwrap(), "https://example.com/v/1");
    }

    #[test]
    fn test_locate_artifacts_finds_all_three() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Demo.mp4", b"0123456789");
        touch(dir.path(), "Demo.webp", b"img");
        touch(dir.path(), "Demo.info.json", b"{}");

        let artifacts = locate_artifacts(dir.path()).unwrap();
        assert!(artifacts.media_path.ends_with("Demo.mp4"));
        assert_eq!(artifacts.media_size, 10);
        assert!(artifacts.thumbnail_path.unwrap().ends_with("Demo.webp"));
        assert!(artifacts.info_path.unwrap().ends_with("Demo.info.json"));
    }

    #[test]
    fn test_locate_artifacts_ignores_sidecar_as_media() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Demo.info.json", b"{}");

        let err = locate_artifacts(dir.path()).unwrap_err();
        match err {
            MediaError::NoMediaFound { available } => {
                assert_eq!(available, vec!["Demo.info.json".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_locate_artifacts_without_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "clip.webm", b"media");

        let artifacts = locate_artifacts(dir.path()).unwrap();
        assert!(artifacts.thumbnail_path.is_none());
        assert!(artifacts.info_path.is_none());
    }

    #[test]
    fn test_load_media_info_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let bad = touch(dir.path(), "x.info.json", b"not json");

        let info = load_media_info(Some(&bad), "Demo");
        assert_eq!(info.title.as_deref(), Some("Demo"));

        let info = load_media_info(None, "Demo");
        assert_eq!(info.title.as_deref(), Some("Demo"));
    }

    #[test]
    fn test_load_media_info_parses_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let good = touch(
            dir.path(),
            "x.info.json",
            br#"{"title":"Real Title","duration":12.0,"extractor":"youtube"}"#,
        );

        let info = load_media_info(Some(&good), "Demo");
        assert_eq!(info.title.as_deref(), Some("Real Title"));
        assert_eq!(info.extractor.as_deref(), Some("youtube"));
    }
}
