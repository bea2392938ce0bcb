//! Error types for media operations.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Why a download failed, derived from the downloader's stderr.
///
/// Classification feeds operator-facing error messages only; control flow
/// does not branch on it beyond the tolerant-mode placeholder path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadFailureKind {
    /// Site demands login, cookies or age verification
    AuthRequired,
    /// Video is gone, private-deleted or never existed
    NotFound,
    /// The subprocess or the remote side timed out
    Timeout,
    /// No matching format could be selected
    FormatUnavailable,
    Unknown,
}

impl DownloadFailureKind {
    /// Classify downloader stderr into a failure kind.
    pub fn classify(stderr: &str) -> Self {
        let text = stderr.to_lowercase();

        if text.contains("sign in")
            || text.contains("login required")
            || text.contains("log in")
            || text.contains("cookies")
            || text.contains("members-only")
            || text.contains("private video")
            || (text.contains("age") && (text.contains("restrict") || text.contains("verif")))
        {
            return Self::AuthRequired;
        }

        if text.contains("404")
            || text.contains("not found")
            || text.contains("video unavailable")
            || text.contains("has been removed")
            || text.contains("does not exist")
        {
            return Self::NotFound;
        }

        if text.contains("timed out") || text.contains("timeout") {
            return Self::Timeout;
        }

        if text.contains("requested format is not available")
            || text.contains("no video formats")
            || text.contains("format not available")
        {
            return Self::FormatUnavailable;
        }

        Self::Unknown
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthRequired => "auth_required",
            Self::NotFound => "not_found",
            Self::Timeout => "timeout",
            Self::FormatUnavailable => "format_unavailable",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DownloadFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during media acquisition.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("yt-dlp not found in PATH")]
    YtDlpNotFound,

    #[error("ffmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("download failed ({kind}): {message}")]
    DownloadFailed {
        kind: DownloadFailureKind,
        message: String,
    },

    #[error("downloader reported success but produced no media file; files: {available:?}")]
    NoMediaFound { available: Vec<String> },

    #[error("operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("ffmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        exit_code: Option<i32>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a download failure with classified stderr.
    pub fn download_failed(stderr: &str, message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            kind: DownloadFailureKind::classify(stderr),
            message: message.into(),
        }
    }

    /// The failure kind for operator messaging, when there is one.
    pub fn failure_kind(&self) -> DownloadFailureKind {
        match self {
            Self::DownloadFailed { kind, .. } => *kind,
            Self::Timeout(_) => DownloadFailureKind::Timeout,
            _ => DownloadFailureKind::Unknown,
        }
    }
}
