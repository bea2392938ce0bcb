//! Runner error types.

use thiserror::Error;

pub type RunnerResult<T> = Result<T, RunnerError>;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Media error: {0}")]
    Media(#[from] intake_media::MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] intake_storage::StorageError),

    #[error("Pages error: {0}")]
    Pages(#[from] intake_pages::PagesError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn synthesis_failed(msg: impl Into<String>) -> Self {
        Self::SynthesisFailed(msg.into())
    }

    /// Transient transport failures worth one more attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}
