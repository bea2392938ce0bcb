//! Acquisition plumbing: yt-dlp invocation, artifact location, frame
//! extraction and scoped transient workspaces.

pub mod download;
pub mod error;
pub mod thumbnail;
pub mod workspace;

pub use download::{download_media, load_media_info, DownloadedArtifacts};
pub use error::{DownloadFailureKind, MediaError, MediaResult};
pub use thumbnail::extract_frame;
pub use workspace::TaskWorkspace;
