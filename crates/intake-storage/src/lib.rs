//! S3-compatible object storage for published artifacts.

pub mod client;
pub mod error;
pub mod keys;

pub use client::{R2Client, R2Config, StorageState};
pub use error::{StorageError, StorageResult};
pub use keys::{content_type_for, object_key, ArtifactKind};
