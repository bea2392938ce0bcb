//! Shared data models for the video intake pipeline.
//!
//! This crate holds the types threaded through every pipeline stage:
//! the task identifier, the task record aggregate, lifecycle status,
//! synthesized-content contracts and the media-info sidecar model.

pub mod content;
pub mod media_info;
pub mod status;
pub mod task;
pub mod task_id;
pub mod utils;

pub use content::{SynthesisContent, MAX_SUMMARY_CHARS, MAX_TAGS, MAX_TITLES, MAX_TITLE_CHARS};
pub use media_info::MediaInfo;
pub use status::TaskStatus;
pub use task::{AcquisitionOutcome, PublicationOutcome, SynthesisOutcome, TaskInput, TaskRecord};
pub use task_id::TaskId;
pub use utils::{human_size, sanitize_filename, truncate_chars};
