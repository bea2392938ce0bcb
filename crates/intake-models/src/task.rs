//! The task record aggregate threaded through the pipeline.
//!
//! [`TaskInput`] is the immutable, validated input; each stage returns a
//! typed outcome which the controller merges into the [`TaskRecord`]
//! accumulator. Stages never write into the record directly.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::content::SynthesisContent;
use crate::media_info::MediaInfo;
use crate::status::TaskStatus;
use crate::task_id::TaskId;

/// Immutable task parameters, validated before the pipeline starts.
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub task_id: TaskId,
    pub source_url: String,
    pub task_name: String,
    pub row_index: String,
    pub assignee: String,
    pub videographer: String,
    pub shoot_date: NaiveDate,
    pub notes: String,
}

/// What the acquisition stage produced in the transient workspace.
///
/// Paths point into the task workspace and are invalid after cleanup.
#[derive(Debug, Clone)]
pub struct AcquisitionOutcome {
    pub media_path: PathBuf,
    pub media_size: u64,
    pub thumbnail_path: Option<PathBuf>,
    pub info: MediaInfo,
    pub placeholder_used: bool,
}

/// Public URLs after artifact publication.
///
/// `media_url` is never empty: when storage is unavailable it carries the
/// original source URL.
#[derive(Debug, Clone)]
pub struct PublicationOutcome {
    pub media_url: String,
    pub thumbnail_url: Option<String>,
    pub key_prefix: Option<String>,
    pub degraded: bool,
}

/// Synthesized descriptive metadata.
#[derive(Debug, Clone)]
pub struct SynthesisOutcome {
    pub content: SynthesisContent,
    pub fallback_used: bool,
}

/// Wall-clock duration of each stage, milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings {
    pub acquisition_ms: Option<u64>,
    pub publication_ms: Option<u64>,
    pub synthesis_ms: Option<u64>,
    pub reporting_ms: Option<u64>,
}

/// Mutable per-task aggregate, owned by the pipeline controller.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub input: TaskInput,
    pub status: TaskStatus,
    pub acquisition: Option<AcquisitionOutcome>,
    pub publication: Option<PublicationOutcome>,
    pub synthesis: Option<SynthesisOutcome>,
    pub error_message: Option<String>,
    pub timings: StageTimings,
}

impl TaskRecord {
    pub fn new(input: TaskInput) -> Self {
        Self {
            input,
            status: TaskStatus::Pending,
            acquisition: None,
            publication: None,
            synthesis: None,
            error_message: None,
            timings: StageTimings::default(),
        }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.input.task_id
    }

    /// Advance the lifecycle status; illegal (backwards) transitions are
    /// ignored so a terminal decision can never be overwritten.
    pub fn advance(&mut self, next: TaskStatus) {
        if self.status.can_advance_to(next) {
            self.status = next;
        }
    }

    /// Record the first degrading failure. Later annotations keep the
    /// original message, which names the stage that degraded first.
    pub fn note_error(&mut self, message: impl Into<String>) {
        if self.error_message.is_none() {
            self.error_message = Some(message.into());
        }
    }

    /// Merge the acquisition delta. Set once; never cleared.
    pub fn apply_acquisition(&mut self, outcome: AcquisitionOutcome) {
        if self.acquisition.is_none() {
            self.acquisition = Some(outcome);
        }
    }

    /// Merge the publication delta. Set once; never cleared.
    pub fn apply_publication(&mut self, outcome: PublicationOutcome) {
        if self.publication.is_none() {
            self.publication = Some(outcome);
        }
    }

    /// Merge the synthesis delta. Set once; never cleared.
    pub fn apply_synthesis(&mut self, outcome: SynthesisOutcome) {
        if self.synthesis.is_none() {
            self.synthesis = Some(outcome);
        }
    }

    /// Whether acquisition produced real (non-placeholder) media.
    pub fn has_real_media(&self) -> bool {
        self.acquisition
            .as_ref()
            .map(|a| !a.placeholder_used)
            .unwrap_or(false)
    }

    /// Best media URL known so far: published URL, else the source URL.
    pub fn media_url(&self) -> &str {
        self.publication
            .as_ref()
            .map(|p| p.media_url.as_str())
            .unwrap_or(self.input.source_url.as_str())
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.publication
            .as_ref()
            .and_then(|p| p.thumbnail_url.as_deref())
    }
}
