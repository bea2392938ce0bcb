//! Structured task logging.

use tracing::{error, info, warn};

use intake_models::{TaskRecord, TaskStatus};

/// Task logger with consistent stage markers.
#[derive(Debug, Clone)]
pub struct TaskLogger {
    task_id: String,
}

impl TaskLogger {
    pub fn new(task_id: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
        }
    }

    pub fn stage_start(&self, stage: &str) {
        info!(task_id = %self.task_id, stage = %stage, "Stage started");
    }

    pub fn stage_done(&self, stage: &str, elapsed_ms: u64) {
        info!(
            task_id = %self.task_id,
            stage = %stage,
            elapsed_ms = elapsed_ms,
            "Stage finished"
        );
    }

    pub fn stage_degraded(&self, stage: &str, reason: &str) {
        warn!(task_id = %self.task_id, stage = %stage, "Stage degraded: {}", reason);
    }

    pub fn stage_failed(&self, stage: &str, reason: &str) {
        error!(task_id = %self.task_id, stage = %stage, "Stage failed: {}", reason);
    }

    /// Final summary block once the terminal status is decided.
    pub fn summary(&self, record: &TaskRecord, status: TaskStatus, duration_secs: f64) {
        info!(
            task_id = %self.task_id,
            status = %status,
            duration_secs = duration_secs,
            media_url = %record.media_url(),
            thumbnail_url = record.thumbnail_url().unwrap_or("-"),
            placeholder = record
                .acquisition
                .as_ref()
                .map(|a| a.placeholder_used)
                .unwrap_or(false),
            error = record.error_message.as_deref().unwrap_or("-"),
            "Task finished"
        );
    }
}
