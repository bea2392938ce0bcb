//! Pipeline controller.
//!
//! Sequences acquisition, publication, synthesis and reporting over one
//! task, decides the terminal status, and guarantees the transient
//! workspace is released no matter how the run ends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{error, info, warn};

use intake_media::TaskWorkspace;
use intake_models::{SynthesisContent, TaskId, TaskInput, TaskRecord, TaskStatus};
use intake_pages::{PageDraft, PagesClient, PagesConfig, PagesError};
use intake_storage::StorageState;

use crate::acquisition;
use crate::config::RunnerConfig;
use crate::logging::TaskLogger;
use crate::publication;
use crate::retry::{retry_with_policy, RetryPolicy};
use crate::synthesis::{self, LlmConfig, SynthesisClient};
use crate::webhook::WebhookNotifier;

/// Operator-interrupt flag, observed between stages.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of one pipeline run.
pub struct PipelineReport {
    pub status: TaskStatus,
    pub record: TaskRecord,
    pub page_url: Option<String>,
    pub duration: Duration,
}

/// The pipeline controller and its collaborators.
pub struct Pipeline {
    config: RunnerConfig,
    storage: StorageState,
    synthesis: Option<SynthesisClient>,
    pages: Option<PagesClient>,
    webhook: WebhookNotifier,
    cancel: CancelFlag,
}

impl Pipeline {
    /// Build a pipeline with explicit collaborators.
    pub fn new(
        config: RunnerConfig,
        storage: StorageState,
        synthesis: Option<SynthesisClient>,
        pages: Option<PagesClient>,
        webhook: WebhookNotifier,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            config,
            storage,
            synthesis,
            pages,
            webhook,
            cancel,
        }
    }

    /// Resolve every collaborator from the environment.
    pub fn from_env(config: RunnerConfig, cancel: CancelFlag) -> Self {
        let storage = StorageState::from_env();

        let synthesis = match LlmConfig::from_env() {
            Some(llm) => match SynthesisClient::new(llm) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!(error = %e, "Language-model client failed to initialize");
                    None
                }
            },
            None => None,
        };

        let pages = match PagesConfig::from_env() {
            Some(pages_config) => match PagesClient::new(pages_config) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!(error = %e, "Pages client failed to initialize");
                    None
                }
            },
            None => None,
        };

        let webhook = WebhookNotifier::new(config.webhook.clone(), config.debug_payload);

        Self::new(config, storage, synthesis, pages, webhook, cancel)
    }

    /// Run the pipeline to a terminal status.
    pub async fn run(self) -> PipelineReport {
        let started = Instant::now();

        let task = &self.config.task;
        let task_id = TaskId::generate(&task.task_name, &task.source_url, Utc::now());
        let logger = TaskLogger::new(task_id.as_str());

        info!(
            task_id = %task_id,
            task_name = %task.task_name,
            source_url = %task.source_url,
            tolerant = self.config.tolerant,
            "Task accepted"
        );

        let mut record = TaskRecord::new(TaskInput {
            task_id,
            source_url: task.source_url.clone(),
            task_name: task.task_name.clone(),
            row_index: task.row_index.clone(),
            assignee: task.assignee.clone(),
            videographer: task.videographer.clone(),
            shoot_date: task.shoot_date,
            notes: task.notes.clone(),
        });

        let mut workspace: Option<TaskWorkspace> = None;
        let status = self.execute(&mut record, &mut workspace, &logger).await;
        record.advance(status);

        let reporting_started = Instant::now();
        let page_url = self.reporting(&record, status, &logger).await;
        record.timings.reporting_ms = Some(reporting_started.elapsed().as_millis() as u64);

        // Workspace release runs last, unconditionally.
        if let Some(ws) = workspace.as_mut() {
            ws.release();
        }

        let duration = started.elapsed();
        logger.summary(&record, status, duration.as_secs_f64());

        PipelineReport {
            status,
            record,
            page_url,
            duration,
        }
    }

    /// Run stages up to the terminal decision. Every failure is captured in
    /// the record; nothing propagates out of here.
    async fn execute(
        &self,
        record: &mut TaskRecord,
        workspace_slot: &mut Option<TaskWorkspace>,
        logger: &TaskLogger,
    ) -> TaskStatus {
        // Init: required inputs, before any side effect.
        if let Err(e) = self.config.validate() {
            logger.stage_failed("init", &e.to_string());
            record.note_error(e.to_string());
            return TaskStatus::Failed;
        }
        record.advance(TaskStatus::InProgress);

        let workspace = match TaskWorkspace::create(record.task_id()) {
            Ok(ws) => workspace_slot.insert(ws),
            Err(e) => {
                let msg = format!("workspace creation failed: {}", e);
                logger.stage_failed("init", &msg);
                record.note_error(msg);
                return TaskStatus::Failed;
            }
        };

        if self.interrupted(record) {
            return TaskStatus::Cancelled;
        }

        // Acquisition.
        logger.stage_start("acquisition");
        let stage_started = Instant::now();
        let acquired = acquisition::run(
            &self.config.task,
            workspace,
            self.config.tolerant,
            self.config.download_timeout,
        )
        .await;
        let elapsed = stage_started.elapsed().as_millis() as u64;
        record.timings.acquisition_ms = Some(elapsed);

        let acquisition_outcome = match acquired {
            Ok(result) => {
                if let Some(reason) = result.degraded_reason {
                    logger.stage_degraded("acquisition", &reason);
                    record.note_error(reason);
                }
                logger.stage_done("acquisition", elapsed);
                record.apply_acquisition(result.outcome.clone());
                result.outcome
            }
            Err(e) => {
                let msg = format!("acquisition failed: {}", e);
                logger.stage_failed("acquisition", &msg);
                record.note_error(msg);
                return TaskStatus::Failed;
            }
        };

        if self.interrupted(record) {
            return TaskStatus::Cancelled;
        }

        // Publication; never fails the pipeline.
        logger.stage_start("publication");
        let stage_started = Instant::now();
        let published = publication::run(
            &self.storage,
            &self.config.task,
            record.task_id(),
            &acquisition_outcome,
        )
        .await;
        let elapsed = stage_started.elapsed().as_millis() as u64;
        record.timings.publication_ms = Some(elapsed);

        if let Some(reason) = published.degraded_reason {
            logger.stage_degraded("publication", &reason);
            record.note_error(reason);
        }
        logger.stage_done("publication", elapsed);
        record.apply_publication(published.outcome);

        if self.interrupted(record) {
            return TaskStatus::Cancelled;
        }

        // Synthesis; never fails the pipeline.
        logger.stage_start("synthesis");
        let stage_started = Instant::now();
        let synthesized = synthesis::run(
            self.synthesis.as_ref(),
            &self.config.task,
            &acquisition_outcome.info,
        )
        .await;
        let elapsed = stage_started.elapsed().as_millis() as u64;
        record.timings.synthesis_ms = Some(elapsed);

        if let Some(reason) = synthesized.degraded_reason {
            logger.stage_degraded("synthesis", &reason);
            record.note_error(reason);
        }
        logger.stage_done("synthesis", elapsed);
        record.apply_synthesis(synthesized.outcome);

        decide_terminal(record)
    }

    /// Observe the interrupt flag between stages.
    fn interrupted(&self, record: &mut TaskRecord) -> bool {
        if self.cancel.is_cancelled() {
            warn!(task_id = %record.task_id(), "Interrupted by operator");
            record.note_error("interrupted by operator");
            return true;
        }
        false
    }

    /// Reporting stage: page persistence first (so the page URL can ride in
    /// the webhook payload), then the one-shot webhook. Neither channel can
    /// change the already-decided terminal status.
    async fn reporting(
        &self,
        record: &TaskRecord,
        status: TaskStatus,
        logger: &TaskLogger,
    ) -> Option<String> {
        logger.stage_start("reporting");
        let mut page_url = None;

        match &self.pages {
            Some(pages) => {
                if status.is_success() {
                    let draft = build_page_draft(record, status);
                    let policy = RetryPolicy::new("page_upsert")
                        .with_max_retries(3)
                        .with_base_delay(Duration::from_millis(500));

                    match retry_with_policy(
                        &policy,
                        PagesError::is_retryable,
                        |e| e.retry_after_ms().map(Duration::from_millis),
                        || pages.create_page(&draft),
                    )
                    .await
                    {
                        Ok(handle) => page_url = Some(handle.url),
                        Err(e) => match e.field_hint() {
                            Some(hint) => {
                                error!(error = %e, hint = hint, "Page creation failed")
                            }
                            None => error!(error = %e, "Page creation failed"),
                        },
                    }
                }

                if let Some(page_id) = pages.writeback_page_id() {
                    if let Err(e) = pages.update_status(page_id, status_label(status)).await {
                        warn!(page_id = %page_id, error = %e, "Page status write-back failed");
                    }
                }
            }
            None => warn!("Page database not configured, skipping page persistence"),
        }

        if status.is_success() {
            self.webhook.send_success(record, page_url.as_deref()).await;
        } else {
            let message = record
                .error_message
                .as_deref()
                .unwrap_or("unknown error");
            self.webhook.send_failure(record, message).await;
        }

        page_url
    }
}

/// Terminal decision once all stages have run.
///
/// Failed means acquisition produced nothing; Completed means no stage
/// degraded; anything degraded (placeholder media included) is
/// PartiallyCompleted. Cancellation is decided before this point.
pub(crate) fn decide_terminal(record: &TaskRecord) -> TaskStatus {
    if record.acquisition.is_none() {
        TaskStatus::Failed
    } else if record.error_message.is_none() {
        TaskStatus::Completed
    } else {
        TaskStatus::PartiallyCompleted
    }
}

/// Status field label on result pages.
fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Completed => "Completed",
        TaskStatus::PartiallyCompleted => "Partially Completed",
        TaskStatus::Failed => "Failed",
        TaskStatus::Cancelled => "Cancelled",
        _ => "In Progress",
    }
}

fn build_page_draft(record: &TaskRecord, status: TaskStatus) -> PageDraft {
    let input = &record.input;
    let content = record
        .synthesis
        .as_ref()
        .map(|s| s.content.clone())
        .unwrap_or_else(|| SynthesisContent::fallback(&input.task_name));

    PageDraft {
        task_name: input.task_name.clone(),
        status_label: status_label(status).to_string(),
        assignee: input.assignee.clone(),
        videographer: input.videographer.clone(),
        source_url: input.source_url.clone(),
        media_url: Some(record.media_url().to_string()),
        thumbnail_url: record.thumbnail_url().map(String::from),
        notes: input.notes.clone(),
        content,
        processed_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use intake_models::{AcquisitionOutcome, MediaInfo};

    fn record() -> TaskRecord {
        TaskRecord::new(TaskInput {
            task_id: TaskId::from_string("abc123def456"),
            source_url: "https://example.com/v/1".into(),
            task_name: "Demo".into(),
            row_index: "7".into(),
            assignee: "".into(),
            videographer: "".into(),
            shoot_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            notes: "".into(),
        })
    }

    fn acquisition(placeholder: bool) -> AcquisitionOutcome {
        AcquisitionOutcome {
            media_path: "/tmp/ws/video.mp4".into(),
            media_size: 10,
            thumbnail_path: None,
            info: MediaInfo::default(),
            placeholder_used: placeholder,
        }
    }

    #[test]
    fn test_no_acquisition_is_failed() {
        assert_eq!(decide_terminal(&record()), TaskStatus::Failed);
    }

    #[test]
    fn test_clean_run_is_completed() {
        let mut r = record();
        r.apply_acquisition(acquisition(false));
        assert_eq!(decide_terminal(&r), TaskStatus::Completed);
    }

    #[test]
    fn test_degraded_run_is_partially_completed() {
        let mut r = record();
        r.apply_acquisition(acquisition(false));
        r.note_error("media upload failed: quota");
        assert_eq!(decide_terminal(&r), TaskStatus::PartiallyCompleted);
    }

    #[test]
    fn test_placeholder_run_is_partially_completed() {
        let mut r = record();
        r.apply_acquisition(acquisition(true));
        r.note_error("acquisition degraded to placeholder (auth_required): login");
        assert_eq!(decide_terminal(&r), TaskStatus::PartiallyCompleted);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label(TaskStatus::Completed), "Completed");
        assert_eq!(
            status_label(TaskStatus::PartiallyCompleted),
            "Partially Completed"
        );
        assert_eq!(status_label(TaskStatus::Cancelled), "Cancelled");
    }

    #[test]
    fn test_cancel_flag() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());
        let clone = flag.clone();
        clone.cancel();
        assert!(flag.is_cancelled());
    }
}
