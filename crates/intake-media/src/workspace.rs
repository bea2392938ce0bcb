//! Scoped transient workspace for one task's artifacts.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{info, warn};

use crate::error::MediaResult;
use intake_models::TaskId;

/// Uniquely-named temporary directory holding one task's downloads.
///
/// The directory lives exactly as long as the pipeline run. [`release`]
/// deletes it and is safe to call more than once; if it is never called the
/// directory is still removed on drop.
///
/// [`release`]: TaskWorkspace::release
#[derive(Debug)]
pub struct TaskWorkspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl TaskWorkspace {
    /// Create the workspace under the system temp root, with the task id in
    /// the directory name to aid debugging.
    pub fn create(task_id: &TaskId) -> MediaResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("intake_{}_", task_id))
            .tempdir()?;
        let path = dir.path().to_path_buf();
        info!(task_id = %task_id, path = %path.display(), "Created task workspace");
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the workspace tree.
    ///
    /// Idempotent, and never fails: a cleanup error must not mask the
    /// pipeline's real outcome, so it is logged and swallowed.
    pub fn release(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => info!(path = %self.path.display(), "Released task workspace"),
                Err(e) => warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove task workspace"
                ),
            }
        }
    }
}
