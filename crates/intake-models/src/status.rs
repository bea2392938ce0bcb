//! Task lifecycle status.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an intake task.
///
/// Transitions are forward-only: `Pending -> InProgress -> terminal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task accepted but no stage has run yet
    #[default]
    Pending,
    /// Pipeline stages are executing
    InProgress,
    /// Every stage succeeded without degradation
    Completed,
    /// Real media came through but a later stage degraded
    PartiallyCompleted,
    /// Acquisition failed in non-tolerant mode, or an unhandled error escaped
    Failed,
    /// Operator interrupt observed between stages
    Cancelled,
}

impl TaskStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::PartiallyCompleted => "partially_completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }

    /// Whether the terminal state counts as a successful outcome for
    /// reporting purposes.
    pub fn is_success(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::PartiallyCompleted)
    }

    /// Process exit code for this terminal status.
    pub fn exit_code(&self) -> i32 {
        match self {
            TaskStatus::Completed => 0,
            TaskStatus::PartiallyCompleted => 2,
            TaskStatus::Cancelled => 130,
            _ => 1,
        }
    }

    /// Ordering rank used to enforce forward-only transitions.
    fn rank(&self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::InProgress => 1,
            _ => 2,
        }
    }

    /// Check whether moving to `next` is a legal forward transition.
    ///
    /// Terminal states never change, and a task never moves backwards.
    pub fn can_advance_to(&self, next: TaskStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(TaskStatus::Pending.can_advance_to(TaskStatus::InProgress));
        assert!(TaskStatus::InProgress.can_advance_to(TaskStatus::Completed));
        assert!(TaskStatus::InProgress.can_advance_to(TaskStatus::Failed));
        assert!(TaskStatus::Pending.can_advance_to(TaskStatus::Failed));
    }

    #[test]
    fn test_no_regression() {
        assert!(!TaskStatus::InProgress.can_advance_to(TaskStatus::Pending));
        assert!(!TaskStatus::Completed.can_advance_to(TaskStatus::Failed));
        assert!(!TaskStatus::Failed.can_advance_to(TaskStatus::Completed));
        assert!(!TaskStatus::Cancelled.can_advance_to(TaskStatus::InProgress));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(TaskStatus::Completed.exit_code(), 0);
        assert_eq!(TaskStatus::Failed.exit_code(), 1);
        assert_eq!(TaskStatus::PartiallyCompleted.exit_code(), 2);
        assert_eq!(TaskStatus::Cancelled.exit_code(), 130);
    }

    #[test]
    fn test_serde_snake_case() {
        let s = serde_json::to_string(&TaskStatus::PartiallyCompleted).unwrap();
        assert_eq!(s, "\"partially_completed\"");
    }
}
