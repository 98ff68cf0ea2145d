// ABOUTME: Stack status classification.
// ABOUTME: Maps raw CloudFormation statuses to reconciliation states and wait progress.

use serde::Serialize;

/// Reconciliation state of a remote stack, derived fresh from each describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StackStatus {
    /// No such stack, or it was deleted.
    NotExists,
    /// The last operation completed; safe to update.
    Healthy,
    /// A failed first create; must be deleted before it can be created again.
    RollbackComplete,
    /// A create, update, delete or rollback is running; must not be touched.
    InProgress,
    /// A terminal failure status this tool does not repair.
    Failed,
}

impl StackStatus {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "ROLLBACK_COMPLETE" => StackStatus::RollbackComplete,
            "DELETE_COMPLETE" => StackStatus::NotExists,
            s if s.ends_with("_IN_PROGRESS") => StackStatus::InProgress,
            s if s.ends_with("_FAILED") => StackStatus::Failed,
            s if s.ends_with("_COMPLETE") => StackStatus::Healthy,
            _ => StackStatus::Failed,
        }
    }
}

/// A stack's status as observed by one describe call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackSnapshot {
    pub status: StackStatus,
    /// Raw provider status; `None` when the stack does not exist.
    pub raw_status: Option<String>,
    pub reason: Option<String>,
}

impl StackSnapshot {
    pub fn absent() -> Self {
        Self {
            status: StackStatus::NotExists,
            raw_status: None,
            reason: None,
        }
    }

    /// Raw status for messages, or `DOES_NOT_EXIST`.
    pub fn display_status(&self) -> &str {
        self.raw_status.as_deref().unwrap_or("DOES_NOT_EXIST")
    }
}

/// A mutating stack operation whose completion we wait on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackOperation {
    Create,
    Update,
    Delete,
}

/// Where an operation stands after one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Pending,
    Succeeded,
    Failed,
}

impl StackOperation {
    pub fn describe(&self) -> &'static str {
        match self {
            StackOperation::Create => "stack create",
            StackOperation::Update => "stack update",
            StackOperation::Delete => "stack delete",
        }
    }

    /// Classify a raw status observed while this operation runs.
    ///
    /// Statuses that are neither this operation's success nor a known failure
    /// keep the wait going, since a describe can lag behind the request.
    pub fn progress(&self, raw: &str) -> Progress {
        match (self, raw) {
            (StackOperation::Create, "CREATE_COMPLETE") => Progress::Succeeded,
            (StackOperation::Update, "UPDATE_COMPLETE") => Progress::Succeeded,
            (StackOperation::Delete, "DELETE_COMPLETE") => Progress::Succeeded,
            (StackOperation::Create, "ROLLBACK_COMPLETE" | "DELETE_COMPLETE") => Progress::Failed,
            (StackOperation::Update, "UPDATE_ROLLBACK_COMPLETE") => Progress::Failed,
            (_, s) if s.ends_with("_FAILED") => Progress::Failed,
            _ => Progress::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_raw_statuses() {
        assert_eq!(StackStatus::from_raw("CREATE_COMPLETE"), StackStatus::Healthy);
        assert_eq!(StackStatus::from_raw("UPDATE_ROLLBACK_COMPLETE"), StackStatus::Healthy);
        assert_eq!(StackStatus::from_raw("ROLLBACK_COMPLETE"), StackStatus::RollbackComplete);
        assert_eq!(StackStatus::from_raw("UPDATE_IN_PROGRESS"), StackStatus::InProgress);
        assert_eq!(
            StackStatus::from_raw("UPDATE_COMPLETE_CLEANUP_IN_PROGRESS"),
            StackStatus::InProgress
        );
        assert_eq!(StackStatus::from_raw("DELETE_FAILED"), StackStatus::Failed);
        assert_eq!(StackStatus::from_raw("DELETE_COMPLETE"), StackStatus::NotExists);
    }

    #[test]
    fn update_waits_through_cleanup() {
        assert_eq!(
            StackOperation::Update.progress("UPDATE_COMPLETE_CLEANUP_IN_PROGRESS"),
            Progress::Pending
        );
        assert_eq!(StackOperation::Update.progress("UPDATE_COMPLETE"), Progress::Succeeded);
        assert_eq!(
            StackOperation::Update.progress("UPDATE_ROLLBACK_COMPLETE"),
            Progress::Failed
        );
    }

    #[test]
    fn create_rollback_is_failure() {
        assert_eq!(StackOperation::Create.progress("ROLLBACK_IN_PROGRESS"), Progress::Pending);
        assert_eq!(StackOperation::Create.progress("ROLLBACK_COMPLETE"), Progress::Failed);
    }

    #[test]
    fn unrelated_terminal_status_keeps_waiting() {
        assert_eq!(StackOperation::Update.progress("CREATE_COMPLETE"), Progress::Pending);
        assert_eq!(StackOperation::Update.progress("IMPORT_COMPLETE"), Progress::Pending);
        assert_eq!(StackOperation::Delete.progress("ROLLBACK_COMPLETE"), Progress::Pending);
        assert_eq!(StackOperation::Update.progress("UPDATE_ROLLBACK_FAILED"), Progress::Failed);
        assert_eq!(StackOperation::Delete.progress("DELETE_FAILED"), Progress::Failed);
    }
}
