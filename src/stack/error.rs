// ABOUTME: Error types for stack reconciliation.
// ABOUTME: Every provider failure is classified into a kind callers can match on.

use std::path::PathBuf;

use serde::Serialize;

use crate::prompt::PromptError;
use crate::provider::ProviderError;

/// Errors that can occur while inspecting, staging or deploying a stack.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The request itself is unusable.
    #[error("invalid deployment request: {0}")]
    InvalidRequest(String),

    /// The template file does not exist.
    #[error("{} does not exist", .0.display())]
    TemplateNotFound(PathBuf),

    /// The template file exists but could not be read.
    #[error("failed to read template {}: {source}", .path.display())]
    TemplateRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A create, update or delete is already running on the stack.
    #[error("stack {stack} is in status {status}; cannot deploy while in progress")]
    StackBusy { stack: String, status: String },

    /// The stack is in a failed state that this tool will not repair.
    #[error("stack {stack} is in unrecoverable status {status}")]
    StackUnrecoverable { stack: String, status: String },

    /// A create was attempted on a stack that is not confirmed absent.
    #[error("stack {stack} cannot be created while it exists (status {status})")]
    NotCreatable { stack: String, status: String },

    /// The stack finished an operation in a failure status.
    #[error("stack {stack} ended in {status}{}", reason_suffix(.reason))]
    StackOperationFailed {
        stack: String,
        status: String,
        reason: Option<String>,
    },

    /// The change set could not be created.
    #[error("cannot create change set for {stack}: {reason}")]
    ChangeSetFailed { stack: String, reason: String },

    /// A provider call failed.
    #[error("{operation} failed: {source}")]
    Provider {
        operation: &'static str,
        source: ProviderError,
    },

    /// A wait ran past its deadline.
    #[error("timed out after {waited_secs}s waiting for {what}")]
    Timeout { what: String, waited_secs: u64 },

    /// The confirmation gate could not be read.
    #[error("confirmation failed: {0}")]
    Prompt(#[from] PromptError),
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(": {}", r))
        .unwrap_or_default()
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployErrorKind {
    /// Bad local input; fix it and rerun.
    Validation,
    /// Throttling or transport failure; safe to retry.
    ProviderTransient,
    /// The provider refused or the stack is unusable; not retried.
    ProviderFatal,
    /// A wait ran out of time; the stack may still settle.
    Timeout,
    /// The operator could not be asked for confirmation.
    Interaction,
}

impl DeployError {
    /// Wrap a provider failure with the operation that produced it.
    pub fn provider(operation: &'static str, source: ProviderError) -> Self {
        DeployError::Provider { operation, source }
    }

    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::InvalidRequest(_)
            | DeployError::TemplateNotFound(_)
            | DeployError::TemplateRead { .. } => DeployErrorKind::Validation,
            DeployError::Provider { source, .. } if source.is_transient() => {
                DeployErrorKind::ProviderTransient
            }
            DeployError::Provider { source, .. } => match source {
                ProviderError::InvalidRequest(_) => DeployErrorKind::Validation,
                _ => DeployErrorKind::ProviderFatal,
            },
            DeployError::StackBusy { .. }
            | DeployError::StackUnrecoverable { .. }
            | DeployError::NotCreatable { .. }
            | DeployError::StackOperationFailed { .. }
            | DeployError::ChangeSetFailed { .. } => DeployErrorKind::ProviderFatal,
            DeployError::Timeout { .. } => DeployErrorKind::Timeout,
            DeployError::Prompt(_) => DeployErrorKind::Interaction,
        }
    }

    /// Whether rerunning the same deployment later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            DeployErrorKind::ProviderTransient | DeployErrorKind::Timeout
        )
    }
}

/// A classified failure, as carried by `DeployOutcome::Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: DeployErrorKind,
    pub message: String,
}

impl From<&DeployError> for Failure {
    fn from(err: &DeployError) -> Self {
        Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttled_provider_error_is_transient() {
        let err = DeployError::provider(
            "describe_stacks",
            ProviderError::Throttled("Rate exceeded".to_string()),
        );
        assert_eq!(err.kind(), DeployErrorKind::ProviderTransient);
        assert!(err.is_retryable());
    }

    #[test]
    fn busy_stack_is_fatal() {
        let err = DeployError::StackBusy {
            stack: "core-automation-roles".to_string(),
            status: "UPDATE_IN_PROGRESS".to_string(),
        };
        assert_eq!(err.kind(), DeployErrorKind::ProviderFatal);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("UPDATE_IN_PROGRESS"));
    }

    #[test]
    fn timeout_is_retryable() {
        let err = DeployError::Timeout {
            what: "stack create".to_string(),
            waited_secs: 1800,
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn operation_failure_includes_reason() {
        let err = DeployError::StackOperationFailed {
            stack: "s".to_string(),
            status: "ROLLBACK_COMPLETE".to_string(),
            reason: Some("Bucket already exists".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "stack s ended in ROLLBACK_COMPLETE: Bucket already exists"
        );
    }
}
