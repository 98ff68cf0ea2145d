// ABOUTME: Provider-neutral request and response types for stack operations.
// ABOUTME: Shared by the AWS implementation and the in-memory fakes used in tests.

use std::collections::BTreeMap;

/// Capabilities requested on every create and change set. The platform's
/// stacks provision IAM roles and policies.
pub const IAM_CAPABILITIES: &[&str] = &["CAPABILITY_IAM", "CAPABILITY_NAMED_IAM"];

/// A stack as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSummary {
    pub name: String,
    /// Raw provider status, e.g. `UPDATE_COMPLETE`.
    pub status: String,
    pub status_reason: Option<String>,
}

/// Input for creating a stack or a change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackInput {
    pub stack_name: String,
    pub template_body: String,
    pub parameters: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
}

/// Input for creating an update change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetInput {
    pub change_set_name: String,
    pub stack: StackInput,
}

/// Status of a change set as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSetState {
    Pending,
    InProgress,
    CreateComplete,
    Failed,
    DeletePending,
    DeleteInProgress,
    DeleteComplete,
    DeleteFailed,
}

impl ChangeSetState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "CREATE_PENDING" => ChangeSetState::Pending,
            "CREATE_IN_PROGRESS" => ChangeSetState::InProgress,
            "CREATE_COMPLETE" => ChangeSetState::CreateComplete,
            "DELETE_PENDING" => ChangeSetState::DeletePending,
            "DELETE_IN_PROGRESS" => ChangeSetState::DeleteInProgress,
            "DELETE_COMPLETE" => ChangeSetState::DeleteComplete,
            "DELETE_FAILED" => ChangeSetState::DeleteFailed,
            _ => ChangeSetState::Failed,
        }
    }

    /// Whether creation has finished, one way or the other.
    pub fn is_create_terminal(&self) -> bool {
        matches!(self, ChangeSetState::CreateComplete | ChangeSetState::Failed)
    }
}

/// Execution status of a change set, separate from its creation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Unavailable,
    Available,
    InProgress,
    Complete,
    Failed,
    Obsolete,
}

impl ExecutionState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "AVAILABLE" => ExecutionState::Available,
            "EXECUTE_IN_PROGRESS" => ExecutionState::InProgress,
            "EXECUTE_COMPLETE" => ExecutionState::Complete,
            "EXECUTE_FAILED" => ExecutionState::Failed,
            "OBSOLETE" => ExecutionState::Obsolete,
            _ => ExecutionState::Unavailable,
        }
    }

    /// Whether the provider has picked up an execute request.
    pub fn has_started(&self) -> bool {
        !matches!(self, ExecutionState::Unavailable | ExecutionState::Available)
    }
}

/// A change set as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetDescription {
    pub name: String,
    pub stack_name: String,
    pub state: ChangeSetState,
    pub execution: ExecutionState,
    pub status_reason: Option<String>,
    pub changes: Vec<ResourceChange>,
}

/// One resource touched by a change set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceChange {
    pub action: String,
    pub logical_id: String,
    pub physical_id: String,
    pub resource_type: String,
    pub replacement: String,
    pub details: Vec<ChangeDetail>,
}

/// A single cause of a resource change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeDetail {
    /// E.g. `DirectModification`, `ResourceReference`, `ParameterReference`.
    pub change_source: String,
    pub target_name: Option<String>,
    pub target_attribute: Option<String>,
}

/// Identity of the credentials in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: String,
    pub arn: String,
    pub user_id: String,
}

/// The AWS Organization the account belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationInfo {
    pub id: String,
    pub master_account_id: String,
    pub master_account_email: String,
    pub master_account_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_starts_once_picked_up() {
        assert!(!ExecutionState::parse("AVAILABLE").has_started());
        assert!(!ExecutionState::parse("UNAVAILABLE").has_started());
        assert!(ExecutionState::parse("EXECUTE_IN_PROGRESS").has_started());
        assert!(ExecutionState::parse("EXECUTE_FAILED").has_started());
    }
}
