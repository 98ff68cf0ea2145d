// ABOUTME: Capability traits for the cloud provider behind the CLI.
// ABOUTME: Defines CloudFormationOps and AccountOps, plus the AWS implementation.

mod aws;
mod error;
mod retry;
mod types;

pub use aws::{AwsAccount, AwsCloudFormation, AwsSession};
pub use error::ProviderError;
pub use retry::{RetryPolicy, with_retry};
pub use types::*;

use async_trait::async_trait;

/// CloudFormation stack and change set operations.
///
/// Every call names its target region so one implementation can serve
/// stacks in the master, bucket and database regions of a bootstrap run.
#[async_trait]
pub trait CloudFormationOps: Send + Sync {
    /// List every stack in the region, across all pages.
    async fn list_stacks(&self, region: &str) -> Result<Vec<StackSummary>, ProviderError>;

    /// Describe a single stack. Returns `NotFound` when it does not exist.
    async fn describe_stack(
        &self,
        region: &str,
        stack_name: &str,
    ) -> Result<StackSummary, ProviderError>;

    /// Check that a template body is syntactically valid.
    async fn validate_template(&self, region: &str, template_body: &str)
    -> Result<(), ProviderError>;

    /// Create a stack. Returns the stack ARN.
    async fn create_stack(&self, region: &str, input: &StackInput)
    -> Result<String, ProviderError>;

    /// Delete a stack.
    async fn delete_stack(&self, region: &str, stack_name: &str) -> Result<(), ProviderError>;

    /// Create an UPDATE change set. Returns the change set ARN.
    async fn create_change_set(
        &self,
        region: &str,
        input: &ChangeSetInput,
    ) -> Result<String, ProviderError>;

    /// Describe a change set, including all of its changes.
    /// Returns `NotFound` when it does not exist.
    async fn describe_change_set(
        &self,
        region: &str,
        stack_name: &str,
        change_set_name: &str,
    ) -> Result<ChangeSetDescription, ProviderError>;

    /// Delete a change set.
    async fn delete_change_set(
        &self,
        region: &str,
        stack_name: &str,
        change_set_name: &str,
    ) -> Result<(), ProviderError>;

    /// Execute a change set against its stack.
    async fn execute_change_set(
        &self,
        region: &str,
        stack_name: &str,
        change_set_name: &str,
    ) -> Result<(), ProviderError>;
}

/// Account-level checks run by the bootstrap wizard.
#[async_trait]
pub trait AccountOps: Send + Sync {
    /// Version string of the installed AWS CLI.
    async fn aws_cli_version(&self) -> Result<String, ProviderError>;

    /// Who the current credentials belong to.
    async fn caller_identity(&self) -> Result<CallerIdentity, ProviderError>;

    /// Name of the IAM user behind the current credentials.
    async fn iam_user_name(&self) -> Result<String, ProviderError>;

    /// Whether the user has `AdministratorAccess` attached.
    async fn has_admin_privileges(&self, user_name: &str) -> Result<bool, ProviderError>;

    /// The organization the account belongs to. Returns `NotFound` when
    /// AWS Organizations is not in use.
    async fn organization(&self) -> Result<OrganizationInfo, ProviderError>;
}
