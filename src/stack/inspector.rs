// ABOUTME: Read-side view of a remote stack plus recovery of broken stacks.
// ABOUTME: Decides whether a stack may be created, updated, or must be left alone.

use crate::provider::{CloudFormationOps, ProviderError, StackSummary, with_retry};
use crate::types::StackName;

use super::wait::poll_until;
use super::{
    DeployError, Progress, StackOperation, StackOptions, StackSnapshot, StackStatus,
};

/// Queries stack state in one region-aware provider.
pub struct StackInspector<'a, C: ?Sized> {
    cfn: &'a C,
    options: &'a StackOptions,
}

impl<'a, C: CloudFormationOps + ?Sized> StackInspector<'a, C> {
    pub fn new(cfn: &'a C, options: &'a StackOptions) -> Self {
        Self { cfn, options }
    }

    /// Whether a live stack with exactly this name exists in the region.
    ///
    /// A failed listing is an error, never "absent".
    pub async fn stack_exists(&self, name: &StackName, region: &str) -> Result<bool, DeployError> {
        let stacks = with_retry(&self.options.retry, "list_stacks", || {
            self.cfn.list_stacks(region)
        })
        .await
        .map_err(|e| DeployError::provider("list_stacks", e))?;

        Ok(stacks
            .iter()
            .any(|s| s.name == name.as_str() && s.status != "DELETE_COMPLETE"))
    }

    /// Describe the stack once and classify its status.
    pub async fn snapshot(&self, name: &StackName, region: &str) -> Result<StackSnapshot, DeployError> {
        match self.describe(name, region).await? {
            None => Ok(StackSnapshot::absent()),
            Some(summary) => Ok(StackSnapshot {
                status: StackStatus::from_raw(&summary.status),
                raw_status: Some(summary.status),
                reason: summary.status_reason,
            }),
        }
    }

    pub async fn stack_status(&self, name: &StackName, region: &str) -> Result<StackStatus, DeployError> {
        Ok(self.snapshot(name, region).await?.status)
    }

    /// Make the stack creatable if it is stuck in `ROLLBACK_COMPLETE`.
    ///
    /// Returns `true` when the stack is now absent and must be created,
    /// `false` when it is healthy and should be updated.
    pub async fn recover_if_broken(&self, name: &StackName, region: &str) -> Result<bool, DeployError> {
        let snapshot = self.snapshot(name, region).await?;

        match snapshot.status {
            StackStatus::NotExists => Ok(true),
            StackStatus::Healthy => Ok(false),
            StackStatus::RollbackComplete => {
                tracing::info!(
                    "Stack {} is in ROLLBACK_COMPLETE; deleting before re-creating",
                    name
                );
                self.cfn
                    .delete_stack(region, name.as_str())
                    .await
                    .map_err(|e| DeployError::provider("delete_stack", e))?;
                self.wait_for(name, region, StackOperation::Delete).await?;
                Ok(true)
            }
            StackStatus::InProgress => Err(DeployError::StackBusy {
                stack: name.to_string(),
                status: snapshot.display_status().to_string(),
            }),
            StackStatus::Failed => Err(DeployError::StackUnrecoverable {
                stack: name.to_string(),
                status: snapshot.display_status().to_string(),
            }),
        }
    }

    /// Refuse to create unless the stack is confirmed absent.
    pub async fn ensure_creatable(&self, name: &StackName, region: &str) -> Result<(), DeployError> {
        if !self.stack_exists(name, region).await? {
            return Ok(());
        }
        let snapshot = self.snapshot(name, region).await?;
        if snapshot.status == StackStatus::NotExists {
            return Ok(());
        }
        Err(DeployError::NotCreatable {
            stack: name.to_string(),
            status: snapshot.display_status().to_string(),
        })
    }

    /// Poll until `operation` settles on the stack.
    pub async fn wait_for(
        &self,
        name: &StackName,
        region: &str,
        operation: StackOperation,
    ) -> Result<StackSnapshot, DeployError> {
        let what = format!("{} of {}", operation.describe(), name);

        poll_until(&self.options.wait, &what, || async {
            let Some(summary) = self.describe(name, region).await? else {
                return match operation {
                    StackOperation::Delete => Ok(Some(StackSnapshot::absent())),
                    // Freshly created stacks can lag behind in describe.
                    StackOperation::Create => Ok(None),
                    StackOperation::Update => Err(DeployError::StackOperationFailed {
                        stack: name.to_string(),
                        status: "DOES_NOT_EXIST".to_string(),
                        reason: None,
                    }),
                };
            };

            match operation.progress(&summary.status) {
                Progress::Pending => Ok(None),
                Progress::Succeeded => Ok(Some(StackSnapshot {
                    status: StackStatus::from_raw(&summary.status),
                    raw_status: Some(summary.status),
                    reason: summary.status_reason,
                })),
                Progress::Failed => Err(DeployError::StackOperationFailed {
                    stack: name.to_string(),
                    status: summary.status,
                    reason: summary.status_reason,
                }),
            }
        })
        .await
    }

    async fn describe(&self, name: &StackName, region: &str) -> Result<Option<StackSummary>, DeployError> {
        let result = with_retry(&self.options.retry, "describe_stacks", || {
            self.cfn.describe_stack(region, name.as_str())
        })
        .await;

        match result {
            Ok(summary) => Ok(Some(summary)),
            Err(ProviderError::NotFound(_)) => Ok(None),
            Err(e) => Err(DeployError::provider("describe_stacks", e)),
        }
    }
}
