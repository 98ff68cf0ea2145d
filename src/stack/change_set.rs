// ABOUTME: Staging, reviewing and executing update change sets.
// ABOUTME: At most one change set per stack, always named after the stack.

use serde::Serialize;

use crate::provider::{
    ChangeSetDescription, ChangeSetState, CloudFormationOps, ProviderError, ResourceChange,
    with_retry,
};
use crate::types::{ChangeSetArn, StackName};

use super::inspector::StackInspector;
use super::request::PreparedStack;
use super::wait::poll_until;
use super::{DeployError, StackOperation, StackOptions};

/// Status reasons CloudFormation uses for a change set with nothing to do.
const NO_CHANGE_REASONS: &[&str] = &[
    "didn't contain changes",
    "No updates are to be performed",
];

/// A change set that reached `CREATE_COMPLETE` and can be executed once.
#[derive(Debug)]
pub struct ChangeSet {
    stack_name: StackName,
    region: String,
    name: String,
    arn: ChangeSetArn,
    changes: Vec<ResourceChange>,
}

impl ChangeSet {
    pub fn stack_name(&self) -> &StackName {
        &self.stack_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arn(&self) -> &ChangeSetArn {
        &self.arn
    }

    pub fn changes(&self) -> &[ResourceChange] {
        &self.changes
    }
}

/// Result of staging a change set.
#[derive(Debug)]
pub enum ChangeSetResult {
    Staged(ChangeSet),
    /// The template and parameters match the deployed stack.
    NoOp { reason: String },
}

/// One line of the change review table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRow {
    pub action: String,
    pub logical_id: String,
    pub resource_type: String,
    pub replacement: String,
    pub physical_id: String,
    pub target: String,
}

/// Stages and executes change sets for one provider.
pub struct ChangeSetEngine<'a, C: ?Sized> {
    cfn: &'a C,
    options: &'a StackOptions,
}

impl<'a, C: CloudFormationOps + ?Sized> ChangeSetEngine<'a, C> {
    pub fn new(cfn: &'a C, options: &'a StackOptions) -> Self {
        Self { cfn, options }
    }

    /// Remove the stack's change set if there is one and wait until it is gone.
    pub async fn delete_existing_change_set(
        &self,
        stack: &StackName,
        region: &str,
    ) -> Result<(), DeployError> {
        let name = stack.change_set_name();

        if self.describe(stack, region, &name).await?.is_none() {
            return Ok(());
        }

        tracing::debug!("Deleting existing change set {}", name);
        match self.cfn.delete_change_set(region, stack.as_str(), &name).await {
            Ok(()) | Err(ProviderError::NotFound(_)) => {}
            Err(e) => return Err(DeployError::provider("delete_change_set", e)),
        }

        let what = format!("deletion of change set {}", name);
        poll_until(&self.options.wait, &what, || async {
            match self.describe(stack, region, &name).await? {
                None => Ok(Some(())),
                Some(cs) if cs.state == ChangeSetState::DeleteComplete => Ok(Some(())),
                Some(cs) if cs.state == ChangeSetState::DeleteFailed => {
                    Err(DeployError::ChangeSetFailed {
                        stack: stack.to_string(),
                        reason: cs
                            .status_reason
                            .unwrap_or_else(|| "previous change set could not be deleted".to_string()),
                    })
                }
                Some(_) => Ok(None),
            }
        })
        .await
    }

    /// Stage an update change set for a stack that already exists.
    pub async fn create_change_set(
        &self,
        prepared: &PreparedStack,
    ) -> Result<ChangeSetResult, DeployError> {
        let stack = prepared.stack_name();
        let region = prepared.region();
        let input = prepared.change_set_input();

        self.delete_existing_change_set(stack, region).await?;

        let arn = self
            .cfn
            .create_change_set(region, &input)
            .await
            .map_err(|e| DeployError::provider("create_change_set", e))?;
        tracing::debug!("Created change set {}", arn);

        let what = format!("change set {}", input.change_set_name);
        let description = poll_until(&self.options.wait, &what, || async {
            Ok(self
                .describe(stack, region, &input.change_set_name)
                .await?
                .filter(|cs| cs.state.is_create_terminal()))
        })
        .await?;

        if description.state == ChangeSetState::Failed {
            let reason = description.status_reason.unwrap_or_default();
            if NO_CHANGE_REASONS.iter().any(|r| reason.contains(r)) {
                return Ok(ChangeSetResult::NoOp { reason });
            }
            return Err(DeployError::ChangeSetFailed {
                stack: stack.to_string(),
                reason,
            });
        }

        Ok(ChangeSetResult::Staged(ChangeSet {
            stack_name: stack.clone(),
            region: region.to_string(),
            name: input.change_set_name,
            arn: ChangeSetArn::new(arn),
            changes: description.changes,
        }))
    }

    /// Run a staged change set and wait for the stack update to finish.
    ///
    /// A change set that disappears after execute counts as started; the
    /// provider removes it once the update is under way.
    pub async fn execute(&self, change_set: ChangeSet) -> Result<(), DeployError> {
        self.cfn
            .execute_change_set(
                &change_set.region,
                change_set.stack_name.as_str(),
                &change_set.name,
            )
            .await
            .map_err(|e| DeployError::provider("execute_change_set", e))?;

        // Until the change set leaves AVAILABLE the stack may still report
        // the status of its previous operation.
        let what = format!("execution of change set {}", change_set.name);
        poll_until(&self.options.wait, &what, || async {
            let started = self
                .describe(&change_set.stack_name, &change_set.region, &change_set.name)
                .await?
                .is_none_or(|cs| cs.execution.has_started());
            Ok(started.then_some(()))
        })
        .await?;

        StackInspector::new(self.cfn, self.options)
            .wait_for(
                &change_set.stack_name,
                &change_set.region,
                StackOperation::Update,
            )
            .await?;
        Ok(())
    }

    async fn describe(
        &self,
        stack: &StackName,
        region: &str,
        name: &str,
    ) -> Result<Option<ChangeSetDescription>, DeployError> {
        let result = with_retry(&self.options.retry, "describe_change_set", || {
            self.cfn.describe_change_set(region, stack.as_str(), name)
        })
        .await;

        match result {
            Ok(description) => Ok(Some(description)),
            Err(ProviderError::NotFound(_)) => Ok(None),
            Err(e) => Err(DeployError::provider("describe_change_set", e)),
        }
    }
}

/// Flatten a change set into review rows, one per change detail.
pub fn render_diff(change_set: &ChangeSet) -> Vec<ChangeRow> {
    change_set.changes.iter().flat_map(change_rows).collect()
}

fn change_rows(change: &ResourceChange) -> Vec<ChangeRow> {
    let row = |target: String| ChangeRow {
        action: change.action.clone(),
        logical_id: change.logical_id.clone(),
        resource_type: change.resource_type.clone(),
        replacement: change.replacement.clone(),
        physical_id: change.physical_id.clone(),
        target,
    };

    if change.details.is_empty() {
        return vec![row(String::new())];
    }

    change
        .details
        .iter()
        .map(|detail| {
            let target = match detail.change_source.as_str() {
                "DirectModification" => detail
                    .target_name
                    .clone()
                    .or_else(|| detail.target_attribute.clone()),
                "ResourceReference" => detail.target_name.clone(),
                _ => None,
            };
            row(target.unwrap_or_default())
        })
        .collect()
}
