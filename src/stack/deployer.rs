// ABOUTME: Reconciles one stack: create when absent, change set when present.
// ABOUTME: Provider failures become a classified Failed outcome instead of an error.

use serde::{Deserialize, Serialize};

use crate::output::Output;
use crate::prompt::Prompt;
use crate::provider::{CloudFormationOps, RetryPolicy, with_retry};
use crate::types::StackArn;

use super::change_set::{ChangeSetEngine, ChangeSetResult, render_diff};
use super::inspector::StackInspector;
use super::request::{PreparedStack, StackDeploymentRequest};
use super::wait::WaitConfig;
use super::{DeployError, Failure, StackOperation, StackStatus};

/// Question shown before a staged change set is executed.
pub const DEPLOY_QUESTION: &str = "Do you want to deploy the change set?";

/// Retry and wait settings shared by every stack operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct StackOptions {
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub wait: WaitConfig,
}

/// How a reconcile ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeployOutcome {
    Created { stack: String, stack_arn: StackArn },
    Updated { stack: String, changes: usize },
    NoChanges { stack: String },
    /// The operator declined the change set; it is left staged.
    Aborted { stack: String },
    Failed { stack: String, failure: Failure },
}

impl DeployOutcome {
    pub fn stack(&self) -> &str {
        match self {
            DeployOutcome::Created { stack, .. }
            | DeployOutcome::Updated { stack, .. }
            | DeployOutcome::NoChanges { stack }
            | DeployOutcome::Aborted { stack }
            | DeployOutcome::Failed { stack, .. } => stack,
        }
    }

    /// Whether the stack now matches the request.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            DeployOutcome::Created { .. }
                | DeployOutcome::Updated { .. }
                | DeployOutcome::NoChanges { .. }
        )
    }

    /// One-line description for humans.
    pub fn summary(&self) -> String {
        match self {
            DeployOutcome::Created { stack, .. } => format!("Stack {} created", stack),
            DeployOutcome::Updated { stack, changes } => {
                format!("Stack {} updated ({} resource changes)", stack, changes)
            }
            DeployOutcome::NoChanges { stack } => format!("Stack {} is up to date", stack),
            DeployOutcome::Aborted { stack } => {
                format!("Deployment of {} aborted; change set left staged", stack)
            }
            DeployOutcome::Failed { stack, failure } => {
                format!("Deployment of {} failed: {}", stack, failure.message)
            }
        }
    }
}

/// Drives a single stack to the state described by a request.
pub struct Deployer<'a, C: ?Sized> {
    cfn: &'a C,
    options: StackOptions,
    prompt: &'a dyn Prompt,
    output: &'a Output,
}

impl<'a, C: CloudFormationOps + ?Sized> Deployer<'a, C> {
    pub fn new(cfn: &'a C, options: StackOptions, prompt: &'a dyn Prompt, output: &'a Output) -> Self {
        Self {
            cfn,
            options,
            prompt,
            output,
        }
    }

    /// Reconcile the stack.
    ///
    /// Only a request that fails local validation is returned as `Err`;
    /// everything that goes wrong after that is a `Failed` outcome.
    pub async fn reconcile(
        &self,
        request: &StackDeploymentRequest,
    ) -> Result<DeployOutcome, DeployError> {
        let prepared = request.prepare()?;
        let stack = prepared.stack_name().to_string();

        match self.apply(&prepared).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::warn!("Deployment of {} failed: {}", stack, e);
                Ok(DeployOutcome::Failed {
                    stack,
                    failure: Failure::from(&e),
                })
            }
        }
    }

    async fn apply(&self, prepared: &PreparedStack) -> Result<DeployOutcome, DeployError> {
        let name = prepared.stack_name();
        let region = prepared.region();
        let inspector = StackInspector::new(self.cfn, &self.options);

        with_retry(&self.options.retry, "validate_template", || {
            self.cfn.validate_template(region, &prepared.template_body)
        })
        .await
        .map_err(|e| DeployError::provider("validate_template", e))?;

        let snapshot = inspector.snapshot(name, region).await?;
        tracing::debug!("Stack {} status: {}", name, snapshot.display_status());

        let create = match snapshot.status {
            StackStatus::InProgress => {
                return Err(DeployError::StackBusy {
                    stack: name.to_string(),
                    status: snapshot.display_status().to_string(),
                });
            }
            StackStatus::Failed => {
                return Err(DeployError::StackUnrecoverable {
                    stack: name.to_string(),
                    status: snapshot.display_status().to_string(),
                });
            }
            StackStatus::NotExists => true,
            StackStatus::Healthy => false,
            StackStatus::RollbackComplete => inspector.recover_if_broken(name, region).await?,
        };

        if create {
            self.create(prepared, &inspector).await
        } else {
            self.update(prepared).await
        }
    }

    async fn create(
        &self,
        prepared: &PreparedStack,
        inspector: &StackInspector<'_, C>,
    ) -> Result<DeployOutcome, DeployError> {
        let name = prepared.stack_name();
        let region = prepared.region();

        inspector.ensure_creatable(name, region).await?;

        self.output
            .progress(&format!("Creating stack {} in {}...", name, region));
        let arn = self
            .cfn
            .create_stack(region, &prepared.stack_input())
            .await
            .map_err(|e| DeployError::provider("create_stack", e))?;

        inspector
            .wait_for(name, region, StackOperation::Create)
            .await?;

        Ok(DeployOutcome::Created {
            stack: name.to_string(),
            stack_arn: StackArn::new(arn),
        })
    }

    async fn update(&self, prepared: &PreparedStack) -> Result<DeployOutcome, DeployError> {
        let name = prepared.stack_name();
        let engine = ChangeSetEngine::new(self.cfn, &self.options);

        self.output
            .progress(&format!("Creating change set for {}...", name));
        let change_set = match engine.create_change_set(prepared).await? {
            ChangeSetResult::NoOp { reason } => {
                tracing::debug!("No changes for {}: {}", name, reason);
                return Ok(DeployOutcome::NoChanges {
                    stack: name.to_string(),
                });
            }
            ChangeSetResult::Staged(change_set) => change_set,
        };

        let changes = change_set.changes().len();
        self.output.change_table(name.as_str(), &render_diff(&change_set));

        let answer = self.prompt.confirm(DEPLOY_QUESTION, &["y", "n"], "y")?;
        if !answer.eq_ignore_ascii_case("y") {
            return Ok(DeployOutcome::Aborted {
                stack: name.to_string(),
            });
        }

        self.output
            .progress(&format!("Executing change set {}...", change_set.name()));
        engine.execute(change_set).await?;

        Ok(DeployOutcome::Updated {
            stack: name.to_string(),
            changes,
        })
    }
}
