// ABOUTME: CloudFormation stack reconciliation.
// ABOUTME: Inspector, change-set engine and deployer built on the provider traits.

mod change_set;
mod deployer;
mod error;
mod inspector;
mod request;
mod status;
mod wait;

pub use change_set::{ChangeRow, ChangeSet, ChangeSetEngine, ChangeSetResult, render_diff};
pub use deployer::{DEPLOY_QUESTION, DeployOutcome, Deployer, StackOptions};
pub use error::{DeployError, DeployErrorKind, Failure};
pub use inspector::StackInspector;
pub use request::{PreparedStack, StackDeploymentRequest};
pub use status::{Progress, StackOperation, StackSnapshot, StackStatus};
pub use wait::{WaitConfig, poll_until};
