// ABOUTME: Deploy command implementation.
// ABOUTME: Reconciles a single stack from a template, parameters and tags.

use std::path::PathBuf;

use super::aws_connection::connect;
use coreauto::bootstrap::{EXIT_ABORTED, EXIT_COMPLETED, EXIT_FAILED};
use coreauto::config::Config;
use coreauto::diagnostics::{Diagnostics, Warning};
use coreauto::error::Result;
use coreauto::output::Output;
use coreauto::prompt::Prompt;
use coreauto::stack::{DeployOutcome, Deployer, StackDeploymentRequest};

/// Arguments of `coreauto deploy`.
pub struct DeployArgs {
    pub stack_name: String,
    pub template: PathBuf,
    pub region: Option<String>,
    pub parameters: Vec<(String, String)>,
    pub tags: Vec<(String, String)>,
}

/// Deploy one stack and return the process exit code.
pub async fn deploy(
    config: &Config,
    args: DeployArgs,
    prompt: &dyn Prompt,
    output: &Output,
) -> Result<i32> {
    let region = args.region.unwrap_or_else(|| config.region.clone());
    let request = StackDeploymentRequest::new(&args.stack_name, args.template, region)?
        .parameters(args.parameters)
        .tags(args.tags);

    // Fail on local problems before touching AWS.
    request.prepare()?;

    output.progress(&format!(
        "Deploying CloudFormation stack {} in {}",
        request.stack_name, request.region
    ));

    let clients = connect(config, output).await?;
    let deployer = Deployer::new(&clients.cfn, config.stack_options(), prompt, output);
    let outcome = deployer.reconcile(&request).await?;

    let mut diag = Diagnostics::default();
    if let DeployOutcome::Aborted { stack } = &outcome {
        diag.warn(Warning::change_set_retained(stack));
    }
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    output.outcome(&outcome);
    Ok(exit_code(&outcome))
}

fn exit_code(outcome: &DeployOutcome) -> i32 {
    match outcome {
        DeployOutcome::Aborted { .. } => EXIT_ABORTED,
        DeployOutcome::Failed { .. } => EXIT_FAILED,
        _ => EXIT_COMPLETED,
    }
}
