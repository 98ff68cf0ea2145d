// ABOUTME: Bootstrap command implementation.
// ABOUTME: Runs the step sequencer against live AWS clients and reports the outcome.

use super::aws_connection::connect;
use coreauto::bootstrap::{Bootstrap, BootstrapContext, BootstrapOutcome, StepId};
use coreauto::config::Config;
use coreauto::error::Result;
use coreauto::output::Output;
use coreauto::prompt::Prompt;

pub async fn bootstrap(config: &Config, prompt: &dyn Prompt, output: &Output) -> Result<i32> {
    let clients = connect(config, output).await?;
    let mut ctx = BootstrapContext::new(config.aws_profile.clone());
    let mut bootstrap = Bootstrap::new(config, &clients.account, &clients.cfn, prompt, output);

    let outcome = bootstrap.run(StepId::Welcome, &mut ctx).await;

    for warning in bootstrap.diagnostics().warnings() {
        output.warning(&warning.message);
    }

    match &outcome {
        BootstrapOutcome::Completed => {
            output.success(&format!(
                "Bootstrap complete ({} stacks reconciled)",
                ctx.outcomes.len()
            ));
        }
        BootstrapOutcome::Aborted { step } => {
            output.error(&format!("Aborted by user at step {}", step));
        }
        BootstrapOutcome::Failed { step, reason } => {
            output.error(&format!("Step {} failed: {}", step, reason));
        }
    }

    Ok(outcome.exit_code())
}
