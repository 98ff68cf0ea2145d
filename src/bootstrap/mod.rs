// ABOUTME: The bootstrap wizard: an ordered sequence of named steps with confirmation gates.
// ABOUTME: Checks the operator's account, then deploys the roles, database and storage stacks.

mod context;
mod stacks;
mod step;
mod steps;

pub use context::BootstrapContext;
pub use stacks::{
    BRANCH, DB_FACTS_TEMPLATE, DB_ITEMS_TEMPLATE, ENVIRONMENT, Owner, PORTFOLIO, ROLES_TEMPLATE,
    STORAGE_TEMPLATE, db_facts_stack, db_items_stack, roles_stack, stack_tags, storage_stack,
};
pub use step::{StepId, StepResult};

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::output::Output;
use crate::prompt::Prompt;
use crate::provider::{AccountOps, CloudFormationOps};

/// Process exit code for a completed run.
pub const EXIT_COMPLETED: i32 = 0;
/// Process exit code when a step failed.
pub const EXIT_FAILED: i32 = 1;
/// Process exit code when the operator declined at a gate.
pub const EXIT_ABORTED: i32 = 2;
/// Process exit code after Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 130;

/// How a bootstrap run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Completed,
    Aborted { step: StepId },
    Failed { step: StepId, reason: String },
}

impl BootstrapOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            BootstrapOutcome::Completed => EXIT_COMPLETED,
            BootstrapOutcome::Aborted { .. } => EXIT_ABORTED,
            BootstrapOutcome::Failed { .. } => EXIT_FAILED,
        }
    }
}

/// Runs bootstrap steps against the account and CloudFormation providers.
pub struct Bootstrap<'a> {
    config: &'a Config,
    account: &'a dyn AccountOps,
    cfn: &'a dyn CloudFormationOps,
    prompt: &'a dyn Prompt,
    output: &'a Output,
    diagnostics: Diagnostics,
}

impl<'a> Bootstrap<'a> {
    pub fn new(
        config: &'a Config,
        account: &'a dyn AccountOps,
        cfn: &'a dyn CloudFormationOps,
        prompt: &'a dyn Prompt,
        output: &'a Output,
    ) -> Self {
        Self {
            config,
            account,
            cfn,
            prompt,
            output,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Warnings collected so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Run steps from `initial` until the sequence reaches `Quit`, aborts or fails.
    pub async fn run(&mut self, initial: StepId, ctx: &mut BootstrapContext) -> BootstrapOutcome {
        let mut step = initial;

        while step != StepId::Quit {
            tracing::debug!("Running bootstrap step {}", step);
            self.output.step(step.title());
            ctx.visited.push(step);

            match self.execute(step, ctx).await {
                StepResult::Continue(next) => step = next,
                StepResult::Abort => {
                    tracing::info!("Bootstrap aborted at step {}", step);
                    return BootstrapOutcome::Aborted { step };
                }
                StepResult::Failed(reason) => {
                    return BootstrapOutcome::Failed { step, reason };
                }
            }
        }

        BootstrapOutcome::Completed
    }
}
