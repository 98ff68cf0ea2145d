// ABOUTME: Bodies of the individual bootstrap steps.
// ABOUTME: Each step reports its findings, then asks the operator before moving on.

use crate::diagnostics::Warning;
use crate::prompt::{ENTER, PromptError};
use crate::provider::ProviderError;
use crate::stack::{DeployError, DeployOutcome, Deployer, StackDeploymentRequest};

use super::context::require;
use super::stacks::{self, Owner};
use super::{Bootstrap, BootstrapContext, StepId, StepResult};

const GATE: &str = "Press Enter to continue or X to abort.";

/// Why a step stopped the sequence.
enum Halt {
    Abort,
    Failed(String),
}

impl From<String> for Halt {
    fn from(reason: String) -> Self {
        Halt::Failed(reason)
    }
}

impl From<PromptError> for Halt {
    fn from(err: PromptError) -> Self {
        Halt::Failed(err.to_string())
    }
}

type Flow = Result<StepId, Halt>;

fn owner(ctx: &BootstrapContext) -> Result<Owner<'_>, Halt> {
    Ok(Owner {
        client: require(&ctx.client, "CLIENT")?,
        scope: ctx.scope.as_deref().unwrap_or_default(),
    })
}

fn status_label(present: bool) -> &'static str {
    if present { "OK" } else { "ERROR" }
}

impl Bootstrap<'_> {
    pub(super) async fn execute(&mut self, step: StepId, ctx: &mut BootstrapContext) -> StepResult {
        let next = step.successor();
        let flow = match step {
            StepId::Welcome => self.welcome(next),
            StepId::CheckAwsCli => self.check_aws_cli(next).await,
            StepId::Env => self.check_environment(ctx, next),
            StepId::Profile => self.check_profile(ctx, next).await,
            StepId::Admin => self.check_admin(ctx, next).await,
            StepId::Org => self.check_organization(ctx, next).await,
            StepId::Config => self.check_configuration(ctx, next),
            StepId::PreRoles => self.pre_roles(ctx, next),
            StepId::Roles => self.deploy_roles(ctx, next).await,
            StepId::PreDb => self.pre_database(ctx, next),
            StepId::Db => self.deploy_database(ctx, next).await,
            StepId::PreStorage => self.pre_storage(ctx, next),
            StepId::Storage => self.deploy_storage(ctx, next).await,
            StepId::Done => self.done(next),
            StepId::Quit => Ok(StepId::Quit),
        };

        match flow {
            Ok(next) => StepResult::Continue(next),
            Err(Halt::Abort) => StepResult::Abort,
            Err(Halt::Failed(reason)) => StepResult::Failed(reason),
        }
    }

    fn gate(&self, message: &str) -> Result<(), Halt> {
        let answer = self.prompt.confirm(message, &[ENTER, "x"], ENTER)?;
        if answer.eq_ignore_ascii_case("x") {
            return Err(Halt::Abort);
        }
        Ok(())
    }

    fn say(&self, message: &str) {
        self.output.progress(message);
    }

    fn show_rows(&self, rows: &[(&str, &str)]) {
        let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in rows {
            self.output.progress(&format!("  {key:<width$}  {value}"));
        }
        self.output.progress("");
    }

    fn welcome(&self, next: StepId) -> Flow {
        self.say("Welcome to the Core-Automation setup!");
        self.say("This setup configures the Automation Account part of the platform:");
        self.say("the automation roles, the facts and deployment databases, and the storage buckets.");
        self.say("You need the AWS CLI installed and credentials with administrative permissions.\n");
        self.gate(GATE)?;
        Ok(next)
    }

    async fn check_aws_cli(&self, next: StepId) -> Flow {
        let version = self.account.aws_cli_version().await.map_err(|e| {
            format!(
                "The AWS CLI is not installed ({}). Please install the AWS CLI and configure it with the appropriate permissions.",
                e
            )
        })?;
        self.say(&format!("The AWS CLI is installed: {}\n", version));
        self.prompt.confirm("Press Enter to continue", &[ENTER], ENTER)?;
        Ok(next)
    }

    fn check_environment(&self, ctx: &mut BootstrapContext, next: StepId) -> Flow {
        ctx.scope = Some(self.config.scope.clone());
        ctx.client = self.config.client().ok().map(str::to_string);
        ctx.automation_account = self.config.automation_account().ok().map(str::to_string);

        let scope = format!("\"{}\"  OK", self.config.scope);
        let client = format!(
            "{}  {}",
            ctx.client.as_deref().unwrap_or("-"),
            status_label(ctx.client.is_some())
        );
        let account = format!(
            "{}  {}",
            ctx.automation_account.as_deref().unwrap_or("-"),
            status_label(ctx.automation_account.is_some())
        );
        self.show_rows(&[
            ("SCOPE", scope.as_str()),
            ("CLIENT", client.as_str()),
            ("AUTOMATION_ACCOUNT", account.as_str()),
        ]);

        if ctx.client.is_none() || ctx.automation_account.is_none() {
            return Err(Halt::Failed(
                "Environment variables not set. Please set CLIENT and AUTOMATION_ACCOUNT and try again."
                    .to_string(),
            ));
        }

        self.gate(GATE)?;
        Ok(next)
    }

    async fn check_profile(&mut self, ctx: &mut BootstrapContext, next: StepId) -> Flow {
        let aws_problem = |e: ProviderError| {
            Halt::Failed(format!(
                "There was a problem reading your AWS identity ({}). Please check your AWS configuration and try again.",
                e
            ))
        };

        let resolved = self.config.resolved_profile();
        let username = self.account.iam_user_name().await.map_err(aws_problem)?;
        let identity = self.account.caller_identity().await.map_err(aws_problem)?;

        ctx.aws_profile = Some(resolved.clone());
        ctx.username = Some(username.clone());
        ctx.region = Some(self.config.region.clone());
        ctx.current_account = Some(identity.account.clone());

        if let Some(supplied) = ctx
            .supplied_profile
            .as_deref()
            .filter(|supplied| *supplied != resolved)
        {
            self.diagnostics
                .warn(Warning::profile_mismatch(supplied, &resolved));
            self.say("You may want to check that AWS_PROFILE is the correct profile before continuing.\n");
            self.gate(GATE)?;
        }

        let automation_account = require(&ctx.automation_account, "AUTOMATION_ACCOUNT")?;
        self.show_rows(&[
            ("AWS Profile", resolved.as_str()),
            ("Username", username.as_str()),
            ("Current Account", identity.account.as_str()),
            ("Automation Account", automation_account.as_str()),
            ("Automation Region", self.config.region.as_str()),
        ]);

        if identity.account != *automation_account {
            return Err(Halt::Failed(format!(
                "AWS profile is not set to the automation account. The automation account is {} but your current account is {}.",
                automation_account, identity.account
            )));
        }

        self.say("You are good to go! Your current account is the automation account.\n");
        self.gate(GATE)?;
        Ok(next)
    }

    async fn check_admin(&self, ctx: &mut BootstrapContext, next: StepId) -> Flow {
        let username = require(&ctx.username, "IAM user name")?;
        let is_admin = self
            .account
            .has_admin_privileges(username)
            .await
            .map_err(|e| format!("Could not check the policies of {}: {}", username, e))?;

        if !is_admin {
            return Err(Halt::Failed(
                "You do not have administrative privileges in the AWS account.".to_string(),
            ));
        }

        self.say("You have administrative privileges in the account!\n");
        if let Some(account) = &ctx.current_account {
            self.say(&format!(
                "Core automation resources will be installed in the automation account {}.\n",
                account
            ));
        }
        self.gate("If you are ready, press Enter to continue or X to abort.")?;
        Ok(next)
    }

    async fn check_organization(&self, ctx: &mut BootstrapContext, next: StepId) -> Flow {
        let organization = match self.account.organization().await {
            Ok(organization) => organization,
            Err(ProviderError::NotFound(_)) => {
                return Err(Halt::Failed(
                    "You have not set up an organization in AWS Organizations. This process installs resources in the organization, so it cannot continue."
                        .to_string(),
                ));
            }
            Err(e) => return Err(Halt::Failed(format!("Could not read the organization: {}", e))),
        };

        self.show_rows(&[
            ("Organization ID", organization.id.as_str()),
            ("Organization Account", organization.master_account_id.as_str()),
            ("Organization Name", organization.master_account_name.as_str()),
            ("Organization Email", organization.master_account_email.as_str()),
        ]);
        ctx.organization = Some(organization);

        self.gate(GATE)?;
        Ok(next)
    }

    fn check_configuration(&self, ctx: &mut BootstrapContext, next: StepId) -> Flow {
        let names = self
            .config
            .resource_names()
            .map_err(|e| Halt::Failed(e.to_string()))?;

        self.say("The following illustrates what will be installed:");
        self.show_rows(&[
            ("Client", ctx.client.as_deref().unwrap_or_default()),
            ("Scope", self.config.scope.as_str()),
            (
                "Automation Account",
                ctx.automation_account.as_deref().unwrap_or_default(),
            ),
            ("Master Region", self.config.region.as_str()),
            ("Bucket Region", self.config.bucket_region()),
            ("DynamoDB Region", self.config.dynamodb_region()),
            ("Packages Bucket", names.automation_bucket.as_str()),
            ("Artefacts Bucket", names.artefact_bucket.as_str()),
            ("Templates", self.config.templates_dir.display().to_string().as_str()),
        ]);
        self.say("Please verify all values above. To change them, set the environment variables and restart the setup.\n");
        ctx.names = Some(names);

        self.gate(GATE)?;
        Ok(next)
    }

    fn pre_roles(&self, ctx: &mut BootstrapContext, next: StepId) -> Flow {
        let scope = ctx.scope.as_deref().unwrap_or_default();
        self.say("The next step installs the core automation roles:");
        self.show_rows(&[
            (
                format!("{scope}CoreAutomationApiRead").as_str(),
                "Used by people to read through the API and database.",
            ),
            (
                format!("{scope}CoreAutomationApiWrite").as_str(),
                "Used by people to write through the API and database.",
            ),
            (
                format!("{scope}PipelineProvisioning").as_str(),
                "Used by the automation functions to provision resources.",
            ),
            (
                format!("{scope}PipelineControl").as_str(),
                "Used by the automation functions to invoke other functions.",
            ),
        ]);
        self.gate(GATE)?;
        Ok(next)
    }

    async fn deploy_roles(&mut self, ctx: &mut BootstrapContext, next: StepId) -> Flow {
        let request = stacks::roles_stack(
            self.config,
            owner(ctx)?,
            require(&ctx.names, "resource names")?,
        );
        self.deploy_stack(ctx, request).await?;

        self.say("\nComplete!\n");
        self.gate(GATE)?;
        Ok(next)
    }

    fn pre_database(&self, ctx: &mut BootstrapContext, next: StepId) -> Flow {
        let names = require(&ctx.names, "resource names")?;
        self.say("The next step installs the core automation database tables:");
        self.show_rows(&[
            (names.clients_table.as_str(), "Client facts. A client is an organization."),
            (names.zones_table.as_str(), "Zone facts. A zone is where applications are deployed."),
            (names.portfolios_table.as_str(), "Portfolio facts. A portfolio is a business application."),
            (names.apps_table.as_str(), "App facts. An app is one deployment within a portfolio."),
            (names.items_table.as_str(), "Deployment items. Unique to this client."),
            (names.events_table.as_str(), "Deployment events. Unique to this client."),
        ]);
        self.gate(GATE)?;
        Ok(next)
    }

    async fn deploy_database(&mut self, ctx: &mut BootstrapContext, next: StepId) -> Flow {
        let names = require(&ctx.names, "resource names")?;
        let facts = stacks::db_facts_stack(self.config, owner(ctx)?, names);
        let items = stacks::db_items_stack(self.config, owner(ctx)?, names);

        self.deploy_stack(ctx, facts).await?;
        self.deploy_stack(ctx, items).await?;

        self.say("\nThe database is deployed!\n");
        self.gate(GATE)?;
        Ok(next)
    }

    fn pre_storage(&self, ctx: &mut BootstrapContext, next: StepId) -> Flow {
        let names = require(&ctx.names, "resource names")?;
        self.say("The next step installs the core automation storage buckets.");
        self.say("Skip it if you only run the automation container with shared storage.\n");
        self.show_rows(&[
            (
                "Automation Account",
                ctx.automation_account.as_deref().unwrap_or_default(),
            ),
            ("Bucket Region", self.config.bucket_region()),
            ("Packages Bucket", names.automation_bucket.as_str()),
            ("Artefacts Bucket", names.artefact_bucket.as_str()),
            ("Use S3", if self.config.use_s3 { "true" } else { "false" }),
        ]);

        let answer = self.prompt.confirm(
            "Press Enter to continue, S to skip, or X to abort.",
            &[ENTER, "x", "s"],
            ENTER,
        )?;
        if answer.eq_ignore_ascii_case("x") {
            return Err(Halt::Abort);
        }
        if answer.eq_ignore_ascii_case("s") {
            return Ok(StepId::Done);
        }
        Ok(next)
    }

    async fn deploy_storage(&mut self, ctx: &mut BootstrapContext, next: StepId) -> Flow {
        let organization = require(&ctx.organization, "organization")?;
        let request = stacks::storage_stack(
            self.config,
            owner(ctx)?,
            require(&ctx.names, "resource names")?,
            &organization.id,
        );
        self.deploy_stack(ctx, request).await?;

        self.say("\nComplete!\n");
        self.gate(GATE)?;
        Ok(next)
    }

    fn done(&self, next: StepId) -> Flow {
        self.output.success("Setup is complete");
        Ok(next)
    }

    async fn deploy_stack(
        &mut self,
        ctx: &mut BootstrapContext,
        request: Result<StackDeploymentRequest, DeployError>,
    ) -> Result<(), Halt> {
        let request = request.map_err(|e| Halt::Failed(e.to_string()))?;
        self.say(&format!(
            "Deploying CloudFormation stack {} in {}",
            request.stack_name, request.region
        ));

        let deployer = Deployer::new(
            self.cfn,
            self.config.stack_options(),
            self.prompt,
            self.output,
        );
        let outcome = deployer
            .reconcile(&request)
            .await
            .map_err(|e| Halt::Failed(e.to_string()))?;

        self.output.outcome(&outcome);
        ctx.outcomes.push(outcome.clone());

        match outcome {
            DeployOutcome::Failed { failure, .. } => Err(Halt::Failed(failure.message)),
            DeployOutcome::Aborted { stack } => {
                self.diagnostics.warn(Warning::change_set_retained(&stack));
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
