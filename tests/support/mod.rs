// ABOUTME: Test support utilities.
// ABOUTME: In-memory CloudFormation and account fakes that record every call.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use coreauto::provider::{
    AccountOps, CallerIdentity, ChangeSetDescription, ChangeSetInput, ChangeSetState,
    CloudFormationOps, ExecutionState, OrganizationInfo, ProviderError, ResourceChange,
    RetryPolicy, StackInput, StackSummary,
};
use coreauto::stack::{StackOptions, WaitConfig};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("coreauto=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Options that never sleep and give up quickly.
#[allow(dead_code)]
pub fn fast_options() -> StackOptions {
    StackOptions {
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::ZERO,
        },
        wait: WaitConfig {
            max_wait: Duration::from_secs(2),
            poll_interval: Duration::ZERO,
        },
    }
}

/// Write a template into `dir` and return its path.
#[allow(dead_code)]
pub fn write_template(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, "AWSTemplateFormatVersion: '2010-09-09'\nResources: {}\n").unwrap();
    path
}

#[allow(dead_code)]
pub const NO_CHANGES_REASON: &str = "The submitted information didn't contain changes. Submit different information to create a change set.";

#[derive(Debug, Clone)]
struct FakeStack {
    status: String,
    reason: Option<String>,
}

#[derive(Default)]
struct FakeState {
    stacks: HashMap<String, FakeStack>,
    change_sets: HashMap<String, ChangeSetDescription>,
    /// Changes the next change set will report; `None` means no changes.
    next_changes: Option<Vec<ResourceChange>>,
    /// Reason the next change set fails with, regardless of changes.
    next_change_set_failure: Option<String>,
    create_result: Option<(String, Option<String>)>,
    update_result: Option<String>,
    /// Statuses a stack moves through after execute, one per describe.
    update_sequence: VecDeque<String>,
    /// Stack being updated by the last execute.
    updating: Option<String>,
    /// Describes that still see the state from before execute.
    execute_lag: u32,
    lag_remaining: u32,
    executing: bool,
    throttle_lists: u32,
    calls: Vec<String>,
}

impl FakeState {
    /// Returns true while describes of `stack` should still see the old state.
    fn lagging(&mut self, stack: &str) -> bool {
        if !self.executing || self.updating.as_deref() != Some(stack) {
            return false;
        }
        if self.lag_remaining > 0 {
            self.lag_remaining -= 1;
            return true;
        }
        self.executing = false;
        self.change_sets.remove(stack);
        false
    }

    fn advance_update(&mut self, stack: &str) {
        if self.updating.as_deref() != Some(stack) {
            return;
        }
        if let Some(next) = self.update_sequence.pop_front() {
            if let Some(fake) = self.stacks.get_mut(stack) {
                fake.status = next;
            }
        }
    }
}

/// In-memory CloudFormation. Operations settle immediately unless told to lag.
#[derive(Default)]
pub struct FakeCloudFormation {
    state: Mutex<FakeState>,
}

#[allow(dead_code)]
impl FakeCloudFormation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stack(self, name: &str, status: &str) -> Self {
        self.state.lock().stacks.insert(
            name.to_string(),
            FakeStack {
                status: status.to_string(),
                reason: None,
            },
        );
        self
    }

    /// Leave a change set from an earlier run attached to `stack`.
    pub fn with_leftover_change_set(self, stack: &str) -> Self {
        let name = format!("{stack}-change-set");
        self.state.lock().change_sets.insert(
            stack.to_string(),
            ChangeSetDescription {
                name,
                stack_name: stack.to_string(),
                state: ChangeSetState::CreateComplete,
                execution: ExecutionState::Available,
                status_reason: None,
                changes: Vec::new(),
            },
        );
        self
    }

    pub fn with_changes(self, changes: Vec<ResourceChange>) -> Self {
        self.state.lock().next_changes = Some(changes);
        self
    }

    pub fn with_change_set_failure(self, reason: &str) -> Self {
        self.state.lock().next_change_set_failure = Some(reason.to_string());
        self
    }

    /// Make creates end in `status` instead of `CREATE_COMPLETE`.
    pub fn with_create_result(self, status: &str, reason: &str) -> Self {
        self.state.lock().create_result = Some((status.to_string(), Some(reason.to_string())));
        self
    }

    pub fn with_update_result(self, status: &str) -> Self {
        self.state.lock().update_result = Some(status.to_string());
        self
    }

    /// Statuses the stack reports after execute, one per describe; the
    /// last one sticks.
    pub fn with_update_sequence(self, statuses: &[&str]) -> Self {
        self.state.lock().update_sequence = statuses.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Make the first `n` describes after execute see the old state.
    pub fn with_execute_lag(self, n: u32) -> Self {
        self.state.lock().execute_lag = n;
        self
    }

    /// Throttle the first `n` list calls.
    pub fn with_throttled_lists(self, n: u32) -> Self {
        self.state.lock().throttle_lists = n;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Calls that change remote state, in order.
    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| {
                ["create_", "delete_", "execute_"]
                    .iter()
                    .any(|prefix| c.starts_with(prefix))
            })
            .collect()
    }

    pub fn stack_status(&self, name: &str) -> Option<String> {
        self.state.lock().stacks.get(name).map(|s| s.status.clone())
    }

    pub fn has_change_set(&self, stack: &str) -> bool {
        self.state.lock().change_sets.contains_key(stack)
    }

    fn record(&self, call: String) {
        self.state.lock().calls.push(call);
    }
}

fn stack_missing(name: &str) -> ProviderError {
    ProviderError::NotFound(format!("Stack with id {name} does not exist"))
}

#[async_trait]
impl CloudFormationOps for FakeCloudFormation {
    async fn list_stacks(&self, region: &str) -> Result<Vec<StackSummary>, ProviderError> {
        self.record(format!("list_stacks {region}"));
        let mut state = self.state.lock();
        if state.throttle_lists > 0 {
            state.throttle_lists -= 1;
            return Err(ProviderError::Throttled("Rate exceeded".to_string()));
        }
        Ok(state
            .stacks
            .iter()
            .map(|(name, stack)| StackSummary {
                name: name.clone(),
                status: stack.status.clone(),
                status_reason: stack.reason.clone(),
            })
            .collect())
    }

    async fn describe_stack(
        &self,
        _region: &str,
        stack_name: &str,
    ) -> Result<StackSummary, ProviderError> {
        self.record(format!("describe_stack {stack_name}"));
        let mut state = self.state.lock();
        if !state.lagging(stack_name) {
            state.advance_update(stack_name);
        }
        let stack = state
            .stacks
            .get(stack_name)
            .ok_or_else(|| stack_missing(stack_name))?;
        Ok(StackSummary {
            name: stack_name.to_string(),
            status: stack.status.clone(),
            status_reason: stack.reason.clone(),
        })
    }

    async fn validate_template(
        &self,
        _region: &str,
        template_body: &str,
    ) -> Result<(), ProviderError> {
        self.record("validate_template".to_string());
        if template_body.contains("INVALID") {
            return Err(ProviderError::api(
                "ValidationError",
                "Template format error: unsupported structure.",
            ));
        }
        Ok(())
    }

    async fn create_stack(&self, region: &str, input: &StackInput) -> Result<String, ProviderError> {
        self.record(format!("create_stack {}", input.stack_name));
        let mut state = self.state.lock();
        if state.stacks.contains_key(&input.stack_name) {
            return Err(ProviderError::api(
                "AlreadyExistsException",
                format!("Stack [{}] already exists", input.stack_name),
            ));
        }
        let (status, reason) = state
            .create_result
            .clone()
            .unwrap_or_else(|| ("CREATE_COMPLETE".to_string(), None));
        state
            .stacks
            .insert(input.stack_name.clone(), FakeStack { status, reason });
        Ok(format!(
            "arn:aws:cloudformation:{region}:123456789012:stack/{}/fake",
            input.stack_name
        ))
    }

    async fn delete_stack(&self, _region: &str, stack_name: &str) -> Result<(), ProviderError> {
        self.record(format!("delete_stack {stack_name}"));
        self.state.lock().stacks.remove(stack_name);
        Ok(())
    }

    async fn create_change_set(
        &self,
        region: &str,
        input: &ChangeSetInput,
    ) -> Result<String, ProviderError> {
        let stack = input.stack.stack_name.clone();
        self.record(format!("create_change_set {stack}"));
        let mut state = self.state.lock();
        if !state.stacks.contains_key(&stack) {
            return Err(stack_missing(&stack));
        }
        if state.change_sets.contains_key(&stack) {
            return Err(ProviderError::api(
                "AlreadyExistsException",
                format!("ChangeSet {} already exists", input.change_set_name),
            ));
        }

        let failure = state.next_change_set_failure.take();
        let description = match (failure, state.next_changes.take()) {
            (Some(reason), _) => ChangeSetDescription {
                name: input.change_set_name.clone(),
                stack_name: stack.clone(),
                state: ChangeSetState::Failed,
                execution: ExecutionState::Unavailable,
                status_reason: Some(reason),
                changes: Vec::new(),
            },
            (None, Some(changes)) if !changes.is_empty() => ChangeSetDescription {
                name: input.change_set_name.clone(),
                stack_name: stack.clone(),
                state: ChangeSetState::CreateComplete,
                execution: ExecutionState::Available,
                status_reason: None,
                changes,
            },
            (None, _) => ChangeSetDescription {
                name: input.change_set_name.clone(),
                stack_name: stack.clone(),
                state: ChangeSetState::Failed,
                execution: ExecutionState::Unavailable,
                status_reason: Some(NO_CHANGES_REASON.to_string()),
                changes: Vec::new(),
            },
        };
        state.change_sets.insert(stack.clone(), description);

        Ok(format!(
            "arn:aws:cloudformation:{region}:123456789012:changeSet/{}/fake",
            input.change_set_name
        ))
    }

    async fn describe_change_set(
        &self,
        _region: &str,
        stack_name: &str,
        change_set_name: &str,
    ) -> Result<ChangeSetDescription, ProviderError> {
        self.record(format!("describe_change_set {change_set_name}"));
        let mut state = self.state.lock();
        state.lagging(stack_name);
        state
            .change_sets
            .get(stack_name)
            .filter(|cs| cs.name == change_set_name)
            .cloned()
            .ok_or_else(|| {
                ProviderError::NotFound(format!("ChangeSet [{change_set_name}] does not exist"))
            })
    }

    async fn delete_change_set(
        &self,
        _region: &str,
        stack_name: &str,
        change_set_name: &str,
    ) -> Result<(), ProviderError> {
        self.record(format!("delete_change_set {change_set_name}"));
        self.state.lock().change_sets.remove(stack_name);
        Ok(())
    }

    async fn execute_change_set(
        &self,
        _region: &str,
        stack_name: &str,
        change_set_name: &str,
    ) -> Result<(), ProviderError> {
        self.record(format!("execute_change_set {change_set_name}"));
        let mut state = self.state.lock();
        if !state.change_sets.contains_key(stack_name) {
            return Err(ProviderError::NotFound(format!(
                "ChangeSet [{change_set_name}] does not exist"
            )));
        }
        if state.update_sequence.is_empty() {
            let last = state
                .update_result
                .clone()
                .unwrap_or_else(|| "UPDATE_COMPLETE".to_string());
            state.update_sequence.push_back(last);
        }
        state.updating = Some(stack_name.to_string());
        state.lag_remaining = state.execute_lag;
        state.executing = state.lag_remaining > 0;
        if !state.executing {
            state.change_sets.remove(stack_name);
            state.advance_update(stack_name);
        }
        Ok(())
    }
}

/// In-memory account facts for the bootstrap checks.
pub struct FakeAccount {
    pub cli_installed: bool,
    pub account: String,
    pub username: String,
    pub admin: bool,
    pub organization: Option<OrganizationInfo>,
    calls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FakeAccount {
    /// An administrator in account 123456789012 inside an organization.
    pub fn admin() -> Self {
        Self {
            cli_installed: true,
            account: "123456789012".to_string(),
            username: "bootstrap-admin".to_string(),
            admin: true,
            organization: Some(OrganizationInfo {
                id: "o-abc123".to_string(),
                master_account_id: "210987654321".to_string(),
                master_account_email: "aws@acme.example".to_string(),
                master_account_name: "acme-management".to_string(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().push(call.to_string());
    }
}

#[async_trait]
impl AccountOps for FakeAccount {
    async fn aws_cli_version(&self) -> Result<String, ProviderError> {
        self.record("aws_cli_version");
        if self.cli_installed {
            Ok("aws-cli/2.15.0 Python/3.11.6".to_string())
        } else {
            Err(ProviderError::Transport("aws: not found".to_string()))
        }
    }

    async fn caller_identity(&self) -> Result<CallerIdentity, ProviderError> {
        self.record("caller_identity");
        Ok(CallerIdentity {
            account: self.account.clone(),
            arn: format!("arn:aws:iam::{}:user/{}", self.account, self.username),
            user_id: "AIDAEXAMPLE".to_string(),
        })
    }

    async fn iam_user_name(&self) -> Result<String, ProviderError> {
        self.record("iam_user_name");
        Ok(self.username.clone())
    }

    async fn has_admin_privileges(&self, _user_name: &str) -> Result<bool, ProviderError> {
        self.record("has_admin_privileges");
        Ok(self.admin)
    }

    async fn organization(&self) -> Result<OrganizationInfo, ProviderError> {
        self.record("organization");
        self.organization.clone().ok_or_else(|| {
            ProviderError::NotFound("AWS Organizations is not in use".to_string())
        })
    }
}
