// ABOUTME: AWS SDK implementation of the provider traits.
// ABOUTME: Wraps CloudFormation, STS, IAM and Organizations clients with error mapping.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_sdk_cloudformation as cfn;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cloudformation::types::{Capability, ChangeSetType, Parameter, Tag};
use parking_lot::Mutex;

use super::types::{
    CallerIdentity, ChangeDetail, ChangeSetDescription, ChangeSetInput, ChangeSetState,
    ExecutionState, OrganizationInfo, ResourceChange, StackInput, StackSummary,
};
use super::{AccountOps, CloudFormationOps, ProviderError};
use crate::credentials::{AssumedCredentials, RoleAssumer};

/// Name attached to credentials built from an assumed role.
const ASSUMED_PROVIDER_NAME: &str = "coreauto-assume-role";

/// Managed policy that marks an IAM user as an administrator.
const ADMIN_POLICY_NAME: &str = "AdministratorAccess";

// =============================================================================
// Session
// =============================================================================

/// Loaded AWS configuration shared by every client.
#[derive(Clone)]
pub struct AwsSession {
    config: SdkConfig,
}

impl AwsSession {
    /// Resolve credentials and region from the environment and profile files.
    pub async fn load(profile: Option<&str>, region: &str) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        Self {
            config: loader.load().await,
        }
    }

    /// Region the session was loaded for.
    pub fn region(&self) -> Option<&str> {
        self.config.region().map(|r| r.as_ref())
    }

    /// A copy of this session that signs requests with the given credentials.
    pub fn with_credentials(&self, credentials: &AssumedCredentials) -> Self {
        let expiry = credentials.expires_at.map(std::time::SystemTime::from);
        let credentials = aws_credential_types::Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            Some(credentials.session_token.clone()),
            expiry,
            ASSUMED_PROVIDER_NAME,
        );
        let config = self
            .config
            .to_builder()
            .credentials_provider(SharedCredentialsProvider::new(credentials))
            .build();
        Self { config }
    }
}

// =============================================================================
// Field Helpers
// =============================================================================

/// Reads an SDK string or enum field as text.
///
/// Depending on whether the service model marks a member as required, the
/// SDK accessor returns `&T` or `Option<&T>`; both read the same here.
trait FieldText {
    fn text(&self) -> String;

    fn opt_text(&self) -> Option<String> {
        let text = self.text();
        (!text.is_empty()).then_some(text)
    }
}

impl<T: AsRef<str> + ?Sized> FieldText for Option<&T> {
    fn text(&self) -> String {
        self.map(|v| v.as_ref().to_string()).unwrap_or_default()
    }
}

impl<T: AsRef<str> + ?Sized> FieldText for &T {
    fn text(&self) -> String {
        (*self).as_ref().to_string()
    }
}

/// Finishes an SDK builder, which returns either the value or a `Result`
/// depending on whether the shape has required members.
trait Built<T> {
    fn built(self) -> Result<T, ProviderError>;
}

macro_rules! impl_built {
    ($($ty:ty),*) => {
        $(
            impl Built<$ty> for $ty {
                fn built(self) -> Result<$ty, ProviderError> {
                    Ok(self)
                }
            }

            impl Built<$ty> for Result<$ty, cfn::error::BuildError> {
                fn built(self) -> Result<$ty, ProviderError> {
                    self.map_err(|e| ProviderError::InvalidRequest(e.to_string()))
                }
            }
        )*
    };
}

impl_built!(Tag, Parameter);

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_sdk_error<E, R>(err: SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::ServiceError(ctx) => {
            let service_err = ctx.err();
            let code = service_err.code().unwrap_or("Unknown").to_string();
            let message = service_err
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
            ProviderError::api(code, message)
        }
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            ProviderError::Transport(DisplayErrorContext(&err).to_string())
        }
        _ => ProviderError::InvalidRequest(DisplayErrorContext(&err).to_string()),
    }
}

/// CloudFormation reports missing stacks as a `ValidationError` and missing
/// change sets as `ChangeSetNotFound`; fold both into `NotFound`.
fn not_found_as(err: ProviderError, what: &str) -> ProviderError {
    match err {
        ProviderError::Api { code, .. } if code.starts_with("ChangeSetNotFound") => {
            ProviderError::NotFound(what.to_string())
        }
        ProviderError::Api { code, message }
            if code == "ValidationError" && message.contains("does not exist") =>
        {
            ProviderError::NotFound(what.to_string())
        }
        other => other,
    }
}

fn parameters(input: &StackInput) -> Result<Vec<Parameter>, ProviderError> {
    input
        .parameters
        .iter()
        .map(|(k, v)| {
            Parameter::builder()
                .parameter_key(k)
                .parameter_value(v)
                .build()
                .built()
        })
        .collect()
}

fn tags(input: &StackInput) -> Result<Vec<Tag>, ProviderError> {
    input
        .tags
        .iter()
        .map(|(k, v)| Tag::builder().key(k).value(v).build().built())
        .collect()
}

fn stack_summary(stack: &cfn::types::Stack) -> StackSummary {
    StackSummary {
        name: stack.stack_name().text(),
        status: stack.stack_status().text(),
        status_reason: stack.stack_status_reason().opt_text(),
    }
}

fn resource_change(change: &cfn::types::Change) -> Option<ResourceChange> {
    let rc = change.resource_change()?;
    let details = rc
        .details()
        .iter()
        .map(|detail| {
            let target = detail.target();
            ChangeDetail {
                change_source: detail.change_source().text(),
                target_name: target.and_then(|t| t.name().opt_text()),
                target_attribute: target.and_then(|t| t.attribute().opt_text()),
            }
        })
        .collect();

    Some(ResourceChange {
        action: rc.action().text(),
        logical_id: rc.logical_resource_id().text(),
        physical_id: rc.physical_resource_id().text(),
        resource_type: rc.resource_type().text(),
        replacement: rc.replacement().text(),
        details,
    })
}

// =============================================================================
// CloudFormation
// =============================================================================

/// CloudFormation backed by the AWS SDK, with one client per region.
pub struct AwsCloudFormation {
    config: SdkConfig,
    clients: Mutex<HashMap<String, cfn::Client>>,
}

impl AwsCloudFormation {
    pub fn new(session: &AwsSession) -> Self {
        Self {
            config: session.config.clone(),
            clients: Mutex::new(HashMap::new()),
        }
    }

    fn client(&self, region: &str) -> cfn::Client {
        let mut clients = self.clients.lock();
        clients
            .entry(region.to_string())
            .or_insert_with(|| {
                let conf = cfn::config::Builder::from(&self.config)
                    .region(Region::new(region.to_string()))
                    .build();
                cfn::Client::from_conf(conf)
            })
            .clone()
    }
}

#[async_trait]
impl CloudFormationOps for AwsCloudFormation {
    async fn list_stacks(&self, region: &str) -> Result<Vec<StackSummary>, ProviderError> {
        let client = self.client(region);
        let mut stacks = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = client
                .describe_stacks()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(map_sdk_error)?;

            stacks.extend(output.stacks().iter().map(stack_summary));

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(stacks)
    }

    async fn describe_stack(
        &self,
        region: &str,
        stack_name: &str,
    ) -> Result<StackSummary, ProviderError> {
        let output = self
            .client(region)
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| not_found_as(map_sdk_error(e), stack_name))?;

        output
            .stacks()
            .first()
            .map(stack_summary)
            .ok_or_else(|| ProviderError::NotFound(stack_name.to_string()))
    }

    async fn validate_template(
        &self,
        region: &str,
        template_body: &str,
    ) -> Result<(), ProviderError> {
        self.client(region)
            .validate_template()
            .template_body(template_body)
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn create_stack(
        &self,
        region: &str,
        input: &StackInput,
    ) -> Result<String, ProviderError> {
        let output = self
            .client(region)
            .create_stack()
            .stack_name(&input.stack_name)
            .template_body(&input.template_body)
            .set_parameters(Some(parameters(input)?))
            .set_tags(Some(tags(input)?))
            .capabilities(Capability::CapabilityIam)
            .capabilities(Capability::CapabilityNamedIam)
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(output.stack_id().text())
    }

    async fn delete_stack(&self, region: &str, stack_name: &str) -> Result<(), ProviderError> {
        self.client(region)
            .delete_stack()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn create_change_set(
        &self,
        region: &str,
        input: &ChangeSetInput,
    ) -> Result<String, ProviderError> {
        let stack = &input.stack;
        let output = self
            .client(region)
            .create_change_set()
            .stack_name(&stack.stack_name)
            .change_set_name(&input.change_set_name)
            .change_set_type(ChangeSetType::Update)
            .template_body(&stack.template_body)
            .set_parameters(Some(parameters(stack)?))
            .set_tags(Some(tags(stack)?))
            .capabilities(Capability::CapabilityIam)
            .capabilities(Capability::CapabilityNamedIam)
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(output.id().text())
    }

    async fn describe_change_set(
        &self,
        region: &str,
        stack_name: &str,
        change_set_name: &str,
    ) -> Result<ChangeSetDescription, ProviderError> {
        let client = self.client(region);
        let mut next_token: Option<String> = None;
        let mut description: Option<ChangeSetDescription> = None;

        loop {
            let output = client
                .describe_change_set()
                .stack_name(stack_name)
                .change_set_name(change_set_name)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| not_found_as(map_sdk_error(e), change_set_name))?;

            let changes = output.changes().iter().filter_map(resource_change);
            match description.as_mut() {
                Some(existing) => existing.changes.extend(changes),
                None => {
                    description = Some(ChangeSetDescription {
                        name: change_set_name.to_string(),
                        stack_name: stack_name.to_string(),
                        state: ChangeSetState::parse(&output.status().text()),
                        execution: ExecutionState::parse(&output.execution_status().text()),
                        status_reason: output.status_reason().opt_text(),
                        changes: changes.collect(),
                    });
                }
            }

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        description.ok_or_else(|| ProviderError::NotFound(change_set_name.to_string()))
    }

    async fn delete_change_set(
        &self,
        region: &str,
        stack_name: &str,
        change_set_name: &str,
    ) -> Result<(), ProviderError> {
        self.client(region)
            .delete_change_set()
            .stack_name(stack_name)
            .change_set_name(change_set_name)
            .send()
            .await
            .map_err(|e| not_found_as(map_sdk_error(e), change_set_name))?;
        Ok(())
    }

    async fn execute_change_set(
        &self,
        region: &str,
        stack_name: &str,
        change_set_name: &str,
    ) -> Result<(), ProviderError> {
        self.client(region)
            .execute_change_set()
            .stack_name(stack_name)
            .change_set_name(change_set_name)
            .send()
            .await
            .map_err(|e| not_found_as(map_sdk_error(e), change_set_name))?;
        Ok(())
    }
}

// =============================================================================
// Account (STS, IAM, Organizations)
// =============================================================================

/// Account-level AWS operations used by the bootstrap wizard.
pub struct AwsAccount {
    sts: aws_sdk_sts::Client,
    iam: aws_sdk_iam::Client,
    organizations: aws_sdk_organizations::Client,
}

impl AwsAccount {
    pub fn new(session: &AwsSession) -> Self {
        Self {
            sts: aws_sdk_sts::Client::new(&session.config),
            iam: aws_sdk_iam::Client::new(&session.config),
            organizations: aws_sdk_organizations::Client::new(&session.config),
        }
    }
}

#[async_trait]
impl AccountOps for AwsAccount {
    async fn aws_cli_version(&self) -> Result<String, ProviderError> {
        let output = tokio::process::Command::new("aws")
            .arg("--version")
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ProviderError::NotFound("aws cli".to_string()),
                _ => ProviderError::Transport(format!("failed to run aws cli: {}", e)),
            })?;

        // Older CLI versions print the version on stderr.
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout.is_empty() {
            Ok(String::from_utf8_lossy(&output.stderr).trim().to_string())
        } else {
            Ok(stdout)
        }
    }

    async fn caller_identity(&self) -> Result<CallerIdentity, ProviderError> {
        let output = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(CallerIdentity {
            account: output.account().text(),
            arn: output.arn().text(),
            user_id: output.user_id().text(),
        })
    }

    async fn iam_user_name(&self) -> Result<String, ProviderError> {
        let output = self.iam.get_user().send().await.map_err(map_sdk_error)?;
        let user: Option<&aws_sdk_iam::types::User> = output.user().into();
        user.map(|u| u.user_name().text())
            .ok_or_else(|| ProviderError::NotFound("iam user".to_string()))
    }

    async fn has_admin_privileges(&self, user_name: &str) -> Result<bool, ProviderError> {
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .iam
                .list_attached_user_policies()
                .user_name(user_name)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(map_sdk_error)?;

            if output
                .attached_policies()
                .iter()
                .any(|p| p.policy_name().text() == ADMIN_POLICY_NAME)
            {
                return Ok(true);
            }

            match output.marker() {
                Some(next) => marker = Some(next.to_string()),
                None => return Ok(false),
            }
        }
    }

    async fn organization(&self) -> Result<OrganizationInfo, ProviderError> {
        let output = self
            .organizations
            .describe_organization()
            .send()
            .await
            .map_err(|e| match map_sdk_error(e) {
                ProviderError::Api { code, .. } if code == "AWSOrganizationsNotInUseException" => {
                    ProviderError::NotFound("organization".to_string())
                }
                other => other,
            })?;

        let org = output
            .organization()
            .ok_or_else(|| ProviderError::NotFound("organization".to_string()))?;
        let master_account_id = org.master_account_id().text();

        let account = self
            .organizations
            .describe_account()
            .account_id(&master_account_id)
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(OrganizationInfo {
            id: org.id().text(),
            master_account_email: org.master_account_email().text(),
            master_account_name: account.account().and_then(|a| a.name().opt_text()).unwrap_or_default(),
            master_account_id,
        })
    }
}

#[async_trait]
impl RoleAssumer for AwsAccount {
    async fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> Result<AssumedCredentials, ProviderError> {
        let output = self
            .sts
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(session_name)
            .send()
            .await
            .map_err(map_sdk_error)?;

        let credentials = output.credentials().ok_or_else(|| {
            ProviderError::api("MissingCredentials", "assume role returned no credentials")
        })?;

        let expiration: Option<&aws_sdk_sts::primitives::DateTime> =
            credentials.expiration().into();

        Ok(AssumedCredentials {
            access_key_id: credentials.access_key_id().text(),
            secret_access_key: credentials.secret_access_key().text(),
            session_token: credentials.session_token().text(),
            expires_at: expiration
                .and_then(|dt| chrono::DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())),
        })
    }
}
