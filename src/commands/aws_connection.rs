// ABOUTME: Shared helper for building AWS clients from configuration.
// ABOUTME: Assumes the automation role once when one is configured.

use coreauto::config::Config;
use coreauto::credentials::CredentialProvider;
use coreauto::error::Result;
use coreauto::output::Output;
use coreauto::provider::{AwsAccount, AwsCloudFormation, AwsSession};

/// Clients for the account checks and for CloudFormation.
pub struct AwsClients {
    /// Uses the operator's own credentials.
    pub account: AwsAccount,
    /// Uses the automation role when configured.
    pub cfn: AwsCloudFormation,
}

/// Load the operator's session and, if configured, the automation role session.
pub async fn connect(config: &Config, output: &Output) -> Result<AwsClients> {
    let profile = config.resolved_profile();
    let session = AwsSession::load(Some(&profile), &config.region).await;
    tracing::debug!(
        "Loaded AWS profile {} for region {}",
        profile,
        session.region().unwrap_or("<unset>")
    );

    let account = AwsAccount::new(&session);

    let cfn_session = match &config.automation_role_arn {
        None => session,
        Some(role_arn) => {
            output.progress(&format!("Assuming role {}...", role_arn));
            let credentials = CredentialProvider::new(AwsAccount::new(&session), role_arn.as_str());
            session.with_credentials(credentials.get_or_assume().await?)
        }
    };

    Ok(AwsClients {
        account,
        cfn: AwsCloudFormation::new(&cfn_session),
    })
}
