// ABOUTME: Environment variable overrides for configuration values.
// ABOUTME: The operator's shell wins over the config file for every listed setting.

use super::Config;

pub const ENV_CLIENT: &str = "CLIENT";
pub const ENV_SCOPE: &str = "SCOPE";
pub const ENV_AUTOMATION_ACCOUNT: &str = "AUTOMATION_ACCOUNT";
pub const ENV_AWS_PROFILE: &str = "AWS_PROFILE";
pub const ENV_AWS_REGION: &str = "AWS_REGION";
pub const ENV_BUCKET_REGION: &str = "BUCKET_REGION";
pub const ENV_BUCKET_NAME: &str = "BUCKET_NAME";
pub const ENV_ARTEFACT_BUCKET_NAME: &str = "ARTEFACT_BUCKET_NAME";
pub const ENV_DYNAMODB_REGION: &str = "DYNAMODB_REGION";
pub const ENV_AUTOMATION_ROLE_ARN: &str = "AUTOMATION_ROLE_ARN";
pub const ENV_USE_S3: &str = "USE_S3";

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Overlay environment variables onto a loaded config.
///
/// Empty variables are ignored. `AWS_PROFILE` is not copied here; see
/// [`Config::resolved_profile`].
pub fn apply_env_overrides(config: &mut Config) {
    let optional: [(&str, &mut Option<String>); 7] = [
        (ENV_CLIENT, &mut config.client),
        (ENV_AUTOMATION_ACCOUNT, &mut config.automation_account),
        (ENV_BUCKET_REGION, &mut config.bucket_region),
        (ENV_BUCKET_NAME, &mut config.bucket_name),
        (ENV_ARTEFACT_BUCKET_NAME, &mut config.artefact_bucket_name),
        (ENV_DYNAMODB_REGION, &mut config.dynamodb_region),
        (ENV_AUTOMATION_ROLE_ARN, &mut config.automation_role_arn),
    ];
    for (name, slot) in optional {
        if let Some(value) = var(name) {
            *slot = Some(value);
        }
    }

    // SCOPE may legitimately be set to the empty string.
    if let Ok(scope) = std::env::var(ENV_SCOPE) {
        config.scope = scope.trim().to_string();
    }
    if let Some(region) = var(ENV_AWS_REGION) {
        config.region = region;
    }
    if let Some(use_s3) = var(ENV_USE_S3) {
        config.use_s3 = matches!(use_s3.to_ascii_lowercase().as_str(), "true" | "1" | "yes");
    }
}
