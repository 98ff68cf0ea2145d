// ABOUTME: Validate command implementation.
// ABOUTME: Checks a local template with CloudFormation without deploying it.

use std::path::Path;

use super::aws_connection::connect;
use coreauto::config::Config;
use coreauto::error::Result;
use coreauto::output::Output;
use coreauto::provider::{CloudFormationOps, with_retry};
use coreauto::stack::DeployError;

pub async fn validate(
    config: &Config,
    template: &Path,
    region: Option<String>,
    output: &Output,
) -> Result<i32> {
    if !template.is_file() {
        return Err(DeployError::TemplateNotFound(template.to_path_buf()).into());
    }
    let body = std::fs::read_to_string(template).map_err(|source| DeployError::TemplateRead {
        path: template.to_path_buf(),
        source,
    })?;
    let region = region.unwrap_or_else(|| config.region.clone());

    let clients = connect(config, output).await?;
    with_retry(&config.retry, "validate_template", || {
        clients.cfn.validate_template(&region, &body)
    })
    .await?;

    output.success(&format!("Template {} is valid", template.display()));
    Ok(0)
}
