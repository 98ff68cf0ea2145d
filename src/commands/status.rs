// ABOUTME: Status command implementation.
// ABOUTME: Shows how the reconciler currently sees a stack.

use super::aws_connection::connect;
use coreauto::config::Config;
use coreauto::error::{Error, Result};
use coreauto::output::Output;
use coreauto::stack::StackInspector;
use coreauto::types::StackName;

pub async fn status(
    config: &Config,
    stack_name: &str,
    region: Option<String>,
    output: &Output,
) -> Result<i32> {
    let name = StackName::new(stack_name).map_err(|e| Error::InvalidArgument(e.to_string()))?;
    let region = region.unwrap_or_else(|| config.region.clone());

    let clients = connect(config, output).await?;
    let options = config.stack_options();
    let snapshot = StackInspector::new(&clients.cfn, &options)
        .snapshot(&name, &region)
        .await?;

    output.stack_status(name.as_str(), &region, &snapshot);
    Ok(0)
}
