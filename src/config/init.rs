// ABOUTME: Config scaffolding for new installs.
// ABOUTME: Creates coreauto.yml template files.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::CONFIG_FILENAME;

/// Write a starter `coreauto.yml` into `dir` and return its path.
pub fn init_config(
    dir: &Path,
    client: Option<&str>,
    automation_account: Option<&str>,
    force: bool,
) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let client = client.unwrap_or("my-client");
    if client.is_empty()
        || !client
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(Error::InvalidConfig(format!(
            "client '{}' must be a lowercase slug",
            client
        )));
    }

    if let Some(account) = automation_account
        .filter(|a| a.len() != 12 || !a.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(Error::InvalidConfig(format!(
            "automation account '{}' must be a 12-digit AWS account id",
            account
        )));
    }

    let yaml = generate_template_yaml(client, automation_account.unwrap_or("123456789012"));
    std::fs::write(&config_path, yaml)?;

    Ok(config_path)
}

fn generate_template_yaml(client: &str, automation_account: &str) -> String {
    format!(
        r#"client: {client}
automation_account: "{automation_account}"
region: us-east-1
# scope: dev-
# bucket_region: us-east-1
# dynamodb_region: us-east-1
# automation_role_arn: arn:aws:iam::{automation_account}:role/PipelineProvisioning
templates_dir: templates

wait:
  max_wait: 30m
  poll_interval: 5s

retry:
  max_attempts: 4
  base_delay: 1s
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn template_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = init_config(dir.path(), Some("acme"), Some("210987654321"), false).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.client.as_deref(), Some("acme"));
        assert_eq!(config.automation_account.as_deref(), Some("210987654321"));
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), None, None, false).unwrap();

        let err = init_config(dir.path(), None, None, false).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
        assert!(init_config(dir.path(), None, None, true).is_ok());
    }

    #[test]
    fn rejects_bad_account() {
        let dir = tempfile::tempdir().unwrap();
        let err = init_config(dir.path(), Some("acme"), Some("12ab"), false).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
