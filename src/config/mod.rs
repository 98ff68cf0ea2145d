// ABOUTME: Configuration types and parsing for coreauto.yml.
// ABOUTME: Handles YAML parsing, environment overrides, and derived resource names.

mod env;
mod init;
mod names;

pub use env::{ENV_AWS_PROFILE, apply_env_overrides};
pub use init::init_config;
pub use names::{ResourceNames, TableNames};

use crate::error::{Error, Result};
use crate::provider::RetryPolicy;
use crate::stack::{StackOptions, WaitConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "coreauto.yml";
pub const CONFIG_FILENAME_ALT: &str = "coreauto.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".coreauto/config.yml";

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Short lowercase slug of the organization, e.g. `acme`.
    #[serde(default)]
    pub client: Option<String>,

    /// Prefix for every resource name. Empty unless several installs share an account.
    #[serde(default)]
    pub scope: String,

    #[serde(default)]
    pub automation_account: Option<String>,

    #[serde(default)]
    pub aws_profile: Option<String>,

    /// Master region; roles are deployed here.
    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default)]
    pub bucket_region: Option<String>,

    #[serde(default)]
    pub dynamodb_region: Option<String>,

    #[serde(default)]
    pub bucket_name: Option<String>,

    #[serde(default)]
    pub artefact_bucket_name: Option<String>,

    #[serde(default)]
    pub tables: TableNames,

    /// Where the bootstrap templates live.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,

    /// Role to assume in the automation account; ambient credentials when unset.
    #[serde(default)]
    pub automation_role_arn: Option<String>,

    #[serde(default)]
    pub use_s3: bool,

    #[serde(default)]
    pub wait: WaitConfig,

    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client: None,
            scope: String::new(),
            automation_account: None,
            aws_profile: None,
            region: default_region(),
            bucket_region: None,
            dynamodb_region: None,
            bucket_name: None,
            artefact_bucket_name: None,
            tables: TableNames::default(),
            templates_dir: default_templates_dir(),
            automation_role_arn: None,
            use_s3: false,
            wait: WaitConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Discover the config file, falling back to defaults, then apply the environment.
    ///
    /// The platform can be driven entirely from environment variables, so a
    /// missing file is not an error here.
    pub fn resolve(dir: &Path) -> Result<Self> {
        let mut config = match Self::discover(dir) {
            Ok(config) => config,
            Err(Error::ConfigNotFound(_)) => {
                tracing::debug!("No config file in {}; using defaults", dir.display());
                Self::default()
            }
            Err(e) => return Err(e),
        };
        apply_env_overrides(&mut config);
        Ok(config)
    }

    pub fn bucket_region(&self) -> &str {
        self.bucket_region.as_deref().unwrap_or(&self.region)
    }

    pub fn dynamodb_region(&self) -> &str {
        self.dynamodb_region.as_deref().unwrap_or(&self.region)
    }

    pub fn client(&self) -> Result<&str> {
        non_empty(self.client.as_deref()).ok_or(Error::MissingSetting("CLIENT"))
    }

    pub fn automation_account(&self) -> Result<&str> {
        non_empty(self.automation_account.as_deref())
            .ok_or(Error::MissingSetting("AUTOMATION_ACCOUNT"))
    }

    /// The profile the AWS SDK will use: `AWS_PROFILE`, then the file, then `default`.
    pub fn resolved_profile(&self) -> String {
        std::env::var(ENV_AWS_PROFILE)
            .ok()
            .filter(|p| !p.is_empty())
            .or_else(|| self.aws_profile.clone())
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string())
    }

    pub fn stack_options(&self) -> StackOptions {
        StackOptions {
            retry: self.retry,
            wait: self.wait,
        }
    }

    /// Bucket and table names, derived from client, scope and regions unless set explicitly.
    pub fn resource_names(&self) -> Result<ResourceNames> {
        ResourceNames::derive(self)
    }

    pub fn template_path(&self, file: &str) -> PathBuf {
        self.templates_dir.join(file)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn empty_yaml_uses_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.bucket_region(), "us-east-1");
    }

    #[test]
    fn durations_are_humantime() {
        let config = Config::from_yaml(
            "wait:\n  max_wait: 10m\n  poll_interval: 2s\nretry:\n  max_attempts: 2\n",
        )
        .unwrap();
        assert_eq!(config.wait.max_wait, Duration::from_secs(600));
        assert_eq!(config.wait.poll_interval, Duration::from_secs(2));
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.base_delay, Duration::from_secs(1));
    }

    #[test]
    fn blank_client_is_missing() {
        let config = Config {
            client: Some("  ".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            config.client(),
            Err(Error::MissingSetting("CLIENT"))
        ));
    }
}
