// ABOUTME: A single deployable CloudFormation unit.
// ABOUTME: Validated locally before any provider call is attempted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::provider::{ChangeSetInput, StackInput};
use crate::types::StackName;

use super::DeployError;

/// One stack to reconcile: name, template, parameters, tags and region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDeploymentRequest {
    pub stack_name: StackName,
    pub template: PathBuf,
    pub parameters: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub region: String,
}

impl StackDeploymentRequest {
    /// Build a request, rejecting an empty or malformed stack name.
    pub fn new(
        stack_name: &str,
        template: impl Into<PathBuf>,
        region: impl Into<String>,
    ) -> Result<Self, DeployError> {
        let stack_name =
            StackName::new(stack_name).map_err(|e| DeployError::InvalidRequest(e.to_string()))?;
        Ok(Self {
            stack_name,
            template: template.into(),
            parameters: BTreeMap::new(),
            tags: BTreeMap::new(),
            region: region.into(),
        })
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn parameters<I, K, V>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.parameters
            .extend(parameters.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn tags<I, K, V>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.tags
            .extend(tags.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Check the request and load the template body.
    pub fn prepare(&self) -> Result<PreparedStack, DeployError> {
        if self.template.as_os_str().is_empty() {
            return Err(DeployError::InvalidRequest(
                "a template file must be provided".to_string(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(DeployError::InvalidRequest(
                "a target region must be provided".to_string(),
            ));
        }

        let template_body = read_template(&self.template)?;
        Ok(PreparedStack {
            request: self.clone(),
            template_body,
        })
    }
}

fn read_template(path: &Path) -> Result<String, DeployError> {
    if !path.is_file() {
        return Err(DeployError::TemplateNotFound(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|source| DeployError::TemplateRead {
        path: path.to_path_buf(),
        source,
    })
}

/// A validated request with its template body loaded.
#[derive(Debug, Clone)]
pub struct PreparedStack {
    pub request: StackDeploymentRequest,
    pub template_body: String,
}

impl PreparedStack {
    pub fn stack_name(&self) -> &StackName {
        &self.request.stack_name
    }

    pub fn region(&self) -> &str {
        &self.request.region
    }

    pub fn stack_input(&self) -> StackInput {
        StackInput {
            stack_name: self.request.stack_name.to_string(),
            template_body: self.template_body.clone(),
            parameters: self.request.parameters.clone(),
            tags: self.request.tags.clone(),
        }
    }

    pub fn change_set_input(&self) -> ChangeSetInput {
        ChangeSetInput {
            change_set_name: self.request.stack_name.change_set_name(),
            stack: self.stack_input(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stack_name_is_rejected() {
        let err = StackDeploymentRequest::new("", "core-roles.yaml", "ap-southeast-1").unwrap_err();
        assert!(matches!(err, DeployError::InvalidRequest(_)));
    }

    #[test]
    fn missing_template_is_rejected() {
        let request =
            StackDeploymentRequest::new("core-automation-roles", "/nonexistent/roles.yaml", "us-east-1")
                .unwrap();
        let err = request.prepare().unwrap_err();
        assert!(matches!(err, DeployError::TemplateNotFound(_)));
    }

    #[test]
    fn empty_template_path_is_rejected() {
        let request = StackDeploymentRequest::new("core-automation-roles", "", "us-east-1").unwrap();
        assert!(matches!(
            request.prepare().unwrap_err(),
            DeployError::InvalidRequest(_)
        ));
    }

    #[test]
    fn prepare_loads_template_and_builds_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roles.yaml");
        std::fs::write(&path, "Resources: {}\n").unwrap();

        let prepared = StackDeploymentRequest::new("core-automation-roles", &path, "us-east-1")
            .unwrap()
            .parameter("BucketName", "acme-core-automation-us-east-1")
            .tags([("Client", "acme")])
            .prepare()
            .unwrap();

        let input = prepared.change_set_input();
        assert_eq!(input.change_set_name, "core-automation-roles-change-set");
        assert_eq!(input.stack.template_body, "Resources: {}\n");
        assert_eq!(input.stack.tags.get("Client"), Some(&"acme".to_string()));
    }
}
