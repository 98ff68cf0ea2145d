// ABOUTME: State accumulated while the bootstrap wizard runs.
// ABOUTME: Each step fills in the fields that later steps read.

use crate::config::ResourceNames;
use crate::provider::OrganizationInfo;
use crate::stack::DeployOutcome;

use super::StepId;

/// Facts gathered by the bootstrap steps. Fields start empty.
#[derive(Debug, Clone, Default)]
pub struct BootstrapContext {
    /// Profile named on the command line or in the config file.
    pub supplied_profile: Option<String>,
    pub client: Option<String>,
    pub scope: Option<String>,
    pub automation_account: Option<String>,
    /// Profile the SDK actually resolved.
    pub aws_profile: Option<String>,
    pub username: Option<String>,
    pub current_account: Option<String>,
    pub region: Option<String>,
    pub organization: Option<OrganizationInfo>,
    pub names: Option<ResourceNames>,
    pub outcomes: Vec<DeployOutcome>,
    /// Steps executed so far, in order.
    pub visited: Vec<StepId>,
}

impl BootstrapContext {
    pub fn new(supplied_profile: Option<String>) -> Self {
        Self {
            supplied_profile,
            ..Self::default()
        }
    }
}

/// Borrow a field that an earlier step must have set.
pub(crate) fn require<'a, T>(value: &'a Option<T>, what: &str) -> Result<&'a T, String> {
    value
        .as_ref()
        .ok_or_else(|| format!("{} is not known yet; run the earlier bootstrap steps first", what))
}
