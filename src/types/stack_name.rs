// ABOUTME: CloudFormation stack name validation.
// ABOUTME: Enforces the provider's naming rules before any API call is made.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// CloudFormation rejects stack names longer than this.
pub const MAX_STACK_NAME_LEN: usize = 128;

/// Suffix of the single change set a stack may carry at a time.
const CHANGE_SET_SUFFIX: &str = "-change-set";

/// Longest stack name whose change set name still fits the provider limit.
pub const MAX_NAME_LEN: usize = MAX_STACK_NAME_LEN - CHANGE_SET_SUFFIX.len();

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StackNameError {
    #[error("stack name cannot be empty")]
    Empty,

    #[error("stack name exceeds maximum length of {MAX_NAME_LEN} characters")]
    TooLong,

    #[error("stack name must start with a letter")]
    InvalidStart,

    #[error("invalid character in stack name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StackName(String);

impl StackName {
    pub fn new(value: &str) -> Result<Self, StackNameError> {
        let Some(first) = value.chars().next() else {
            return Err(StackNameError::Empty);
        };

        if value.len() > MAX_NAME_LEN {
            return Err(StackNameError::TooLong);
        }

        if !first.is_ascii_alphabetic() {
            return Err(StackNameError::InvalidStart);
        }

        if let Some(c) = value
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '-')
        {
            return Err(StackNameError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The fixed name of this stack's change set. Only one may exist at a time.
    pub fn change_set_name(&self) -> String {
        format!("{}{}", self.0, CHANGE_SET_SUFFIX)
    }
}

impl fmt::Display for StackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for StackName {
    type Err = StackNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
