// ABOUTME: Step identifiers and the static transition table of the bootstrap wizard.
// ABOUTME: Steps advance to their successor unless they redirect, abort or fail.

use std::fmt;
use std::str::FromStr;

/// A named bootstrap step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    Welcome,
    CheckAwsCli,
    Env,
    Profile,
    Admin,
    Org,
    Config,
    PreRoles,
    Roles,
    PreDb,
    Db,
    PreStorage,
    Storage,
    Done,
    /// Terminal sentinel; never executed.
    Quit,
}

impl StepId {
    /// Every executable step in run order.
    pub const ALL: [StepId; 14] = [
        StepId::Welcome,
        StepId::CheckAwsCli,
        StepId::Env,
        StepId::Profile,
        StepId::Admin,
        StepId::Org,
        StepId::Config,
        StepId::PreRoles,
        StepId::Roles,
        StepId::PreDb,
        StepId::Db,
        StepId::PreStorage,
        StepId::Storage,
        StepId::Done,
    ];

    /// The step that normally follows this one.
    pub fn successor(self) -> StepId {
        match self {
            StepId::Welcome => StepId::CheckAwsCli,
            StepId::CheckAwsCli => StepId::Env,
            StepId::Env => StepId::Profile,
            StepId::Profile => StepId::Admin,
            StepId::Admin => StepId::Org,
            StepId::Org => StepId::Config,
            StepId::Config => StepId::PreRoles,
            StepId::PreRoles => StepId::Roles,
            StepId::Roles => StepId::PreDb,
            StepId::PreDb => StepId::Db,
            StepId::Db => StepId::PreStorage,
            StepId::PreStorage => StepId::Storage,
            StepId::Storage => StepId::Done,
            StepId::Done | StepId::Quit => StepId::Quit,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepId::Welcome => "welcome",
            StepId::CheckAwsCli => "check_aws_cli",
            StepId::Env => "env",
            StepId::Profile => "profile",
            StepId::Admin => "admin",
            StepId::Org => "org",
            StepId::Config => "config",
            StepId::PreRoles => "pre_roles",
            StepId::Roles => "roles",
            StepId::PreDb => "pre_db",
            StepId::Db => "db",
            StepId::PreStorage => "pre_storage",
            StepId::Storage => "storage",
            StepId::Done => "done",
            StepId::Quit => "quit",
        }
    }

    /// Heading shown when the step starts.
    pub fn title(self) -> &'static str {
        match self {
            StepId::Welcome => "WELCOME",
            StepId::CheckAwsCli => "CHECK AWS CLI",
            StepId::Env => "CHECK ENVIRONMENT",
            StepId::Profile => "CHECK PROFILE",
            StepId::Admin => "CHECK ADMINISTRATIVE PRIVILEGES",
            StepId::Org => "CHECK ORGANIZATION",
            StepId::Config => "CONFIGURATION SETTINGS",
            StepId::PreRoles | StepId::Roles => "DEPLOY ROLES",
            StepId::PreDb | StepId::Db => "DEPLOY DATABASE",
            StepId::PreStorage | StepId::Storage => "DEPLOY STORAGE",
            StepId::Done => "DONE",
            StepId::Quit => "QUIT",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepId::ALL
            .into_iter()
            .chain([StepId::Quit])
            .find(|step| step.as_str() == s)
            .ok_or_else(|| format!("unknown bootstrap step: {}", s))
    }
}

/// What a step asks the sequencer to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    Continue(StepId),
    /// The operator declined at a gate.
    Abort,
    Failed(String),
}
