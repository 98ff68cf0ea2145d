// ABOUTME: Diagnostics accumulator for non-fatal warnings during a run.
// ABOUTME: Collects warnings that shouldn't fail a deployment but should be shown to users.

/// Collects non-fatal warnings during bootstrap and deploy runs.
#[derive(Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning collected during a run.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// The profile on the command line resolved to a different one.
    pub fn profile_mismatch(requested: &str, resolved: &str) -> Self {
        Self {
            kind: WarningKind::ProfileMismatch,
            message: format!(
                "Requested profile '{}' differs from the resolved profile '{}'",
                requested, resolved
            ),
        }
    }

    /// A reviewed change set was declined and is still staged.
    pub fn change_set_retained(stack: &str) -> Self {
        Self {
            kind: WarningKind::ChangeSetRetained,
            message: format!(
                "Change set {}-change-set was not executed and remains staged",
                stack
            ),
        }
    }
}

/// Categories of warnings that can occur during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// AWS_PROFILE and the configured profile disagree.
    ProfileMismatch,
    /// The operator declined a change set.
    ChangeSetRetained,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::profile_mismatch("dev", "default"));
        diag.warn(Warning::change_set_retained("core-automation-roles"));

        assert!(diag.has_warnings());
        assert_eq!(diag.warnings().len(), 2);
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        let profile = Warning::profile_mismatch("dev", "default");
        assert_eq!(profile.kind, WarningKind::ProfileMismatch);
        assert!(profile.message.contains("'dev'"));

        let retained = Warning::change_set_retained("core-automation-roles");
        assert_eq!(retained.kind, WarningKind::ChangeSetRetained);
        assert!(retained.message.contains("core-automation-roles-change-set"));
    }
}
