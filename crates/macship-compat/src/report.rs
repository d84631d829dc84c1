//! Compatibility check outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one independent check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckOutcome {
    Pass,
    Fail { reason: String },
    /// Inputs were unusable; the check could not decide.
    Indeterminate { reason: String },
}

impl CheckOutcome {
    pub fn is_fail(&self) -> bool {
        matches!(self, CheckOutcome::Fail { .. })
    }

    pub fn is_indeterminate(&self) -> bool {
        matches!(self, CheckOutcome::Indeterminate { .. })
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckOutcome::Pass => f.write_str("pass"),
            CheckOutcome::Fail { reason } => write!(f, "fail ({})", reason),
            CheckOutcome::Indeterminate { reason } => write!(f, "indeterminate ({})", reason),
        }
    }
}

/// What to do when the mapping check cannot decide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndeterminatePolicy {
    /// Treat as compatible and warn.
    #[default]
    Allow,
    /// Treat as incompatible.
    Deny,
}

/// Which checks rejected the installed version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    OutOfRange,
    Unmapped,
    OutOfRangeAndUnmapped,
}

/// Result of [`crate::check_compatibility`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    /// Installed version as given.
    pub installed: String,

    /// Installed version normalized, when it parsed.
    pub normalized: Option<String>,

    pub range: CheckOutcome,
    pub mapping: CheckOutcome,

    /// Degraded-input notes, in the order they were found.
    pub warnings: Vec<String>,

    pub indeterminate_policy: IndeterminatePolicy,
}

impl CompatibilityReport {
    fn mapping_rejects(&self) -> bool {
        match &self.mapping {
            CheckOutcome::Fail { .. } => true,
            CheckOutcome::Indeterminate { .. } => {
                self.indeterminate_policy == IndeterminatePolicy::Deny
            }
            CheckOutcome::Pass => false,
        }
    }

    /// `None` when the installed version is acceptable.
    pub fn violation(&self) -> Option<Violation> {
        match (self.range.is_fail(), self.mapping_rejects()) {
            (false, false) => None,
            (true, false) => Some(Violation::OutOfRange),
            (false, true) => Some(Violation::Unmapped),
            (true, true) => Some(Violation::OutOfRangeAndUnmapped),
        }
    }

    pub fn is_compatible(&self) -> bool {
        self.violation().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(range: CheckOutcome, mapping: CheckOutcome, policy: IndeterminatePolicy) -> CompatibilityReport {
        CompatibilityReport {
            installed: "15.2".to_string(),
            normalized: Some("15.2.0".to_string()),
            range,
            mapping,
            warnings: vec![],
            indeterminate_policy: policy,
        }
    }

    #[test]
    fn test_violation_kinds() {
        let fail = || CheckOutcome::Fail { reason: "x".to_string() };

        assert_eq!(report(CheckOutcome::Pass, CheckOutcome::Pass, IndeterminatePolicy::Allow).violation(), None);
        assert_eq!(
            report(fail(), CheckOutcome::Pass, IndeterminatePolicy::Allow).violation(),
            Some(Violation::OutOfRange)
        );
        assert_eq!(
            report(CheckOutcome::Pass, fail(), IndeterminatePolicy::Allow).violation(),
            Some(Violation::Unmapped)
        );
        assert_eq!(
            report(fail(), fail(), IndeterminatePolicy::Allow).violation(),
            Some(Violation::OutOfRangeAndUnmapped)
        );
    }

    #[test]
    fn test_indeterminate_mapping_follows_policy() {
        let unknown = || CheckOutcome::Indeterminate { reason: "no tokens".to_string() };

        assert!(report(CheckOutcome::Pass, unknown(), IndeterminatePolicy::Allow).is_compatible());
        assert_eq!(
            report(CheckOutcome::Pass, unknown(), IndeterminatePolicy::Deny).violation(),
            Some(Violation::Unmapped)
        );
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(CheckOutcome::Fail { reason: "below min".to_string() }).unwrap();
        assert_eq!(json["outcome"], "fail");
        assert_eq!(json["reason"], "below min");
    }
}
