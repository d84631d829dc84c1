//! Xcode compatibility against the engine's Apple SDK policy
//!
//! The engine declares the Xcode versions it supports in
//! `Engine/Config/Apple/Apple_SDK.json`. The installed version must sit in
//! the declared range and have an explicit compiler mapping entry. A missing
//! or malformed policy file only warns; a violation stops the run before any
//! build step.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use macship_compat::{
    check_compatibility, CompatibilityPolicy, CompatibilityReport, IndeterminatePolicy, Violation,
    MAPPINGS_KEY,
};

use crate::tools::xcode::{parse_xcode_version, xcode_version_command, XcodeVersion};
use crate::tools::{ToolError, ToolRunner};

/// Policy file location relative to the engine root
pub const POLICY_FILE: &str = "Engine/Config/Apple/Apple_SDK.json";

pub fn policy_path(ue_root: &Path) -> PathBuf {
    ue_root.join(POLICY_FILE)
}

/// Query the active Xcode.
pub fn installed_xcode_version(runner: &dyn ToolRunner) -> Result<XcodeVersion, ToolError> {
    let output = runner.capture(&xcode_version_command())?;
    parse_xcode_version(&output.stdout).ok_or_else(|| ToolError::Failed {
        program: "xcodebuild".to_string(),
        code: Some(0),
        stderr: format!("unrecognised -version output: {}", output.stdout.trim()),
    })
}

/// The installed toolchain is outside what the engine supports
#[derive(Debug)]
pub struct CompatibilityViolation {
    pub report: CompatibilityReport,
    pub policy_path: PathBuf,
    pub declared_range: String,
}

impl CompatibilityViolation {
    /// Mapping entry that would make the installed version acceptable
    pub fn suggested_mapping(&self) -> String {
        let installed = self
            .report
            .normalized
            .clone()
            .unwrap_or_else(|| self.report.installed.clone());
        format!("{}-<llvm version>", installed)
    }
}

impl fmt::Display for CompatibilityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Xcode {} is not supported by this engine",
            self.report.installed
        )?;
        writeln!(f, "  policy:          {}", self.policy_path.display())?;
        writeln!(f, "  declared range:  {}", self.declared_range)?;
        writeln!(f, "  range check:     {}", self.report.range)?;
        writeln!(f, "  mapping check:   {}", self.report.mapping)?;

        let violation = self.report.violation();
        if matches!(violation, Some(Violation::OutOfRange | Violation::OutOfRangeAndUnmapped)) {
            writeln!(
                f,
                "  fix: install an Xcode within {} or widen MinVersion/MaxVersion in {}",
                self.declared_range,
                self.policy_path.display()
            )?;
        }
        if matches!(violation, Some(Violation::Unmapped | Violation::OutOfRangeAndUnmapped)) {
            write!(
                f,
                "  fix: add \"{}\" to {} in {}",
                self.suggested_mapping(),
                MAPPINGS_KEY,
                self.policy_path.display()
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for CompatibilityViolation {}

/// Check the active Xcode against the engine's policy.
///
/// Returns `Ok(None)` when the engine ships no readable policy; the Xcode
/// version is then not queried at all.
pub fn evaluate(
    ue_root: &Path,
    runner: &dyn ToolRunner,
    indeterminate: IndeterminatePolicy,
) -> Result<Option<CompatibilityReport>, crate::Error> {
    let path = policy_path(ue_root);
    if !path.is_file() {
        warn!(path = %path.display(), "no Apple SDK policy; skipping Xcode compatibility check");
        return Ok(None);
    }
    let policy = match CompatibilityPolicy::load(&path) {
        Ok(policy) => policy,
        Err(e) => {
            warn!(error = %e, "unreadable Apple SDK policy; skipping Xcode compatibility check");
            return Ok(None);
        }
    };

    let xcode = installed_xcode_version(runner)?;
    let report = check_compatibility(&xcode.version, &policy, indeterminate);
    for warning in &report.warnings {
        warn!(policy = %path.display(), "{}", warning);
    }

    if report.is_compatible() {
        info!(
            xcode = %xcode.version,
            build = %xcode.build,
            range = %policy.describe_range(),
            "Xcode is supported by this engine"
        );
        Ok(Some(report))
    } else {
        Err(CompatibilityViolation {
            report,
            policy_path: path,
            declared_range: policy.describe_range(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{CommandSpec, ToolOutput};
    use macship_compat::CheckOutcome;
    use std::cell::Cell;
    use std::fs;
    use tempfile::TempDir;

    struct Xcode {
        version: &'static str,
        queried: Cell<bool>,
    }

    impl Xcode {
        fn new(version: &'static str) -> Self {
            Self {
                version,
                queried: Cell::new(false),
            }
        }
    }

    impl ToolRunner for Xcode {
        fn capture(&self, spec: &CommandSpec) -> Result<ToolOutput, ToolError> {
            assert_eq!(spec.args, vec!["-version"]);
            self.queried.set(true);
            Ok(ToolOutput {
                stdout: format!("Xcode {}\nBuild version 15C500b\n", self.version),
                stderr: String::new(),
            })
        }

        fn run(&self, spec: &CommandSpec) -> Result<(), ToolError> {
            panic!("unexpected run: {}", spec)
        }
    }

    fn engine_with_policy(contents: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let path = policy_path(temp.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
        temp
    }

    const POLICY: &str = r#"{
        "MainVersion": "14.1",
        "MinVersion": "14.0.0",
        "MaxVersion": "16.0.0",
        "AppleVersionToLLVMVersions": ["14.0.0-14.0.0", "15.2.0-16.0.0"]
    }"#;

    #[test]
    fn test_supported_xcode_passes() {
        let engine = engine_with_policy(POLICY);
        let report = evaluate(engine.path(), &Xcode::new("15.2"), IndeterminatePolicy::Allow)
            .unwrap()
            .unwrap();
        assert_eq!(report.range, CheckOutcome::Pass);
        assert_eq!(report.mapping, CheckOutcome::Pass);
    }

    #[test]
    fn test_missing_policy_skips_version_query() {
        let temp = TempDir::new().unwrap();
        let xcode = Xcode::new("15.2");
        assert!(evaluate(temp.path(), &xcode, IndeterminatePolicy::Allow).unwrap().is_none());
        assert!(!xcode.queried.get());
    }

    #[test]
    fn test_malformed_policy_only_warns() {
        let engine = engine_with_policy("{ not json");
        assert!(evaluate(engine.path(), &Xcode::new("15.2"), IndeterminatePolicy::Allow)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_violation_names_file_and_entry() {
        let engine = engine_with_policy(POLICY);
        let err = evaluate(engine.path(), &Xcode::new("15.4"), IndeterminatePolicy::Allow).unwrap_err();

        let violation = match err {
            crate::Error::Compatibility(v) => v,
            other => panic!("unexpected error: {}", other),
        };
        assert_eq!(violation.report.violation(), Some(Violation::Unmapped));

        let message = violation.to_string();
        assert!(message.contains("Xcode 15.4"));
        assert!(message.contains("[14.0.0, 16.0.0]"));
        assert!(message.contains("Apple_SDK.json"));
        assert!(message.contains("\"15.4.0-<llvm version>\""));
        assert!(!message.contains("MinVersion/MaxVersion"));
    }

    #[test]
    fn test_out_of_range_diagnostic() {
        let engine = engine_with_policy(POLICY);
        let err = evaluate(engine.path(), &Xcode::new("13.0"), IndeterminatePolicy::Allow).unwrap_err();
        let violation = match err {
            crate::Error::Compatibility(v) => v,
            other => panic!("unexpected error: {}", other),
        };
        assert_eq!(violation.report.violation(), Some(Violation::OutOfRangeAndUnmapped));
        assert!(violation.to_string().contains("MinVersion/MaxVersion"));
    }

    #[test]
    fn test_strict_mode_rejects_unmappable_policy() {
        let engine = engine_with_policy(r#"{"MinVersion": "14.0", "AppleVersionToLLVMVersions": ["bogus"]}"#);

        assert!(evaluate(engine.path(), &Xcode::new("15.2"), IndeterminatePolicy::Allow).is_ok());
        assert!(evaluate(engine.path(), &Xcode::new("15.2"), IndeterminatePolicy::Deny).is_err());
    }
}
