//! Toolchain version compatibility checks.
//!
//! Normalizes dotted versions and evaluates an installed toolchain version
//! against a declared policy: an optional `[min, max]` range plus a list of
//! `<source>-<target>` mapping tokens. The two checks are independent and
//! both always run; malformed inputs produce warnings, never errors.

mod policy;
mod report;
mod version;

pub use policy::{CompatibilityPolicy, MappingToken, PolicyError, MAPPINGS_KEY, MAX_VERSION_KEY, MIN_VERSION_KEY};
pub use report::{CheckOutcome, CompatibilityReport, IndeterminatePolicy, Violation};
pub use version::{normalize, to_ordered_int, VersionError, VersionTriplet, COMPONENT_LIMIT};

/// Evaluate `installed` against `policy`.
pub fn check_compatibility(
    installed: &str,
    policy: &CompatibilityPolicy,
    indeterminate_policy: IndeterminatePolicy,
) -> CompatibilityReport {
    let mut warnings = Vec::new();

    let installed_version = match normalize(installed) {
        Ok(v) => Some(v),
        Err(e) => {
            warnings.push(format!("installed version '{}' is not a version: {}", installed, e));
            None
        }
    };

    let range = check_range(installed_version, policy, &mut warnings);
    let mapping = check_mapping(installed_version, policy, &mut warnings);

    CompatibilityReport {
        installed: installed.to_string(),
        normalized: installed_version.map(|v| v.to_string()),
        range,
        mapping,
        warnings,
        indeterminate_policy,
    }
}

fn parse_bound(
    label: &str,
    raw: Option<&str>,
    warnings: &mut Vec<String>,
) -> Option<VersionTriplet> {
    let raw = raw?;
    match normalize(raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warnings.push(format!("ignoring unparseable {} '{}': {}", label, raw, e));
            None
        }
    }
}

fn check_range(
    installed: Option<VersionTriplet>,
    policy: &CompatibilityPolicy,
    warnings: &mut Vec<String>,
) -> CheckOutcome {
    let min = parse_bound(MIN_VERSION_KEY, policy.min_version.as_deref(), warnings);
    let max = parse_bound(MAX_VERSION_KEY, policy.max_version.as_deref(), warnings);

    if min.is_none() && max.is_none() {
        return CheckOutcome::Pass;
    }

    let Some(installed) = installed else {
        return CheckOutcome::Indeterminate {
            reason: "installed version could not be normalized".to_string(),
        };
    };

    if let Some(min) = min {
        if installed < min {
            return CheckOutcome::Fail {
                reason: format!("{} is below the minimum {}", installed, min),
            };
        }
    }
    if let Some(max) = max {
        if installed > max {
            return CheckOutcome::Fail {
                reason: format!("{} is above the maximum {}", installed, max),
            };
        }
    }

    CheckOutcome::Pass
}

fn check_mapping(
    installed: Option<VersionTriplet>,
    policy: &CompatibilityPolicy,
    warnings: &mut Vec<String>,
) -> CheckOutcome {
    let tokens = policy.parsed_mappings();

    let discarded: Vec<&str> = policy
        .mappings
        .iter()
        .map(String::as_str)
        .filter(|t| MappingToken::parse(t).is_none())
        .collect();
    if !discarded.is_empty() {
        warnings.push(format!(
            "ignoring {} malformed mapping token(s): {}",
            discarded.len(),
            discarded.join(", ")
        ));
    }

    if tokens.is_empty() {
        let reason = format!("no parseable {} entries", MAPPINGS_KEY);
        warnings.push(format!("{}; mapping check treated as indeterminate", reason));
        return CheckOutcome::Indeterminate { reason };
    }

    let Some(installed) = installed else {
        return CheckOutcome::Indeterminate {
            reason: "installed version could not be normalized".to_string(),
        };
    };

    if tokens.iter().any(|t| t.matches(&installed)) {
        CheckOutcome::Pass
    } else {
        CheckOutcome::Fail {
            reason: format!("no {} entry starts with {}", MAPPINGS_KEY, installed),
        }
    }
}
