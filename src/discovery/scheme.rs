//! Xcode scheme discovery

use std::path::Path;
use tracing::{debug, info};

use super::{classify, Artifact, Cardinality, DiscoveryError, Session};
use crate::tools::xcode::{list_schemes_command, parse_scheme_list};
use crate::tools::ToolRunner;

/// Schemes visible in `workspace`, as listed by `xcodebuild -list`.
pub fn list_schemes(runner: &dyn ToolRunner, workspace: &Path) -> Result<Vec<String>, DiscoveryError> {
    let output = runner
        .capture(&list_schemes_command(workspace))
        .map_err(|source| DiscoveryError::Tool {
            artifact: Artifact::Scheme,
            source,
        })?;
    Ok(parse_scheme_list(&output.stdout))
}

/// First preferred name that exactly matches a listed scheme.
///
/// `preferred` is in priority order; empty names are skipped.
pub fn rank<'s>(schemes: &'s [String], preferred: &[&str]) -> Option<&'s str> {
    preferred
        .iter()
        .filter(|name| !name.is_empty())
        .find_map(|name| schemes.iter().find(|s| s.as_str() == *name))
        .map(String::as_str)
}

/// Pick the scheme to archive.
///
/// `preferred` lists names to try when several schemes exist: long name,
/// module name, project base name, short name.
pub fn discover_scheme(
    session: &mut Session<'_>,
    workspace: &Path,
    preferred: &[&str],
) -> Result<String, DiscoveryError> {
    let schemes = list_schemes(session.runner, workspace)?;
    debug!(count = schemes.len(), "listed schemes");

    let scheme = match classify(schemes) {
        Cardinality::None => {
            return Err(DiscoveryError::not_found(
                Artifact::Scheme,
                format!(
                    "in {} (none shared or visible to xcodebuild)",
                    workspace.display()
                ),
            ))
        }
        Cardinality::One(scheme) => scheme,
        Cardinality::Many(schemes) => match rank(&schemes, preferred) {
            Some(name) => name.to_string(),
            None => session.pick(Artifact::Scheme, 1, schemes)?,
        },
    };

    info!(scheme = %scheme, "using Xcode scheme");
    Ok(scheme)
}
