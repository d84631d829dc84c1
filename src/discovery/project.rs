//! Project descriptor (`.uproject`) discovery and derived names

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{classify, Artifact, Cardinality, DiscoveryError};
use crate::paths;

pub const UPROJECT_EXTENSION: &str = "uproject";

/// `.uproject` files directly inside `root`, sorted by path.
pub fn find_uprojects(root: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let entries = fs::read_dir(root).map_err(|e| DiscoveryError::io(Artifact::Project, root, e))?;

    let mut found: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().is_some_and(|ext| ext == UPROJECT_EXTENSION)
        })
        .collect();
    found.sort();
    Ok(found)
}

/// The single `.uproject` in `root`.
///
/// Several descriptors are never chosen between, even interactively; the
/// caller must name one.
pub fn discover_uproject(root: &Path) -> Result<PathBuf, DiscoveryError> {
    match classify(find_uprojects(root)?) {
        Cardinality::None => Err(DiscoveryError::not_found(
            Artifact::Project,
            format!("in {}", root.display()),
        )),
        Cardinality::One(path) => {
            info!(path = %path.display(), "found project descriptor");
            Ok(path)
        }
        Cardinality::Many(paths) => {
            let listed: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
            Err(DiscoveryError::ambiguous(
                Artifact::Project,
                &listed,
                "select one explicitly",
            ))
        }
    }
}

/// Short and long identifiers derived from the descriptor file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedNames {
    /// Base name with all whitespace removed
    pub short: String,
    /// Base name as is
    pub long: String,
}

pub fn derive_names(uproject: &Path) -> DerivedNames {
    let long = paths::stem(uproject).unwrap_or_default();
    let short = long.chars().filter(|c| !c.is_whitespace()).collect();
    DerivedNames { short, long }
}

#[derive(Debug, Deserialize)]
struct ProjectDescriptor {
    #[serde(rename = "Modules", default)]
    modules: Vec<ModuleDescriptor>,
}

#[derive(Debug, Deserialize)]
struct ModuleDescriptor {
    #[serde(rename = "Name", default)]
    name: Option<String>,
}

/// Name of the first module listed in a descriptor's JSON text.
pub fn parse_module_name(contents: &str) -> Result<Option<String>, serde_json::Error> {
    let descriptor: ProjectDescriptor = serde_json::from_str(contents)?;
    Ok(descriptor
        .modules
        .into_iter()
        .next()
        .and_then(|m| m.name)
        .filter(|name| !name.is_empty()))
}

/// First module name of `uproject`; any read or parse problem yields `None`.
pub fn module_name(uproject: &Path) -> Option<String> {
    let contents = match fs::read_to_string(uproject) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %uproject.display(), error = %e, "cannot read project descriptor");
            return None;
        }
    };
    match parse_module_name(&contents) {
        Ok(Some(name)) => {
            debug!(module = %name, "read module name from project descriptor");
            Some(name)
        }
        Ok(None) => {
            debug!(path = %uproject.display(), "project descriptor lists no modules");
            None
        }
        Err(e) => {
            warn!(path = %uproject.display(), error = %e, "cannot parse project descriptor");
            None
        }
    }
}
