//! Unreal Engine installation discovery

use regex_lite::Regex;
use std::cmp::Reverse;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

use super::{classify, Artifact, Candidate, Cardinality, DiscoveryError, MatchTag, Session};

/// Where the Epic Games launcher installs engines
pub const DEFAULT_ENGINES_DIR: &str = "/Users/Shared/Epic Games";

/// Script every usable installation carries, relative to its root
pub const UAT_SCRIPT: &str = "Engine/Build/BatchFiles/RunUAT.sh";

fn engine_dir_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^UE_(\d+(?:\.\d+)*)$").unwrap())
}

/// Version part of an engine directory name, e.g. `5.4` for `UE_5.4`
pub fn engine_version(dir_name: &str) -> Option<&str> {
    engine_dir_pattern()
        .captures(dir_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Whether `dir` holds a complete installation
pub fn is_engine_root(dir: &Path) -> bool {
    dir.join(UAT_SCRIPT).is_file()
}

/// Installations directly under `parent`, newest first.
///
/// Directories named like an engine but missing the UAT script are skipped.
pub fn engine_candidates(parent: &Path) -> Vec<Candidate> {
    let Ok(entries) = fs::read_dir(parent) else {
        return Vec::new();
    };

    let mut found: Vec<(u64, Candidate)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            let order = macship_compat::to_ordered_int(engine_version(&name)?).ok()?;
            let path = entry.path();
            if !is_engine_root(&path) {
                warn!(path = %path.display(), "skipping incomplete engine installation");
                return None;
            }
            Some((order, Candidate::tagged(path, MatchTag::EngineLayout)))
        })
        .collect();

    found.sort_by_key(|(order, c)| (Reverse(*order), c.path.clone()));
    found.into_iter().map(|(_, c)| c).collect()
}

/// Find the engine under `parent`.
///
/// Returns `Ok(None)` when nothing is installed there; the caller must then
/// get `UE_ROOT` some other way.
pub fn discover_engine(
    session: &mut Session<'_>,
    parent: &Path,
) -> Result<Option<PathBuf>, DiscoveryError> {
    match classify(engine_candidates(parent)) {
        Cardinality::None => {
            warn!(dir = %parent.display(), "no Unreal Engine installation found");
            Ok(None)
        }
        Cardinality::One(candidate) => {
            info!(path = %candidate.path.display(), "found Unreal Engine installation");
            Ok(Some(candidate.path))
        }
        Cardinality::Many(candidates) => {
            let chosen = session.pick(Artifact::Engine, 1, candidates)?;
            Ok(Some(chosen.path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{NonInteractive, ScriptedPrompter};
    use crate::tools::SystemRunner;
    use tempfile::TempDir;

    fn install(parent: &Path, name: &str) -> PathBuf {
        let root = parent.join(name);
        let script = root.join(UAT_SCRIPT);
        fs::create_dir_all(script.parent().unwrap()).unwrap();
        fs::write(&script, "#!/bin/sh\n").unwrap();
        root
    }

    #[test]
    fn test_engine_version() {
        assert_eq!(engine_version("UE_5.4"), Some("5.4"));
        assert_eq!(engine_version("UE_5"), Some("5"));
        assert_eq!(engine_version("UE_5.4-custom"), None);
        assert_eq!(engine_version("Launcher"), None);
    }

    #[test]
    fn test_candidates_require_uat_and_sort_newest_first() {
        let temp = TempDir::new().unwrap();
        install(temp.path(), "UE_5.2");
        install(temp.path(), "UE_5.10");
        install(temp.path(), "UE_5.4");
        fs::create_dir(temp.path().join("UE_5.5")).unwrap();
        install(temp.path(), "Launcher");

        let names: Vec<String> = engine_candidates(temp.path())
            .iter()
            .map(|c| c.file_name())
            .collect();
        assert_eq!(names, vec!["UE_5.10", "UE_5.4", "UE_5.2"]);
    }

    #[test]
    fn test_none_leaves_unset() {
        let temp = TempDir::new().unwrap();
        let mut prompter = NonInteractive;
        let mut session = Session::new(&mut prompter, &SystemRunner);
        assert_eq!(discover_engine(&mut session, temp.path()).unwrap(), None);
        assert_eq!(
            discover_engine(&mut session, &temp.path().join("missing")).unwrap(),
            None
        );
    }

    #[test]
    fn test_single_install_without_prompt() {
        let temp = TempDir::new().unwrap();
        let root = install(temp.path(), "UE_5.4");
        let mut prompter = ScriptedPrompter::default();
        let mut session = Session::new(&mut prompter, &SystemRunner);

        assert_eq!(discover_engine(&mut session, temp.path()).unwrap(), Some(root));
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn test_several_installs() {
        let temp = TempDir::new().unwrap();
        install(temp.path(), "UE_5.3");
        let newest = install(temp.path(), "UE_5.4");

        let mut prompter = NonInteractive;
        let mut session = Session::new(&mut prompter, &SystemRunner);
        assert!(matches!(
            discover_engine(&mut session, temp.path()),
            Err(DiscoveryError::Ambiguous { artifact: Artifact::Engine, .. })
        ));

        let mut prompter = ScriptedPrompter::new([""]);
        let mut session = Session::new(&mut prompter, &SystemRunner);
        assert_eq!(discover_engine(&mut session, temp.path()).unwrap(), Some(newest));
    }
}
