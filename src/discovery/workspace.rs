//! Xcode workspace discovery
//!
//! Order: the conventional `<project> (Mac).xcworkspace` in the root, then a
//! shallow search, then (with the user's consent) regenerating the project
//! files and searching once more.

use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use super::{
    classify, first_success, Artifact, Candidate, Cardinality, DiscoveryError, MatchTag, Session,
    Strategy,
};
use crate::prompt::confirm;
use crate::tools::xcode::generate_project_files_command;

pub const WORKSPACE_EXTENSION: &str = "xcworkspace";

/// Suffix the engine's project generator gives macOS workspaces
pub const MAC_SUFFIX: &str = " (Mac)";

/// Maximum depth below the root searched for workspaces
pub const SEARCH_DEPTH: usize = 2;

/// `<base> (Mac).xcworkspace`
pub fn conventional_name(project_base: &str) -> String {
    format!("{}{}.{}", project_base, MAC_SUFFIX, WORKSPACE_EXTENSION)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}

/// Workspaces up to [`SEARCH_DEPTH`] below `root`, sorted by path.
///
/// Workspaces embedded in `.xcodeproj` bundles are not candidates.
pub fn find_workspaces(root: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(SEARCH_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !has_extension(e.path(), "xcodeproj"))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir() && has_extension(e.path(), WORKSPACE_EXTENSION))
        .map(|e| e.into_path())
        .collect();
    found.sort();
    found
}

fn tag_for(path: &Path, project_base: &str) -> Option<MatchTag> {
    let name = path.file_name()?.to_string_lossy();
    if name == conventional_name(project_base) {
        Some(MatchTag::NamingConvention)
    } else if path
        .file_stem()
        .is_some_and(|s| s.to_string_lossy().ends_with(MAC_SUFFIX))
    {
        Some(MatchTag::PlatformSuffix)
    } else {
        None
    }
}

/// Narrow several workspaces down without asking.
///
/// Keeps those with the macOS suffix; one left wins, otherwise an exact
/// conventional name wins. Returns `Err` with the full tagged candidate set
/// when no single workspace stands out.
pub fn narrow(found: Vec<PathBuf>, project_base: &str) -> Result<PathBuf, Vec<Candidate>> {
    let candidates: Vec<Candidate> = found
        .into_iter()
        .map(|path| Candidate {
            tag: tag_for(&path, project_base),
            path,
        })
        .collect();

    let mac: Vec<&Candidate> = candidates.iter().filter(|c| c.tag.is_some()).collect();
    if mac.len() == 1 {
        return Ok(mac[0].path.clone());
    }
    let conventional: Vec<&Candidate> = mac
        .iter()
        .copied()
        .filter(|c| c.tag == Some(MatchTag::NamingConvention))
        .collect();
    if conventional.len() == 1 {
        return Ok(conventional[0].path.clone());
    }
    Err(candidates)
}

/// Classify a search result; `Ok(None)` when nothing was found.
fn select(
    session: &mut Session<'_>,
    found: Vec<PathBuf>,
    project_base: &str,
) -> Result<Option<PathBuf>, DiscoveryError> {
    match classify(found) {
        Cardinality::None => Ok(None),
        Cardinality::One(path) => Ok(Some(path)),
        Cardinality::Many(paths) => match narrow(paths, project_base) {
            Ok(path) => Ok(Some(path)),
            Err(candidates) => {
                let default = candidates
                    .iter()
                    .position(|c| c.tag.is_some())
                    .map_or(1, |i| i + 1);
                session
                    .pick(Artifact::Workspace, default, candidates)
                    .map(|c| Some(c.path))
            }
        },
    }
}

/// Inputs for regenerating project files
#[derive(Debug, Clone, Copy)]
pub struct Generator<'p> {
    pub ue_root: &'p Path,
    pub uproject: &'p Path,
}

pub fn discover_workspace(
    session: &mut Session<'_>,
    root: &Path,
    project_base: &str,
    generator: Option<Generator<'_>>,
) -> Result<PathBuf, DiscoveryError> {
    let mut strategies: Vec<Strategy<'_, PathBuf>> = Vec::new();

    strategies.push((
        "naming convention",
        Box::new(|_: &mut Session<'_>| {
            let path = root.join(conventional_name(project_base));
            Ok(path.is_dir().then_some(path))
        }),
    ));

    strategies.push((
        "search",
        Box::new(|session: &mut Session<'_>| select(session, find_workspaces(root), project_base)),
    ));

    strategies.push((
        "generate project files",
        Box::new(move |session: &mut Session<'_>| {
            let Some(generator) = generator else {
                warn!("cannot offer to generate project files without UE_ROOT and the .uproject");
                return Ok(None);
            };
            if !confirm(
                &mut *session.prompter,
                "No Xcode workspace found. Generate project files now?",
            ) {
                return Ok(None);
            }
            let command = generate_project_files_command(generator.ue_root, generator.uproject);
            session
                .runner
                .run(&command)
                .map_err(|source| DiscoveryError::Tool {
                    artifact: Artifact::Workspace,
                    source,
                })?;
            select(session, find_workspaces(root), project_base)
        }),
    ));

    match first_success(Artifact::Workspace, session, strategies)? {
        Some(path) => {
            info!(path = %path.display(), "using Xcode workspace");
            Ok(path)
        }
        None => Err(DiscoveryError::not_found(
            Artifact::Workspace,
            format!("within {} levels of {}", SEARCH_DEPTH, root.display()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{NonInteractive, ScriptedPrompter};
    use crate::tools::{CommandSpec, ToolError, ToolOutput, ToolRunner};
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    /// Records `run` calls and creates a workspace when the generator runs
    struct Generating {
        creates: Option<PathBuf>,
        ran: RefCell<Vec<String>>,
    }

    impl ToolRunner for Generating {
        fn capture(&self, spec: &CommandSpec) -> Result<ToolOutput, ToolError> {
            panic!("unexpected capture: {}", spec)
        }

        fn run(&self, spec: &CommandSpec) -> Result<(), ToolError> {
            self.ran.borrow_mut().push(spec.program.clone());
            if let Some(ref path) = self.creates {
                fs::create_dir_all(path).unwrap();
            }
            Ok(())
        }
    }

    fn runner(creates: Option<PathBuf>) -> Generating {
        Generating {
            creates,
            ran: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn test_conventional_name() {
        assert_eq!(conventional_name("My Game"), "My Game (Mac).xcworkspace");
    }

    #[test]
    fn test_convention_accepted_directly() {
        let temp = TempDir::new().unwrap();
        let ws = temp.path().join("Game (Mac).xcworkspace");
        fs::create_dir(&ws).unwrap();
        fs::create_dir(temp.path().join("Other.xcworkspace")).unwrap();

        let mut prompter = NonInteractive;
        let tools = runner(None);
        let mut session = Session::new(&mut prompter, &tools);
        assert_eq!(discover_workspace(&mut session, temp.path(), "Game", None).unwrap(), ws);
    }

    #[test]
    fn test_search_skips_xcodeproj_internals_and_respects_depth() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("Game.xcodeproj/project.xcworkspace")).unwrap();
        fs::create_dir_all(temp.path().join("a/b/Deep.xcworkspace")).unwrap();
        fs::create_dir_all(temp.path().join("Intermediate/Game (Mac).xcworkspace")).unwrap();

        let found = find_workspaces(temp.path());
        assert_eq!(found, vec![temp.path().join("Intermediate/Game (Mac).xcworkspace")]);
    }

    #[test]
    fn test_narrow_by_platform_suffix() {
        let found = vec![
            PathBuf::from("/w/Game (IOS).xcworkspace"),
            PathBuf::from("/w/Game (Mac).xcworkspace"),
        ];
        assert_eq!(
            narrow(found, "Other").unwrap(),
            PathBuf::from("/w/Game (Mac).xcworkspace")
        );
    }

    #[test]
    fn test_narrow_prefers_convention_among_mac() {
        let found = vec![
            PathBuf::from("/w/a/Game (Mac).xcworkspace"),
            PathBuf::from("/w/b/UE5 (Mac).xcworkspace"),
        ];
        assert_eq!(
            narrow(found, "Game").unwrap(),
            PathBuf::from("/w/a/Game (Mac).xcworkspace")
        );
    }

    #[test]
    fn test_narrow_gives_up_with_full_set() {
        let found = vec![PathBuf::from("/w/A.xcworkspace"), PathBuf::from("/w/B.xcworkspace")];
        let candidates = narrow(found, "Game").unwrap_err();
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn test_ambiguous_non_interactive_fails() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("A.xcworkspace")).unwrap();
        fs::create_dir(temp.path().join("B.xcworkspace")).unwrap();

        let mut prompter = NonInteractive;
        let tools = runner(None);
        let mut session = Session::new(&mut prompter, &tools);
        let err = discover_workspace(&mut session, temp.path(), "Game", None).unwrap_err();
        assert!(matches!(err, DiscoveryError::Ambiguous { .. }));
    }

    #[test]
    fn test_none_non_interactive_is_not_found() {
        let temp = TempDir::new().unwrap();
        let uproject = temp.path().join("Game.uproject");
        let mut prompter = NonInteractive;
        let tools = runner(None);
        let mut session = Session::new(&mut prompter, &tools);

        let generator = Generator {
            ue_root: temp.path(),
            uproject: &uproject,
        };
        let err = discover_workspace(&mut session, temp.path(), "Game", Some(generator)).unwrap_err();
        assert!(matches!(err, DiscoveryError::NotFound { artifact: Artifact::Workspace, .. }));
        assert!(tools.ran.borrow().is_empty());
    }

    #[test]
    fn test_generate_then_research() {
        let temp = TempDir::new().unwrap();
        let uproject = temp.path().join("Game.uproject");
        let ws = temp.path().join("Game (Mac).xcworkspace");

        let mut prompter = ScriptedPrompter::new(["y"]);
        let tools = runner(Some(ws.clone()));
        let mut session = Session::new(&mut prompter, &tools);
        let generator = Generator {
            ue_root: Path::new("/UE"),
            uproject: &uproject,
        };

        let found = discover_workspace(&mut session, temp.path(), "Game", Some(generator)).unwrap();
        assert_eq!(found, ws);
        assert_eq!(
            tools.ran.borrow().as_slice(),
            ["/UE/Engine/Build/BatchFiles/Mac/GenerateProjectFiles.sh"]
        );
    }

    #[test]
    fn test_declined_generation_is_not_found() {
        let temp = TempDir::new().unwrap();
        let uproject = temp.path().join("Game.uproject");
        let mut prompter = ScriptedPrompter::new(["n"]);
        let tools = runner(None);
        let mut session = Session::new(&mut prompter, &tools);
        let generator = Generator {
            ue_root: Path::new("/UE"),
            uproject: &uproject,
        };

        let err = discover_workspace(&mut session, temp.path(), "Game", Some(generator)).unwrap_err();
        assert!(matches!(err, DiscoveryError::NotFound { .. }));
        assert!(tools.ran.borrow().is_empty());
    }
}
