//! Artifact discovery
//!
//! Each artifact has an ordered list of strategies; the first one that
//! produces a value wins. A strategy that finds several candidates classifies
//! them by cardinality and, when it cannot narrow them down itself, hands the
//! set to the disambiguator. Everything here only reads the filesystem except
//! the two user-confirmed generation steps (Xcode project files and
//! `ExportOptions.plist`).

pub mod engine;
pub mod export_options;
pub mod project;
pub mod scheme;
pub mod steam;
pub mod workspace;

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::Field;
use crate::disambiguate::choose;
use crate::prompt::Prompter;
use crate::tools::{ToolError, ToolRunner};

/// Kinds of artifact discovery looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    Project,
    Engine,
    Workspace,
    Scheme,
    ExportOptions,
    SteamLibrary,
}

impl Artifact {
    /// Field that overrides discovery of this artifact
    pub fn field(self) -> Field {
        match self {
            Artifact::Project => Field::Uproject,
            Artifact::Engine => Field::UeRoot,
            Artifact::Workspace => Field::Workspace,
            Artifact::Scheme => Field::Scheme,
            Artifact::ExportOptions => Field::ExportPlist,
            Artifact::SteamLibrary => Field::SteamDylibSrc,
        }
    }

    pub fn hint(self) -> String {
        self.field().hint()
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Artifact::Project => ".uproject file",
            Artifact::Engine => "Unreal Engine installation",
            Artifact::Workspace => "Xcode workspace",
            Artifact::Scheme => "Xcode scheme",
            Artifact::ExportOptions => "export options plist",
            Artifact::SteamLibrary => "Steamworks library",
        };
        f.write_str(name)
    }
}

/// Why a candidate looked right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTag {
    /// Named exactly as the project convention expects
    NamingConvention,
    /// Carries the macOS platform suffix
    PlatformSuffix,
    /// Plist declaring `destination = export`
    ExportMarker,
    /// Engine directory with a usable UAT script
    EngineLayout,
}

impl fmt::Display for MatchTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MatchTag::NamingConvention => "matches naming convention",
            MatchTag::PlatformSuffix => "macOS workspace",
            MatchTag::ExportMarker => "export destination",
            MatchTag::EngineLayout => "has RunUAT.sh",
        };
        f.write_str(text)
    }
}

/// A discovered path and an optional match-quality tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<MatchTag>,
}

impl Candidate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tag: None,
        }
    }

    pub fn tagged(path: impl Into<PathBuf>, tag: MatchTag) -> Self {
        Self {
            path: path.into(),
            tag: Some(tag),
        }
    }

    /// Final path component, lossily converted
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())?;
        if let Some(tag) = self.tag {
            write!(f, " ({})", tag)?;
        }
        Ok(())
    }
}

/// Search result classified by number of matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cardinality<T> {
    None,
    One(T),
    Many(Vec<T>),
}

pub fn classify<T>(mut found: Vec<T>) -> Cardinality<T> {
    match found.len() {
        0 => Cardinality::None,
        1 => Cardinality::One(found.remove(0)),
        _ => Cardinality::Many(found),
    }
}

/// Discovery errors
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("no {artifact} found {location}; {hint}")]
    NotFound {
        artifact: Artifact,
        location: String,
        hint: String,
    },

    #[error("{} {artifact} candidates found and none was chosen ({reason}); {hint}:\n{}", candidates.len(), format_candidates(candidates))]
    Ambiguous {
        artifact: Artifact,
        candidates: Vec<String>,
        reason: String,
        hint: String,
    },

    #[error("could not discover {artifact}: {source}")]
    Tool {
        artifact: Artifact,
        #[source]
        source: ToolError,
    },

    #[error("could not discover {artifact}: {}: {source}", path.display())]
    Io {
        artifact: Artifact,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_candidates(candidates: &[String]) -> String {
    candidates
        .iter()
        .map(|c| format!("  - {}", c))
        .collect::<Vec<_>>()
        .join("\n")
}

impl DiscoveryError {
    pub fn not_found(artifact: Artifact, location: impl Into<String>) -> Self {
        DiscoveryError::NotFound {
            artifact,
            location: location.into(),
            hint: artifact.hint(),
        }
    }

    pub fn ambiguous<T: fmt::Display>(
        artifact: Artifact,
        candidates: &[T],
        reason: impl Into<String>,
    ) -> Self {
        DiscoveryError::Ambiguous {
            artifact,
            candidates: candidates.iter().map(ToString::to_string).collect(),
            reason: reason.into(),
            hint: artifact.hint(),
        }
    }

    pub fn io(artifact: Artifact, path: &Path, source: std::io::Error) -> Self {
        DiscoveryError::Io {
            artifact,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Capabilities discovery may use beyond reading the filesystem
pub struct Session<'a> {
    pub prompter: &'a mut dyn Prompter,
    pub runner: &'a dyn ToolRunner,
}

impl<'a> Session<'a> {
    pub fn new(prompter: &'a mut dyn Prompter, runner: &'a dyn ToolRunner) -> Self {
        Self { prompter, runner }
    }

    /// Let the user pick one of `candidates`, or fail naming the override.
    pub fn pick<T: fmt::Display>(
        &mut self,
        artifact: Artifact,
        default_index: usize,
        mut candidates: Vec<T>,
    ) -> Result<T, DiscoveryError> {
        let prompt = format!("Multiple {} candidates found:", artifact);
        match choose(&mut *self.prompter, &prompt, default_index, &candidates) {
            Ok(index) => Ok(candidates.swap_remove(index)),
            Err(e) => Err(DiscoveryError::ambiguous(artifact, &candidates, e.to_string())),
        }
    }
}

/// One way of finding an artifact; `Ok(None)` passes to the next strategy.
pub type Strategy<'s, T> = (
    &'static str,
    Box<dyn FnOnce(&mut Session<'_>) -> Result<Option<T>, DiscoveryError> + 's>,
);

/// Run `strategies` in order and return the first value found.
pub fn first_success<T: fmt::Debug>(
    artifact: Artifact,
    session: &mut Session<'_>,
    strategies: Vec<Strategy<'_, T>>,
) -> Result<Option<T>, DiscoveryError> {
    for (name, strategy) in strategies {
        debug!(%artifact, strategy = name, "trying discovery strategy");
        if let Some(found) = strategy(session)? {
            debug!(%artifact, strategy = name, ?found, "strategy succeeded");
            return Ok(Some(found));
        }
    }
    Ok(None)
}
