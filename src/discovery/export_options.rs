//! Export options plist discovery and generation
//!
//! `xcodebuild -exportArchive` needs a plist whose dictionary declares
//! `destination = export`. The conventional `ExportOptions.plist` in the root
//! is taken as is; other plists in the root count only if they carry that
//! marker.

use plist::{Dictionary, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{
    classify, first_success, Artifact, Candidate, Cardinality, DiscoveryError, MatchTag, Session,
    Strategy,
};
use crate::prompt::confirm;

pub const CONVENTIONAL_NAME: &str = "ExportOptions.plist";

/// Export method written into generated plists
pub const EXPORT_METHOD: &str = "developer-id";

/// Whether the plist at `path` is a dictionary with `destination = export`.
///
/// Unreadable or non-plist files simply do not match.
pub fn has_export_marker(path: &Path) -> bool {
    match Value::from_file(path) {
        Ok(value) => value
            .as_dictionary()
            .and_then(|dict| dict.get("destination"))
            .and_then(Value::as_string)
            .is_some_and(|d| d == "export"),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "not a readable plist");
            false
        }
    }
}

/// Marked plists directly inside `root`, sorted by path.
pub fn find_marked(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };
    let mut found: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "plist"))
        .filter(|path| has_export_marker(path))
        .collect();
    found.sort();
    found
}

/// Minimal export options for a Developer ID export signed by `team_id`.
pub fn render_minimal(team_id: &str) -> Result<Vec<u8>, plist::Error> {
    let mut dict = Dictionary::new();
    dict.insert("method".to_string(), Value::String(EXPORT_METHOD.to_string()));
    dict.insert("teamID".to_string(), Value::String(team_id.to_string()));
    dict.insert("destination".to_string(), Value::String("export".to_string()));
    dict.insert("signingStyle".to_string(), Value::String("automatic".to_string()));

    let mut buf = Vec::new();
    Value::Dictionary(dict).to_writer_xml(&mut buf)?;
    Ok(buf)
}

fn generate(root: &Path, team_id: &str) -> Result<PathBuf, DiscoveryError> {
    let path = root.join(CONVENTIONAL_NAME);
    let bytes = render_minimal(team_id)
        .map_err(|e| DiscoveryError::io(Artifact::ExportOptions, &path, std::io::Error::other(e)))?;
    fs::write(&path, bytes).map_err(|e| DiscoveryError::io(Artifact::ExportOptions, &path, e))?;
    info!(path = %path.display(), "generated export options");
    Ok(path)
}

pub fn discover_export_options(
    session: &mut Session<'_>,
    root: &Path,
    team_id: Option<&str>,
) -> Result<PathBuf, DiscoveryError> {
    let mut strategies: Vec<Strategy<'_, PathBuf>> = Vec::new();

    strategies.push((
        "conventional name",
        Box::new(|_: &mut Session<'_>| {
            let path = root.join(CONVENTIONAL_NAME);
            Ok(path.is_file().then_some(path))
        }),
    ));

    strategies.push((
        "export marker scan",
        Box::new(|session: &mut Session<'_>| match classify(find_marked(root)) {
            Cardinality::None => Ok(None),
            Cardinality::One(path) => Ok(Some(path)),
            Cardinality::Many(paths) => {
                let candidates: Vec<Candidate> = paths
                    .into_iter()
                    .map(|p| Candidate::tagged(p, MatchTag::ExportMarker))
                    .collect();
                session
                    .pick(Artifact::ExportOptions, 1, candidates)
                    .map(|c| Some(c.path))
            }
        }),
    ));

    strategies.push((
        "generate",
        Box::new(|session: &mut Session<'_>| {
            let Some(team_id) = team_id.filter(|t| !t.is_empty()) else {
                warn!("cannot generate export options without TEAM_ID");
                return Ok(None);
            };
            if !confirm(
                &mut *session.prompter,
                &format!("No export options plist found. Create {}?", CONVENTIONAL_NAME),
            ) {
                return Ok(None);
            }
            generate(root, team_id).map(Some)
        }),
    ));

    match first_success(Artifact::ExportOptions, session, strategies)? {
        Some(path) => {
            info!(path = %path.display(), "using export options");
            Ok(path)
        }
        None => Err(DiscoveryError::not_found(
            Artifact::ExportOptions,
            format!("in {}", root.display()),
        )),
    }
}
