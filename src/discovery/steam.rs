//! Steamworks library discovery inside the engine tree
//!
//! The engine's Steamworks build file names the SDK version; the SDK lives
//! in a directory derived from it (`1.57` -> `Steamv157`). A missing library
//! is never fatal here; validation decides later whether it is needed.

use regex_lite::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const LIBRARY_NAME: &str = "libsteam_api.dylib";

/// Steamworks directory relative to the engine root
pub const STEAMWORKS_DIR: &str = "Engine/Source/ThirdParty/Steamworks";

pub const BUILD_FILE: &str = "Steamworks.build.cs";

const VERSION_DIR_PREFIX: &str = "Steamv";

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"SteamVersion\s*=\s*"([^"]+)""#).unwrap())
}

/// SDK version assigned in the build file, e.g. `1.57`
pub fn parse_steam_version(build_file: &str) -> Option<String> {
    version_pattern()
        .captures(build_file)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// SDK directory name for `version`
pub fn version_dir(version: &str) -> String {
    let digits: String = version
        .chars()
        .filter(|c| !matches!(c, '.' | '_' | '-'))
        .collect();
    format!("{}{}", VERSION_DIR_PREFIX, digits)
}

/// Where the engine keeps the macOS library for `version`
pub fn expected_library_path(ue_root: &Path, version: &str) -> PathBuf {
    ue_root
        .join(STEAMWORKS_DIR)
        .join(version_dir(version))
        .join("sdk")
        .join("redistributable_bin")
        .join("osx")
        .join(LIBRARY_NAME)
}

/// First `libsteam_api.dylib` anywhere under the Steamworks directory.
pub fn search_library(ue_root: &Path) -> Option<PathBuf> {
    let base = ue_root.join(STEAMWORKS_DIR);
    if !base.is_dir() {
        return None;
    }
    WalkDir::new(&base)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .find(|e| e.file_type().is_file() && e.file_name() == LIBRARY_NAME)
        .map(|e| e.into_path())
}

fn library_from_build_file(ue_root: &Path) -> Option<PathBuf> {
    let build_file = ue_root.join(STEAMWORKS_DIR).join(BUILD_FILE);
    let contents = match fs::read_to_string(&build_file) {
        Ok(c) => c,
        Err(e) => {
            debug!(path = %build_file.display(), error = %e, "no Steamworks build file");
            return None;
        }
    };
    let Some(version) = parse_steam_version(&contents) else {
        warn!(path = %build_file.display(), "no SteamVersion in Steamworks build file");
        return None;
    };
    let path = expected_library_path(ue_root, &version);
    debug!(%version, path = %path.display(), "expected Steamworks library");
    path.is_file().then_some(path)
}

/// Locate the engine's Steamworks library, warning when it cannot be found.
pub fn discover_steam_library(ue_root: &Path) -> Option<PathBuf> {
    let found = library_from_build_file(ue_root).or_else(|| search_library(ue_root));
    match found {
        Some(ref path) => info!(path = %path.display(), "found Steamworks library"),
        None => warn!(
            ue_root = %ue_root.display(),
            "{} not found in the engine; set STEAM_DYLIB_SRC if Steam is enabled",
            LIBRARY_NAME
        ),
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_parse_steam_version() {
        let cs = r#"
public class Steamworks : ModuleRules
{
    public Steamworks(ReadOnlyTargetRules Target) : base(Target)
    {
        string SteamVersion = "1.57";
        bool bSteamSDKFound = Directory.Exists(SDKBaseDir);
    }
}
"#;
        assert_eq!(parse_steam_version(cs).as_deref(), Some("1.57"));
        assert_eq!(parse_steam_version("SteamVersion=\"v153a\";").as_deref(), Some("v153a"));
        assert_eq!(parse_steam_version("string Version = \"1.57\";"), None);
    }

    #[test]
    fn test_version_dir() {
        assert_eq!(version_dir("1.57"), "Steamv157");
        assert_eq!(version_dir("1_5-3"), "Steamv153");
    }

    #[test]
    fn test_expected_path_from_build_file() {
        let temp = TempDir::new().unwrap();
        let steam = temp.path().join(STEAMWORKS_DIR);
        fs::create_dir_all(&steam).unwrap();
        fs::write(steam.join(BUILD_FILE), "string SteamVersion = \"1.57\";").unwrap();
        let expected = expected_library_path(temp.path(), "1.57");
        touch(&expected);
        touch(&steam.join("Other").join(LIBRARY_NAME));

        assert_eq!(discover_steam_library(temp.path()), Some(expected));
    }

    #[test]
    fn test_falls_back_to_search() {
        let temp = TempDir::new().unwrap();
        let lib = temp
            .path()
            .join(STEAMWORKS_DIR)
            .join("Steamv160/sdk/redistributable_bin/osx")
            .join(LIBRARY_NAME);
        touch(&lib);

        assert_eq!(discover_steam_library(temp.path()), Some(lib));
    }

    #[test]
    fn test_absent_is_none() {
        let temp = TempDir::new().unwrap();
        assert_eq!(discover_steam_library(temp.path()), None);
    }
}
