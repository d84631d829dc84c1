//! App bundle layout and post-build verification
//!
//! Checks the finished `.app` the way a scripted consumer relies on it: the
//! bundle exists, its Info.plist names an executable that is present, and
//! with Steam enabled the embedded library is signed by the same team and
//! actually linked. Each failure has its own exit code.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::BuildConfiguration;
use crate::discovery::steam::LIBRARY_NAME;
use crate::error::ExitCode;
use crate::tools::xcode::{codesign_display_command, otool_command};
use crate::tools::{ToolError, ToolRunner};

pub const STEAM_APPID_FILE: &str = "steam_appid.txt";

pub fn info_plist(app: &Path) -> PathBuf {
    app.join("Contents").join("Info.plist")
}

pub fn macos_dir(app: &Path) -> PathBuf {
    app.join("Contents").join("MacOS")
}

pub fn frameworks_dir(app: &Path) -> PathBuf {
    app.join("Contents").join("Frameworks")
}

/// Where the Steamworks library is embedded
pub fn embedded_steam_library(app: &Path) -> PathBuf {
    frameworks_dir(app).join(LIBRARY_NAME)
}

/// Bundle verification errors
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("expected artifact is missing: {}", path.display())]
    MissingArtifact { path: PathBuf },

    #[error("cannot read bundle metadata {}: {reason}", path.display())]
    UnreadableMetadata { path: PathBuf, reason: String },

    #[error("bundle executable is missing: {}", path.display())]
    MissingExecutable { path: PathBuf },

    #[error("signing team mismatch: app is signed by {}, embedded library by {}", display_team(.app), display_team(.library))]
    SigningMismatch {
        app: Option<String>,
        library: Option<String>,
    },

    #[error("{} does not link {library}", executable.display())]
    MissingLinkage { executable: PathBuf, library: String },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Tool(#[from] ToolError),
}

fn display_team(team: &Option<String>) -> &str {
    team.as_deref().unwrap_or("no team")
}

impl BundleError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            BundleError::MissingArtifact { .. } => ExitCode::MissingArtifact,
            BundleError::SigningMismatch { .. } => ExitCode::SigningMismatch,
            BundleError::UnreadableMetadata { .. } => ExitCode::UnreadableBundleMetadata,
            BundleError::MissingExecutable { .. } => ExitCode::MissingExecutable,
            BundleError::MissingLinkage { .. } => ExitCode::MissingLinkage,
            BundleError::Io { .. } | BundleError::Tool(_) => ExitCode::Config,
        }
    }
}

/// `CFBundleExecutable` from the bundle's Info.plist
pub fn read_bundle_executable(app: &Path) -> Result<String, BundleError> {
    let path = info_plist(app);
    let unreadable = |reason: String| BundleError::UnreadableMetadata {
        path: path.clone(),
        reason,
    };

    let value = plist::Value::from_file(&path).map_err(|e| unreadable(e.to_string()))?;
    value
        .as_dictionary()
        .and_then(|dict| dict.get("CFBundleExecutable"))
        .and_then(plist::Value::as_string)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| unreadable("no CFBundleExecutable".to_string()))
}

/// `TeamIdentifier=` value from `codesign -dv` output; `not set` reads as none.
pub fn parse_team_identifier(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("TeamIdentifier="))
        .map(str::trim)
        .filter(|team| !team.is_empty() && *team != "not set")
        .map(str::to_string)
}

/// Team that signed `path`, per codesign.
pub fn team_identifier(runner: &dyn ToolRunner, path: &Path) -> Result<Option<String>, BundleError> {
    let output = runner.capture(&codesign_display_command(path))?;
    // codesign -d writes its report to stderr
    Ok(parse_team_identifier(&output.stderr).or_else(|| parse_team_identifier(&output.stdout)))
}

/// Whether `otool -L` output lists a load command for `library`.
pub fn links_library(otool_output: &str, library: &str) -> bool {
    otool_output
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .any(|install_name| {
            Path::new(install_name)
                .file_name()
                .is_some_and(|name| name == library)
        })
}

fn sha256_file(path: &Path) -> Result<String, BundleError> {
    let bytes = fs::read(path).map_err(|source| BundleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// What verification saw
#[derive(Debug, Clone, Serialize)]
pub struct BundleReport {
    pub app: PathBuf,
    pub executable: PathBuf,
    pub executable_sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

/// Verify the bundle the configuration is expected to produce.
pub fn verify_bundle(
    config: &BuildConfiguration,
    runner: &dyn ToolRunner,
) -> Result<BundleReport, BundleError> {
    let app = config.app_path();
    if !app.is_dir() {
        return Err(BundleError::MissingArtifact { path: app });
    }

    let executable_name = read_bundle_executable(&app)?;
    let executable = macos_dir(&app).join(&executable_name);
    if !executable.is_file() {
        return Err(BundleError::MissingExecutable { path: executable });
    }
    let executable_sha256 = sha256_file(&executable)?;
    debug!(executable = %executable.display(), sha256 = %executable_sha256, "bundle executable");

    let mut team_id = None;
    if config.steam.is_some() {
        let library = embedded_steam_library(&app);
        if !library.is_file() {
            return Err(BundleError::MissingArtifact { path: library });
        }

        let app_team = team_identifier(runner, &app)?;
        let library_team = team_identifier(runner, &library)?;
        if app_team != library_team {
            return Err(BundleError::SigningMismatch {
                app: app_team,
                library: library_team,
            });
        }
        team_id = app_team;

        let linkage = runner.capture(&otool_command(&executable))?;
        if !links_library(&linkage.stdout, LIBRARY_NAME) {
            return Err(BundleError::MissingLinkage {
                executable,
                library: LIBRARY_NAME.to_string(),
            });
        }
    }

    info!(app = %app.display(), "bundle verified");
    Ok(BundleReport {
        app,
        executable,
        executable_sha256,
        team_id,
    })
}
