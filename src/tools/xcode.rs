//! Xcode and engine command builders, and parsers for their output

use std::path::Path;

use super::CommandSpec;

/// Installed Xcode as reported by `xcodebuild -version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XcodeVersion {
    /// Marketing version, e.g. "15.2"
    pub version: String,
    /// Build identifier, e.g. "15C500b"
    pub build: String,
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// `xcodebuild -list -workspace <ws>`
pub fn list_schemes_command(workspace: &Path) -> CommandSpec {
    CommandSpec::new("xcodebuild").args(["-list", "-workspace"]).arg(path_arg(workspace))
}

/// `xcodebuild -version`
pub fn xcode_version_command() -> CommandSpec {
    CommandSpec::new("xcodebuild").arg("-version")
}

/// Regenerate the engine's Xcode project files for `uproject`.
pub fn generate_project_files_command(ue_root: &Path, uproject: &Path) -> CommandSpec {
    let script = ue_root
        .join("Engine")
        .join("Build")
        .join("BatchFiles")
        .join("Mac")
        .join("GenerateProjectFiles.sh");
    CommandSpec::new(path_arg(&script))
        .arg(format!("-project={}", uproject.display()))
        .arg("-game")
}

/// `codesign -dv --verbose=4 <path>`; details go to stderr.
pub fn codesign_display_command(path: &Path) -> CommandSpec {
    CommandSpec::new("codesign")
        .args(["-dv", "--verbose=4"])
        .arg(path_arg(path))
}

/// `otool -L <executable>`
pub fn otool_command(executable: &Path) -> CommandSpec {
    CommandSpec::new("otool").arg("-L").arg(path_arg(executable))
}

/// Extract scheme names from `xcodebuild -list` output.
///
/// Finds the `Schemes:` header and collects the lines indented deeper than
/// it, stopping at the first blank or shallower line.
pub fn parse_scheme_list(output: &str) -> Vec<String> {
    let mut lines = output.lines();
    let header_indent = loop {
        match lines.next() {
            Some(line) if line.trim() == "Schemes:" => break indent_of(line),
            Some(_) => continue,
            None => return Vec::new(),
        }
    };

    let mut schemes = Vec::new();
    for line in lines {
        if line.trim().is_empty() || indent_of(line) <= header_indent {
            break;
        }
        schemes.push(line.trim().to_string());
    }
    schemes
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Parse `xcodebuild -version` output.
pub fn parse_xcode_version(output: &str) -> Option<XcodeVersion> {
    let mut version = None;
    let mut build = String::new();

    for line in output.lines().map(str::trim) {
        if let Some(v) = line.strip_prefix("Xcode ") {
            version = Some(v.trim().to_string());
        } else if let Some(b) = line.strip_prefix("Build version ") {
            build = b.trim().to_string();
        }
    }

    version
        .filter(|v| !v.is_empty())
        .map(|version| XcodeVersion { version, build })
}
