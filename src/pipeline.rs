//! Build/sign/notarize plan for a resolved configuration
//!
//! The plan is built up front from a [`BuildConfiguration`] so a dry run can
//! print exactly what would execute. Execution is sequential and stops at
//! the first failing step.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::bundle::{self, BundleReport, STEAM_APPID_FILE};
use crate::config::BuildConfiguration;
use crate::discovery::engine::UAT_SCRIPT;
use crate::entitlements;
use crate::error::Error;
use crate::tools::{CommandSpec, ToolRunner};

/// Schema version for `--dry-run --json` output
pub const SCHEMA_VERSION: u32 = 1;

/// One pipeline step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    /// Run an external tool
    Tool { label: String, command: CommandSpec },
    /// Copy a file, creating the destination directory
    Copy { from: PathBuf, to: PathBuf },
    /// Write a small text file
    Write { path: PathBuf, contents: String },
    /// Render the entitlements plist
    Entitlements { path: PathBuf, steam: bool },
    /// Check the finished bundle
    Verify { app: PathBuf },
}

impl Step {
    fn tool(label: &str, command: CommandSpec) -> Self {
        Step::Tool {
            label: label.to_string(),
            command,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Tool { label, command } => write!(f, "{}: {}", label, command),
            Step::Copy { from, to } => write!(f, "copy {} -> {}", from.display(), to.display()),
            Step::Write { path, contents } => {
                write!(f, "write {} ({:?})", path.display(), contents.trim_end())
            }
            Step::Entitlements { path, steam } => write!(
                f,
                "write entitlements {} ({})",
                path.display(),
                if *steam { "steam" } else { "empty" }
            ),
            Step::Verify { app } => write!(f, "verify {}", app.display()),
        }
    }
}

/// Ordered steps for one run
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    pub app_path: PathBuf,
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Plan ({} steps) for {}", self.steps.len(), self.app_path.display())?;
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(f, "  {:>2}. {}", i + 1, step)?;
        }
        Ok(())
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn codesign(identity: &str, entitlements: Option<&Path>, target: &Path) -> CommandSpec {
    let mut command = CommandSpec::new("codesign").args(["--force", "--timestamp", "--options", "runtime"]);
    if let Some(entitlements) = entitlements {
        command = command.arg("--entitlements").arg(path_arg(entitlements));
    }
    command.arg("--sign").arg(identity).arg(path_arg(target))
}

/// Build the plan for `config`.
pub fn plan(config: &BuildConfiguration) -> Plan {
    let build_dir = config.build_dir();
    let app = config.app_path();
    let mut steps = Vec::new();

    let mut uat = CommandSpec::new(path_arg(&config.ue_root.join(UAT_SCRIPT)))
        .arg("BuildCookRun")
        .arg(format!("-project={}", config.uproject.display()))
        .arg("-platform=Mac")
        .arg(format!("-clientconfig={}", config.build_type))
        .args(["-build", "-cook", "-stage", "-pak", "-archive"])
        .arg(format!("-archivedirectory={}", build_dir.display()));
    if config.clean_build {
        uat = uat.arg("-clean");
    }
    steps.push(Step::tool("build", uat));

    if let Some(ref xcode) = config.xcode {
        let archive = build_dir
            .join("Xcode")
            .join(format!("{}.xcarchive", config.long_name));
        steps.push(Step::tool(
            "archive",
            CommandSpec::new("xcodebuild")
                .arg("archive")
                .arg("-workspace")
                .arg(path_arg(&xcode.workspace))
                .arg("-scheme")
                .arg(xcode.scheme.as_str())
                .arg("-configuration")
                .arg(xcode.configuration.as_str())
                .arg("-archivePath")
                .arg(path_arg(&archive)),
        ));
        steps.push(Step::tool(
            "export",
            CommandSpec::new("xcodebuild")
                .arg("-exportArchive")
                .arg("-archivePath")
                .arg(path_arg(&archive))
                .arg("-exportPath")
                .arg(path_arg(&build_dir.join("Xcode").join("Export")))
                .arg("-exportOptionsPlist")
                .arg(path_arg(&xcode.export_plist)),
        ));
    }

    let embedded = bundle::embedded_steam_library(&app);
    if let Some(ref steam) = config.steam {
        steps.push(Step::Copy {
            from: steam.dylib_src.clone(),
            to: embedded.clone(),
        });
        if let (true, Some(app_id)) = (steam.write_app_id, steam.app_id) {
            steps.push(Step::Write {
                path: bundle::macos_dir(&app).join(STEAM_APPID_FILE),
                contents: format!("{}\n", app_id),
            });
        }
    }

    let entitlements_path = build_dir.join(format!("{}.entitlements", config.short_name));
    steps.push(Step::Entitlements {
        path: entitlements_path.clone(),
        steam: config.steam.is_some(),
    });

    if config.steam.is_some() {
        steps.push(Step::tool(
            "sign library",
            codesign(&config.signing.identity, None, &embedded),
        ));
    }
    steps.push(Step::tool(
        "sign app",
        codesign(&config.signing.identity, Some(&entitlements_path), &app),
    ));

    if let (true, Some(profile)) = (config.notarization.enabled, config.notarization.profile.as_deref()) {
        let zip = build_dir.join(format!("{}.zip", config.short_name));
        steps.push(Step::tool(
            "package",
            CommandSpec::new("ditto")
                .args(["-c", "-k", "--keepParent"])
                .arg(path_arg(&app))
                .arg(path_arg(&zip)),
        ));
        steps.push(Step::tool(
            "notarize",
            CommandSpec::new("xcrun")
                .args(["notarytool", "submit"])
                .arg(path_arg(&zip))
                .arg("--keychain-profile")
                .arg(profile)
                .arg("--wait"),
        ));
        steps.push(Step::tool(
            "staple",
            CommandSpec::new("xcrun")
                .args(["stapler", "staple"])
                .arg(path_arg(&app)),
        ));
    }

    steps.push(Step::Verify { app: app.clone() });

    Plan {
        schema_version: SCHEMA_VERSION,
        created_at: Utc::now(),
        app_path: app,
        steps,
    }
}

fn ensure_parent(path: &Path) -> Result<(), Error> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent)
            .map_err(|e| Error::io(format!("creating {}", parent.display()), e)),
        None => Ok(()),
    }
}

fn execute_step(
    step: &Step,
    config: &BuildConfiguration,
    runner: &dyn ToolRunner,
) -> Result<Option<BundleReport>, Error> {
    match step {
        Step::Tool { command, .. } => runner.run(command)?,
        Step::Copy { from, to } => {
            ensure_parent(to)?;
            fs::copy(from, to).map_err(|e| {
                Error::io(format!("copying {} to {}", from.display(), to.display()), e)
            })?;
        }
        Step::Write { path, contents } => {
            ensure_parent(path)?;
            fs::write(path, contents)
                .map_err(|e| Error::io(format!("writing {}", path.display()), e))?;
        }
        Step::Entitlements { path, steam } => {
            let xml = entitlements::render(*steam).map_err(|e| {
                Error::io(
                    "rendering entitlements",
                    std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()),
                )
            })?;
            ensure_parent(path)?;
            fs::write(path, xml).map_err(|e| Error::io(format!("writing {}", path.display()), e))?;
        }
        Step::Verify { .. } => return Ok(Some(bundle::verify_bundle(config, runner)?)),
    }
    Ok(None)
}

/// Execute `plan` in order; the first failure aborts the run.
pub fn execute(
    plan: &Plan,
    config: &BuildConfiguration,
    runner: &dyn ToolRunner,
) -> Result<Option<BundleReport>, Error> {
    let mut report = None;
    for (i, step) in plan.steps.iter().enumerate() {
        info!(step = i + 1, total = plan.len(), "{}", step);
        if let Some(r) = execute_step(step, config, runner)? {
            report = Some(r);
        }
        debug!(step = i + 1, "step finished");
    }
    Ok(report)
}
