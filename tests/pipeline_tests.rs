//! Pipeline execution tests
//!
//! Runs full plans against a scripted runner that stands in for UAT,
//! codesign and otool, then checks what landed on disk and which exit code
//! a failure maps to.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use macship::bundle::{self, BundleError};
use macship::config::{BuildType, Notarization, Signing, SteamIntegration};
use macship::{
    pipeline, BuildConfiguration, CommandSpec, Error, ExitCode, ToolError, ToolOutput, ToolRunner,
};
use sha2::{Digest, Sha256};
use tempfile::TempDir;

const EXECUTABLE: &[u8] = b"\xcf\xfa\xed\xfe fake mach-o";

/// How the fake build tools behave
#[derive(Clone)]
struct Behaviour {
    /// Info.plist contents the build writes; `None` writes no bundle at all
    info_plist: Option<String>,
    /// Whether the build writes the executable
    executable: bool,
    app_team: &'static str,
    library_team: &'static str,
    links_steam: bool,
    /// Program + first argument that fails when run
    fail_on: Option<&'static str>,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            info_plist: Some(info_plist("MyGame")),
            executable: true,
            app_team: "ABCDE12345",
            library_team: "ABCDE12345",
            links_steam: true,
            fail_on: None,
        }
    }
}

fn info_plist(executable: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>CFBundleExecutable</key>
    <string>{}</string>
    <key>CFBundleIdentifier</key>
    <string>com.example.mygame</string>
</dict>
</plist>"#,
        executable
    )
}

struct FakeTools {
    app: PathBuf,
    behaviour: Behaviour,
    ran: RefCell<Vec<String>>,
}

impl FakeTools {
    fn new(app: PathBuf, behaviour: Behaviour) -> Self {
        Self {
            app,
            behaviour,
            ran: RefCell::new(Vec::new()),
        }
    }

    fn key(spec: &CommandSpec) -> String {
        let program = Path::new(&spec.program)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match spec.args.first() {
            Some(arg) => format!("{} {}", program, arg),
            None => program,
        }
    }

    fn build_bundle(&self) {
        let Some(ref plist) = self.behaviour.info_plist else {
            return;
        };
        fs::create_dir_all(bundle::macos_dir(&self.app)).unwrap();
        fs::write(bundle::info_plist(&self.app), plist).unwrap();
        if self.behaviour.executable {
            fs::write(bundle::macos_dir(&self.app).join("MyGame"), EXECUTABLE).unwrap();
        }
    }
}

impl ToolRunner for FakeTools {
    fn capture(&self, spec: &CommandSpec) -> Result<ToolOutput, ToolError> {
        let key = Self::key(spec);
        self.ran.borrow_mut().push(key.clone());
        let target = spec.args.last().cloned().unwrap_or_default();
        match key.as_str() {
            "codesign -dv" => {
                let team = if target.ends_with("libsteam_api.dylib") {
                    self.behaviour.library_team
                } else {
                    self.behaviour.app_team
                };
                Ok(ToolOutput {
                    stdout: String::new(),
                    stderr: format!("Executable={}\nTeamIdentifier={}\n", target, team),
                })
            }
            "otool -L" => {
                let mut stdout = format!("{}:\n", target);
                if self.behaviour.links_steam {
                    stdout.push_str("\t@rpath/libsteam_api.dylib (compatibility version 1.0.0)\n");
                }
                stdout.push_str("\t/usr/lib/libSystem.B.dylib (compatibility version 1.0.0)\n");
                Ok(ToolOutput {
                    stdout,
                    stderr: String::new(),
                })
            }
            other => panic!("unexpected capture: {}", other),
        }
    }

    fn run(&self, spec: &CommandSpec) -> Result<(), ToolError> {
        let key = Self::key(spec);
        self.ran.borrow_mut().push(key.clone());
        if self.behaviour.fail_on == Some(key.as_str()) {
            return Err(ToolError::Failed {
                program: spec.program.clone(),
                code: Some(1),
                stderr: "errSecInternalComponent".to_string(),
            });
        }
        if key == "RunUAT.sh BuildCookRun" {
            self.build_bundle();
        }
        Ok(())
    }
}

struct Project {
    temp: TempDir,
    config: BuildConfiguration,
}

impl Project {
    fn new(steam: bool) -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let uproject = root.join("My Game.uproject");
        fs::write(&uproject, "{}").unwrap();

        let steam = steam.then(|| {
            let dylib = root.join("sdk").join("libsteam_api.dylib");
            fs::create_dir_all(dylib.parent().unwrap()).unwrap();
            fs::write(&dylib, b"steam").unwrap();
            SteamIntegration {
                app_id: Some(480),
                dylib_src: dylib,
                write_app_id: true,
            }
        });

        let config = BuildConfiguration {
            root_dir: root.clone(),
            uproject,
            short_name: "MyGame".to_string(),
            long_name: "My Game".to_string(),
            module_name: Some("MyGame".to_string()),
            ue_root: root.join("UE_5.4"),
            build_type: BuildType::Development,
            xcode: None,
            signing: Signing {
                team_id: "ABCDE12345".to_string(),
                identity: "Developer ID Application: Example (ABCDE12345)".to_string(),
            },
            notarization: Notarization {
                enabled: false,
                profile: None,
            },
            steam,
            clean_build: false,
        };
        Self { temp, config }
    }

    fn run(&self, behaviour: Behaviour) -> (Result<Option<bundle::BundleReport>, Error>, Vec<String>) {
        let tools = FakeTools::new(self.config.app_path(), behaviour);
        let plan = pipeline::plan(&self.config);
        let result = pipeline::execute(&plan, &self.config, &tools);
        (result, tools.ran.into_inner())
    }
}

fn exit_code(result: Result<Option<bundle::BundleReport>, Error>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::Success,
        Err(e) => e.exit_code(),
    }
}

#[test]
fn test_plain_build_verifies() {
    let project = Project::new(false);
    let (result, ran) = project.run(Behaviour::default());

    let report = result.unwrap().unwrap();
    assert_eq!(report.app, project.config.app_path());
    assert_eq!(report.executable_sha256, hex::encode(Sha256::digest(EXECUTABLE)));
    assert_eq!(report.team_id, None);
    assert_eq!(ran, vec!["RunUAT.sh BuildCookRun", "codesign --force"]);

    let entitlements = project.temp.path().join("Build").join("MyGame.entitlements");
    let value = plist::Value::from_file(entitlements).unwrap();
    assert!(value.as_dictionary().unwrap().is_empty());
}

#[test]
fn test_steam_build_embeds_and_verifies() {
    let project = Project::new(true);
    let (result, ran) = project.run(Behaviour::default());

    let report = result.unwrap().unwrap();
    assert_eq!(report.team_id.as_deref(), Some("ABCDE12345"));
    assert_eq!(
        ran,
        vec![
            "RunUAT.sh BuildCookRun",
            "codesign --force",
            "codesign --force",
            "codesign -dv",
            "codesign -dv",
            "otool -L",
        ]
    );

    let app = project.config.app_path();
    assert_eq!(fs::read(bundle::embedded_steam_library(&app)).unwrap(), b"steam");
    assert_eq!(
        fs::read_to_string(bundle::macos_dir(&app).join(bundle::STEAM_APPID_FILE)).unwrap(),
        "480\n"
    );

    let entitlements = project.temp.path().join("Build").join("MyGame.entitlements");
    let value = plist::Value::from_file(entitlements).unwrap();
    assert_eq!(value.as_dictionary().unwrap().len(), 2);
}

#[test]
fn test_missing_bundle_is_exit_2() {
    let project = Project::new(false);
    let (result, _) = project.run(Behaviour {
        info_plist: None,
        ..Behaviour::default()
    });
    assert!(matches!(
        result,
        Err(Error::Bundle(BundleError::MissingArtifact { .. }))
    ));
    assert_eq!(exit_code(result).as_i32(), 2);
}

#[test]
fn test_team_mismatch_is_exit_3() {
    let project = Project::new(true);
    let (result, ran) = project.run(Behaviour {
        library_team: "ZZZZZ99999",
        ..Behaviour::default()
    });

    let err = result.unwrap_err();
    assert!(err.to_string().contains("ZZZZZ99999"));
    assert_eq!(err.exit_code(), ExitCode::SigningMismatch);
    assert!(!ran.iter().any(|c| c == "otool -L"));
}

#[test]
fn test_unreadable_info_plist_is_exit_4() {
    let project = Project::new(false);
    let (result, _) = project.run(Behaviour {
        info_plist: Some("not a plist".to_string()),
        ..Behaviour::default()
    });
    assert_eq!(exit_code(result).as_i32(), 4);
}

#[test]
fn test_missing_executable_is_exit_5() {
    let project = Project::new(false);
    let (result, _) = project.run(Behaviour {
        executable: false,
        ..Behaviour::default()
    });
    assert_eq!(exit_code(result).as_i32(), 5);

    let (result, _) = project.run(Behaviour {
        info_plist: Some(info_plist("SomethingElse")),
        ..Behaviour::default()
    });
    assert_eq!(exit_code(result), ExitCode::MissingExecutable);
}

#[test]
fn test_missing_linkage_is_exit_6() {
    let project = Project::new(true);
    let (result, _) = project.run(Behaviour {
        links_steam: false,
        ..Behaviour::default()
    });
    assert_eq!(exit_code(result).as_i32(), 6);
}

#[test]
fn test_tool_failure_aborts_remaining_steps() {
    let project = Project::new(true);
    let (result, ran) = project.run(Behaviour {
        fail_on: Some("codesign --force"),
        ..Behaviour::default()
    });

    let err = result.unwrap_err();
    assert!(matches!(err, Error::Tool(ToolError::Failed { .. })));
    assert_eq!(err.exit_code(), ExitCode::Config);
    assert!(err.to_string().contains("errSecInternalComponent"));
    assert_eq!(ran, vec!["RunUAT.sh BuildCookRun", "codesign --force"]);
}
