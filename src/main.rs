//! macship CLI
//!
//! Entry point for the `macship` command-line tool.

use clap::Parser;
use macship::config::Field;
use macship::{logging, pipeline, prompt, Error, ExitCode, ResolveOptions, Resolver, SystemRunner};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "macship")]
#[command(about = "Resolve, build, sign and notarize an Unreal Engine macOS app", version)]
struct Cli {
    /// Project root (default: current directory)
    #[arg(long)]
    root: Option<String>,

    /// Project descriptor (.uproject)
    #[arg(long)]
    uproject: Option<String>,

    /// Identifier-style name, no whitespace (default: descriptor name with spaces removed)
    #[arg(long)]
    short_name: Option<String>,

    /// Display name of the app (default: descriptor name)
    #[arg(long)]
    long_name: Option<String>,

    /// Unreal Engine installation root
    #[arg(long)]
    ue_root: Option<String>,

    /// Xcode workspace used for archive/export
    #[arg(long)]
    workspace: Option<String>,

    /// Xcode scheme
    #[arg(long)]
    scheme: Option<String>,

    /// Xcode build configuration (default: Shipping)
    #[arg(long)]
    xcode_config: Option<String>,

    /// Unreal build type: Shipping or Development
    #[arg(long)]
    build_type: Option<String>,

    /// Apple developer team identifier
    #[arg(long)]
    team_id: Option<String>,

    /// Code signing identity
    #[arg(long)]
    sign_identity: Option<String>,

    /// Export options plist for xcodebuild -exportArchive
    #[arg(long)]
    export_plist: Option<String>,

    /// notarytool keychain profile
    #[arg(long)]
    notary_profile: Option<String>,

    /// Notarize the signed app: yes or no
    #[arg(long, value_name = "yes|no")]
    notarize: Option<String>,

    /// Archive and export through Xcode
    #[arg(long, conflicts_with = "no_xcode_export")]
    xcode_export: bool,

    /// Package the UAT output directly without Xcode
    #[arg(long)]
    no_xcode_export: bool,

    /// Embed the Steamworks library
    #[arg(long)]
    enable_steam: bool,

    /// Steam app id
    #[arg(long)]
    steam_app_id: Option<String>,

    /// Steamworks library to embed
    #[arg(long)]
    steam_dylib_src: Option<String>,

    /// Write steam_appid.txt next to the executable
    #[arg(long)]
    write_steam_appid: bool,

    /// Clean before building
    #[arg(long)]
    clean: bool,

    /// Print the plan instead of running it
    #[arg(long)]
    dry_run: bool,

    /// Print the resolved configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Fail when the engine's toolchain policy cannot be evaluated
    #[arg(long)]
    strict_toolchain: bool,

    /// TOML config file (default: <root>/macship.toml if present)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Env file (default: <root>/.env if present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Where engine installations are searched
    #[arg(long)]
    engines_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    /// Values for the CLI tier; absent options and unset switches are not provided.
    fn values(&self) -> Vec<(Field, String)> {
        let options = [
            (Field::RootDir, &self.root),
            (Field::Uproject, &self.uproject),
            (Field::ShortName, &self.short_name),
            (Field::LongName, &self.long_name),
            (Field::UeRoot, &self.ue_root),
            (Field::Workspace, &self.workspace),
            (Field::Scheme, &self.scheme),
            (Field::XcodeConfig, &self.xcode_config),
            (Field::BuildType, &self.build_type),
            (Field::TeamId, &self.team_id),
            (Field::SignIdentity, &self.sign_identity),
            (Field::ExportPlist, &self.export_plist),
            (Field::NotaryProfile, &self.notary_profile),
            (Field::Notarize, &self.notarize),
            (Field::SteamAppId, &self.steam_app_id),
            (Field::SteamDylibSrc, &self.steam_dylib_src),
        ];
        let switches = [
            (Field::EnableSteam, self.enable_steam),
            (Field::WriteSteamAppId, self.write_steam_appid),
            (Field::CleanBuild, self.clean),
            (Field::DryRun, self.dry_run),
            (Field::PrintConfig, self.print_config),
            (Field::StrictToolchain, self.strict_toolchain),
        ];

        let mut values: Vec<(Field, String)> = options
            .into_iter()
            .filter_map(|(field, value)| value.clone().map(|v| (field, v)))
            .collect();
        values.extend(
            switches
                .into_iter()
                .filter(|(_, on)| *on)
                .map(|(field, _)| (field, "1".to_string())),
        );
        if self.xcode_export {
            values.push((Field::UseXcodeExport, "1".to_string()));
        } else if self.no_xcode_export {
            values.push((Field::UseXcodeExport, "0".to_string()));
        }
        values
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::Config
            } else {
                ExitCode::Success
            };
            process::exit(code.as_i32());
        }
    };

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("warning: logging unavailable: {}", e);
    }

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            e.exit_code()
        }
    };
    process::exit(code.as_i32());
}

fn run(cli: &Cli) -> Result<ExitCode, Error> {
    let cwd = std::env::current_dir().map_err(|e| Error::io("reading current directory", e))?;
    let mut options = ResolveOptions::new(cwd);
    options.config_file = cli.config.clone();
    options.env_file = cli.env_file.clone();
    options.environment = std::env::vars().collect();
    options.cli = cli.values();
    if let Some(ref dir) = cli.engines_dir {
        options.engines_dir = dir.clone();
    }

    let mut prompter = prompt::detect();
    let runner = SystemRunner;
    let resolution = Resolver::new(&mut *prompter, &runner).resolve(&options)?;

    if resolution.flag(Field::PrintConfig) {
        let effective = resolution.effective();
        if cli.json {
            let json = effective
                .to_json()
                .map_err(|e| Error::Usage(format!("serializing configuration: {}", e)))?;
            println!("{}", json);
        } else {
            print!("{}", effective.to_human());
        }
        resolution.finalize()?;
        return Ok(ExitCode::Success);
    }

    let config = resolution.finalize()?;

    let plan = pipeline::plan(&config);
    if resolution.flag(Field::DryRun) {
        if cli.json {
            let json = serde_json::to_string_pretty(&plan)
                .map_err(|e| Error::Usage(format!("serializing plan: {}", e)))?;
            println!("{}", json);
        } else {
            print!("{}", plan);
        }
        return Ok(ExitCode::Success);
    }

    let report = pipeline::execute(&plan, &config, &runner)?;
    if let (true, Some(report)) = (cli.json, report) {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| Error::Usage(format!("serializing bundle report: {}", e)))?;
        println!("{}", json);
    }
    Ok(ExitCode::Success)
}
