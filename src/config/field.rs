//! Configuration field catalogue
//!
//! Every resolvable parameter, with its environment name, config-file key,
//! CLI flag and the remediation text shown when it is missing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolvable configuration field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    RootDir,
    Uproject,
    ShortName,
    LongName,
    UeRoot,
    Workspace,
    Scheme,
    XcodeConfig,
    BuildType,
    TeamId,
    SignIdentity,
    ExportPlist,
    NotaryProfile,
    Notarize,
    UseXcodeExport,
    EnableSteam,
    SteamAppId,
    SteamDylibSrc,
    WriteSteamAppId,
    CleanBuild,
    DryRun,
    PrintConfig,
    StrictToolchain,
}

impl Field {
    /// All fields in display order
    pub const ALL: &'static [Field] = &[
        Field::RootDir,
        Field::Uproject,
        Field::ShortName,
        Field::LongName,
        Field::UeRoot,
        Field::Workspace,
        Field::Scheme,
        Field::XcodeConfig,
        Field::BuildType,
        Field::TeamId,
        Field::SignIdentity,
        Field::ExportPlist,
        Field::NotaryProfile,
        Field::Notarize,
        Field::UseXcodeExport,
        Field::EnableSteam,
        Field::SteamAppId,
        Field::SteamDylibSrc,
        Field::WriteSteamAppId,
        Field::CleanBuild,
        Field::DryRun,
        Field::PrintConfig,
        Field::StrictToolchain,
    ];

    /// Environment / env-file variable name
    pub fn env_name(self) -> &'static str {
        match self {
            Field::RootDir => "ROOT_DIR",
            Field::Uproject => "UPROJECT_PATH",
            Field::ShortName => "SHORT_NAME",
            Field::LongName => "LONG_NAME",
            Field::UeRoot => "UE_ROOT",
            Field::Workspace => "XCODE_WORKSPACE",
            Field::Scheme => "XCODE_SCHEME",
            Field::XcodeConfig => "XCODE_CONFIG",
            Field::BuildType => "BUILD_TYPE",
            Field::TeamId => "TEAM_ID",
            Field::SignIdentity => "SIGN_IDENTITY",
            Field::ExportPlist => "EXPORT_PLIST",
            Field::NotaryProfile => "NOTARY_PROFILE",
            Field::Notarize => "NOTARIZE",
            Field::UseXcodeExport => "USE_XCODE_EXPORT",
            Field::EnableSteam => "ENABLE_STEAM",
            Field::SteamAppId => "STEAM_APP_ID",
            Field::SteamDylibSrc => "STEAM_DYLIB_SRC",
            Field::WriteSteamAppId => "WRITE_STEAM_APPID",
            Field::CleanBuild => "CLEAN_BUILD",
            Field::DryRun => "DRY_RUN",
            Field::PrintConfig => "PRINT_CONFIG",
            Field::StrictToolchain => "STRICT_TOOLCHAIN",
        }
    }

    /// Key in `macship.toml` (lowercase env name)
    pub fn key(self) -> String {
        self.env_name().to_ascii_lowercase()
    }

    /// Command-line flag that sets this field
    pub fn flag(self) -> &'static str {
        match self {
            Field::RootDir => "--root",
            Field::Uproject => "--uproject",
            Field::ShortName => "--short-name",
            Field::LongName => "--long-name",
            Field::UeRoot => "--ue-root",
            Field::Workspace => "--workspace",
            Field::Scheme => "--scheme",
            Field::XcodeConfig => "--xcode-config",
            Field::BuildType => "--build-type",
            Field::TeamId => "--team-id",
            Field::SignIdentity => "--sign-identity",
            Field::ExportPlist => "--export-plist",
            Field::NotaryProfile => "--notary-profile",
            Field::Notarize => "--notarize",
            Field::UseXcodeExport => "--xcode-export",
            Field::EnableSteam => "--enable-steam",
            Field::SteamAppId => "--steam-app-id",
            Field::SteamDylibSrc => "--steam-dylib-src",
            Field::WriteSteamAppId => "--write-steam-appid",
            Field::CleanBuild => "--clean",
            Field::DryRun => "--dry-run",
            Field::PrintConfig => "--print-config",
            Field::StrictToolchain => "--strict-toolchain",
        }
    }

    /// Whether the field holds a yes/no toggle
    pub fn is_toggle(self) -> bool {
        matches!(
            self,
            Field::Notarize
                | Field::UseXcodeExport
                | Field::EnableSteam
                | Field::WriteSteamAppId
                | Field::CleanBuild
                | Field::DryRun
                | Field::PrintConfig
                | Field::StrictToolchain
        )
    }

    /// Whether the field holds a filesystem path
    pub fn is_path(self) -> bool {
        matches!(
            self,
            Field::RootDir
                | Field::Uproject
                | Field::UeRoot
                | Field::Workspace
                | Field::ExportPlist
                | Field::SteamDylibSrc
        )
    }

    pub fn description(self) -> &'static str {
        match self {
            Field::RootDir => "project root directory",
            Field::Uproject => "path to the .uproject file",
            Field::ShortName => "short project name (no whitespace)",
            Field::LongName => "display name of the app",
            Field::UeRoot => "Unreal Engine installation root (the directory containing Engine/)",
            Field::Workspace => "Xcode workspace (.xcworkspace)",
            Field::Scheme => "Xcode scheme to archive",
            Field::XcodeConfig => "Xcode build configuration",
            Field::BuildType => "build type (Shipping or Development)",
            Field::TeamId => "Apple Developer Team ID",
            Field::SignIdentity => "code signing identity, e.g. \"Developer ID Application: Name (TEAMID)\"",
            Field::ExportPlist => "ExportOptions.plist for xcodebuild -exportArchive",
            Field::NotaryProfile => "notarytool keychain profile name",
            Field::Notarize => "whether to notarize (yes/no)",
            Field::UseXcodeExport => "whether to archive and export through Xcode",
            Field::EnableSteam => "whether to bundle the Steamworks library",
            Field::SteamAppId => "numeric Steam app id",
            Field::SteamDylibSrc => "path to libsteam_api.dylib",
            Field::WriteSteamAppId => "whether to write steam_appid.txt into the app",
            Field::CleanBuild => "whether to clean before building",
            Field::DryRun => "print the plan without running it",
            Field::PrintConfig => "print the resolved configuration and exit",
            Field::StrictToolchain => "fail when the toolchain mapping check cannot decide",
        }
    }

    /// Remediation text for a missing or invalid value
    pub fn hint(self) -> String {
        format!(
            "{}: pass {} or set {} in the environment or .env file",
            self.description(),
            self.flag(),
            self.env_name()
        )
    }

    pub fn from_env_name(name: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.env_name() == name)
    }

    pub fn from_key(key: &str) -> Option<Field> {
        let key = key.to_ascii_lowercase();
        Field::ALL.iter().copied().find(|f| f.key() == key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.env_name())
    }
}
