//! Built-in defaults (lowest tier)
//!
//! Hardcoded defaults for fields that have a sensible value without any
//! project knowledge. Everything else starts unset.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::field::Field;
use super::store::{ConfigStore, Tier};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Project root (default: current working directory)
    pub root_dir: PathBuf,

    /// Build type (default: "Shipping")
    pub build_type: String,

    /// Xcode build configuration (default: "Shipping")
    pub xcode_config: String,

    /// Notarize after signing (default: true)
    pub notarize: bool,

    /// Archive/export through Xcode (default: true)
    pub use_xcode_export: bool,

    /// Bundle Steamworks (default: false)
    pub enable_steam: bool,

    /// Write steam_appid.txt (default: false)
    pub write_steam_appid: bool,

    /// Clean before building (default: false)
    pub clean_build: bool,
}

impl BuiltinDefaults {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            build_type: "Shipping".to_string(),
            xcode_config: "Shipping".to_string(),
            notarize: true,
            use_xcode_export: true,
            enable_steam: false,
            write_steam_appid: false,
            clean_build: false,
        }
    }

    /// Field/value pairs for the default tier
    pub fn entries(&self) -> Vec<(Field, String)> {
        let toggle = |b: bool| if b { "1" } else { "0" }.to_string();
        vec![
            (Field::RootDir, self.root_dir.to_string_lossy().to_string()),
            (Field::BuildType, self.build_type.clone()),
            (Field::XcodeConfig, self.xcode_config.clone()),
            (Field::Notarize, if self.notarize { "yes" } else { "no" }.to_string()),
            (Field::UseXcodeExport, toggle(self.use_xcode_export)),
            (Field::EnableSteam, toggle(self.enable_steam)),
            (Field::WriteSteamAppId, toggle(self.write_steam_appid)),
            (Field::CleanBuild, toggle(self.clean_build)),
        ]
    }

    /// Write every default into `store` at the default tier
    pub fn apply(&self, store: &mut ConfigStore) {
        for (field, value) in self.entries() {
            store.set(field, value, Tier::Default);
        }
    }
}
