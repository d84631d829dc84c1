//! Finalized build configuration
//!
//! Produced only by [`crate::validate::validate`]; nothing mutates it after.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Unreal build type passed to UAT as `-clientconfig`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildType {
    Shipping,
    Development,
}

impl FromStr for BuildType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shipping" => Ok(BuildType::Shipping),
            "development" => Ok(BuildType::Development),
            _ => Err("expected Shipping or Development".to_string()),
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildType::Shipping => f.write_str("Shipping"),
            BuildType::Development => f.write_str("Development"),
        }
    }
}

/// Xcode archive/export target, present only in Xcode export mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XcodeTarget {
    pub workspace: PathBuf,
    pub scheme: String,
    pub configuration: String,
    pub export_plist: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signing {
    pub team_id: String,
    pub identity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notarization {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

/// Steamworks integration, present only when enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SteamIntegration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<u32>,
    pub dylib_src: PathBuf,
    pub write_app_id: bool,
}

/// Everything a pipeline run needs, fully resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfiguration {
    pub root_dir: PathBuf,
    pub uproject: PathBuf,
    pub short_name: String,
    pub long_name: String,

    /// First module listed in the project descriptor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,

    pub ue_root: PathBuf,
    pub build_type: BuildType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub xcode: Option<XcodeTarget>,

    pub signing: Signing,
    pub notarization: Notarization,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub steam: Option<SteamIntegration>,

    pub clean_build: bool,
}

impl BuildConfiguration {
    /// Output directory for everything the pipeline produces
    pub fn build_dir(&self) -> PathBuf {
        self.root_dir.join("Build")
    }

    /// Where the finished app bundle is expected
    pub fn app_path(&self) -> PathBuf {
        let app = format!("{}.app", self.long_name);
        match self.xcode {
            Some(_) => self.build_dir().join("Xcode").join("Export").join(app),
            None => self.build_dir().join("Mac").join(app),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_type_parse() {
        assert_eq!("shipping".parse::<BuildType>(), Ok(BuildType::Shipping));
        assert_eq!(" Development ".parse::<BuildType>(), Ok(BuildType::Development));
        assert!("Debug".parse::<BuildType>().is_err());
        assert_eq!(BuildType::Shipping.to_string(), "Shipping");
    }
}
