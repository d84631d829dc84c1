//! Compatibility policy file.
//!
//! The policy is a JSON document:
//!
//! ```json
//! {
//!     "MinVersion": "14.1.0",
//!     "MaxVersion": "16.9.0",
//!     "AppleVersionToLLVMVersions": ["14.0.0-14.0.0", "15.0.0-16.0.0"]
//! }
//! ```
//!
//! Every field is optional. Fields of the wrong type read as absent.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::version::{normalize, VersionTriplet};

/// Key holding the lower bound of the supported range.
pub const MIN_VERSION_KEY: &str = "MinVersion";

/// Key holding the upper bound of the supported range.
pub const MAX_VERSION_KEY: &str = "MaxVersion";

/// Key holding the dash-joined mapping tokens.
pub const MAPPINGS_KEY: &str = "AppleVersionToLLVMVersions";

/// Policy loading errors
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("failed to read policy file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse policy file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("policy document is not a JSON object")]
    NotAnObject,
}

/// Raw policy as declared on disk. Strings are kept verbatim; interpretation
/// happens at check time so malformed entries degrade to warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityPolicy {
    #[serde(rename = "MinVersion", default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,

    #[serde(rename = "MaxVersion", default, skip_serializing_if = "Option::is_none")]
    pub max_version: Option<String>,

    #[serde(rename = "AppleVersionToLLVMVersions", default)]
    pub mappings: Vec<String>,
}

/// One `<source>-<target>` mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingToken {
    /// Left-hand side exactly as written
    pub source_text: String,
    pub source: VersionTriplet,
    pub target: VersionTriplet,
}

fn mapping_pattern() -> &'static regex_lite::Regex {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| regex_lite::Regex::new(r"^(\d+(?:\.\d+)*)-(\d+(?:\.\d+)*)$").unwrap())
}

impl MappingToken {
    /// Parse a dash-joined dual version token. Returns `None` for anything
    /// that is not exactly `<ver>-<ver>`.
    pub fn parse(token: &str) -> Option<Self> {
        let caps = mapping_pattern().captures(token.trim())?;
        let source_text = caps.get(1)?.as_str();
        let source = normalize(source_text).ok()?;
        let target = normalize(caps.get(2)?.as_str()).ok()?;
        Some(Self {
            source_text: source_text.to_string(),
            source,
            target,
        })
    }

    /// Whether `installed` in x.y.z form is spelled exactly like the left-hand side.
    ///
    /// A short left-hand side such as `15.2` never matches.
    pub fn matches(&self, installed: &VersionTriplet) -> bool {
        self.source_text == installed.to_string()
    }
}

impl CompatibilityPolicy {
    pub fn new(
        min_version: Option<&str>,
        max_version: Option<&str>,
        mappings: &[&str],
    ) -> Self {
        Self {
            min_version: min_version.map(str::to_string),
            max_version: max_version.map(str::to_string),
            mappings: mappings.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Parse a policy document from JSON text.
    pub fn from_json_str(contents: &str) -> Result<Self, PolicyError> {
        let value: Value = serde_json::from_str(contents)?;
        let object = value.as_object().ok_or(PolicyError::NotAnObject)?;

        let string_field = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let mappings = object
            .get(MAPPINGS_KEY)
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            min_version: string_field(MIN_VERSION_KEY),
            max_version: string_field(MAX_VERSION_KEY),
            mappings,
        })
    }

    /// Load a policy document from disk.
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let contents = fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Mapping tokens that parse; malformed ones are dropped.
    pub fn parsed_mappings(&self) -> Vec<MappingToken> {
        self.mappings
            .iter()
            .filter_map(|t| MappingToken::parse(t))
            .collect()
    }

    /// Human-readable form of the declared range, e.g. `[14.0.0, 16.0.0]`.
    pub fn describe_range(&self) -> String {
        format!(
            "[{}, {}]",
            self.min_version.as_deref().unwrap_or("unbounded"),
            self.max_version.as_deref().unwrap_or("unbounded")
        )
    }
}
