//! Effective configuration with full provenance
//!
//! Snapshot of every field's value and tier plus the sources that fed the
//! file tier. This is what `--print-config` shows, including when validation
//! rejects the configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use super::field::Field;
use super::sources::ConfigSource;
use super::store::{ConfigStore, ConfigValue};

/// Schema identifier
pub const SCHEMA_ID: &str = "macship/effective_config@1";

/// Effective configuration with full provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    /// Schema identifier
    pub schema_id: String,

    /// When this config was computed
    pub resolved_at: DateTime<Utc>,

    /// Every field, set or not, in catalogue order
    pub fields: Vec<EffectiveField>,

    /// First module of the project descriptor, when found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveField {
    pub field: Field,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ConfigValue>,
}

impl EffectiveConfig {
    pub fn new(store: &ConfigStore, sources: &[ConfigSource], module_name: Option<&str>) -> Self {
        let fields = Field::ALL
            .iter()
            .map(|&field| EffectiveField {
                field,
                name: field.env_name().to_string(),
                value: store.value(field).cloned(),
            })
            .collect();

        Self {
            schema_id: SCHEMA_ID.to_string(),
            resolved_at: Utc::now(),
            fields,
            module_name: module_name.map(str::to_string),
            sources: sources.to_vec(),
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Aligned `NAME = value  [tier]` listing
    pub fn to_human(&self) -> String {
        let width = self.fields.iter().map(|f| f.name.len()).max().unwrap_or(0);
        let mut out = String::new();

        let _ = writeln!(out, "Resolved configuration ({}):", self.resolved_at.format("%Y-%m-%dT%H:%M:%SZ"));
        for entry in &self.fields {
            match &entry.value {
                Some(v) => {
                    let _ = writeln!(out, "  {:width$} = {}  [{}]", entry.name, v.value, v.tier.as_str(), width = width);
                }
                None => {
                    let _ = writeln!(out, "  {:width$} = (unset)", entry.name, width = width);
                }
            }
        }
        if let Some(ref module) = self.module_name {
            let _ = writeln!(out, "  {:width$} = {}  [autodetected]", "MODULE_NAME", module, width = width);
        }

        if !self.sources.is_empty() {
            let _ = writeln!(out, "\nSources:");
            for source in &self.sources {
                let _ = write!(out, "  {:?}", source.origin);
                if let Some(ref path) = source.path {
                    let _ = write!(out, " {}", path);
                }
                if let Some(ref digest) = source.digest {
                    let _ = write!(out, " (sha256 {})", &digest[..digest.len().min(12)]);
                }
                let _ = writeln!(out, ", {} field(s)", source.fields);
            }
        }

        out
    }
}
