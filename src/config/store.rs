//! Field store with per-value provenance
//!
//! Each field remembers the tier that set it. A write from a lower tier never
//! replaces a value from a higher one; equal tiers replace (last wins).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::field::Field;

/// Source tier of a value, lowest precedence first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Default,
    /// Filled by discovery; only ever written into placeholder fields
    Autodetected,
    File,
    Cli,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Default => "default",
            Tier::Autodetected => "autodetected",
            Tier::File => "file",
            Tier::Cli => "cli",
        }
    }
}

/// A field's current value and where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigValue {
    pub field: Field,
    pub value: String,
    pub tier: Tier,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} is not set ({hint})")]
    Missing { field: Field, hint: String },

    #[error("required configuration is incomplete:\n{}", format_missing(.0))]
    Incomplete(Vec<Field>),

    #[error("{field} has invalid value '{value}': {reason} ({hint})")]
    Invalid {
        field: Field,
        value: String,
        reason: String,
        hint: String,
    },

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

fn format_missing(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| format!("  - {} ({})", f, f.hint()))
        .collect::<Vec<_>>()
        .join("\n")
}

impl ConfigError {
    pub fn invalid(field: Field, value: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            value: value.into(),
            reason: reason.into(),
            hint: field.hint(),
        }
    }
}

/// True iff the value is unset or empty. No sentinel text counts as unset.
pub fn is_placeholder(value: Option<&str>) -> bool {
    value.map_or(true, str::is_empty)
}

/// Parse a yes/no style toggle.
pub fn parse_toggle(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration values with provenance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigStore {
    values: BTreeMap<Field, ConfigValue>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` from `tier`.
    ///
    /// Returns whether the write took effect. Empty values count as "not
    /// provided" and never take effect; neither does a write from a tier
    /// lower than the one currently holding the field.
    pub fn set(&mut self, field: Field, value: impl Into<String>, tier: Tier) -> bool {
        let value = value.into();
        if value.is_empty() {
            return false;
        }
        if let Some(current) = self.values.get(&field) {
            if tier < current.tier {
                tracing::debug!(
                    %field,
                    tier = tier.as_str(),
                    held_by = current.tier.as_str(),
                    "ignoring lower-precedence value"
                );
                return false;
            }
        }
        self.values.insert(field, ConfigValue { field, value, tier });
        true
    }

    /// Fill a placeholder field with a discovered value.
    pub fn fill(&mut self, field: Field, value: impl Into<String>) -> bool {
        if self.is_set(field) {
            return false;
        }
        self.set(field, value, Tier::Autodetected)
    }

    /// Replace a value keeping its tier, e.g. after normalizing a path.
    pub fn rewrite(&mut self, field: Field, value: impl Into<String>) {
        if let Some(current) = self.values.get_mut(&field) {
            let value = value.into();
            if !value.is_empty() {
                current.value = value;
            }
        }
    }

    /// Current value, empty when unset
    pub fn get(&self, field: Field) -> &str {
        self.values.get(&field).map_or("", |v| v.value.as_str())
    }

    pub fn value(&self, field: Field) -> Option<&ConfigValue> {
        self.values.get(&field)
    }

    pub fn tier(&self, field: Field) -> Option<Tier> {
        self.values.get(&field).map(|v| v.tier)
    }

    pub fn is_set(&self, field: Field) -> bool {
        !is_placeholder(self.values.get(&field).map(|v| v.value.as_str()))
    }

    /// Value if configured
    pub fn optional(&self, field: Field) -> Option<&str> {
        Some(self.get(field)).filter(|v| !v.is_empty())
    }

    /// Value, or a `Missing` error carrying the field's remediation hint
    pub fn require(&self, field: Field) -> Result<&str, ConfigError> {
        self.optional(field).ok_or_else(|| ConfigError::Missing {
            field,
            hint: field.hint(),
        })
    }

    /// Toggle value; unset reads as `false`
    pub fn toggle(&self, field: Field) -> Result<bool, ConfigError> {
        match self.optional(field) {
            None => Ok(false),
            Some(raw) => parse_toggle(raw)
                .ok_or_else(|| ConfigError::invalid(field, raw, "expected yes/no, true/false or 1/0")),
        }
    }

    /// Toggle value for display paths where an invalid value reads as `false`
    pub fn toggle_or_false(&self, field: Field) -> bool {
        self.toggle(field).unwrap_or(false)
    }

    /// All set values in field order
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValue> {
        self.values.values()
    }
}
