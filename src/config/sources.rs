//! File-tier sources
//!
//! Three sources feed the file tier, applied in this order (later wins):
//! 1. `macship.toml` (or `--config`)
//! 2. The process environment
//! 3. The dotenv file `.env` (or `--env-file`)
//!
//! The dotenv file uses shell `KEY=VALUE` syntax but is only parsed, never
//! executed. Treat it as untrusted input: it can redirect signing identities
//! and paths.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use super::field::Field;
use super::store::ConfigError;

/// Origin of a configuration source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfigOrigin {
    Builtin,
    ConfigFile,
    Environment,
    EnvFile,
    Cli,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    /// Origin of this source
    pub origin: ConfigOrigin,

    /// File path (None for builtin/environment/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/environment/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,

    /// Number of recognised fields this source supplied
    pub fields: usize,
}

impl ConfigSource {
    pub fn new(origin: ConfigOrigin, fields: usize) -> Self {
        Self {
            origin,
            path: None,
            digest: None,
            fields,
        }
    }
}

/// Values read from one source, in file order
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub values: Vec<(Field, String)>,
    pub source: ConfigSource,
}

fn read_with_digest(path: &Path) -> Result<(Vec<u8>, String), ConfigError> {
    let bytes = fs::read(path)
        .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    Ok((bytes, digest))
}

/// Load `macship.toml`. Keys are field names in lowercase (`team_id = "..."`);
/// booleans and integers are accepted for toggle and numeric fields.
pub fn load_toml_file(path: &Path) -> Result<LoadedSource, ConfigError> {
    let (bytes, digest) = read_with_digest(path)?;

    let contents = String::from_utf8(bytes)
        .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

    let table: toml::Table = toml::from_str(&contents)
        .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

    let mut values = Vec::new();
    for (key, value) in table {
        let Some(field) = Field::from_key(&key) else {
            warn!(key = %key, path = %path.display(), "ignoring unknown config key");
            continue;
        };
        let text = match value {
            toml::Value::String(s) => s,
            toml::Value::Boolean(b) if field.is_toggle() => if b { "1" } else { "0" }.to_string(),
            toml::Value::Integer(i) => i.to_string(),
            other => {
                return Err(ConfigError::ParseError(format!(
                    "{}: expected a string, integer or (for toggles) boolean, got {}",
                    key,
                    other.type_str()
                )))
            }
        };
        values.push((field, text));
    }

    let source = ConfigSource {
        origin: ConfigOrigin::ConfigFile,
        path: Some(path.to_string_lossy().to_string()),
        digest: Some(digest),
        fields: values.len(),
    };
    Ok(LoadedSource { values, source })
}

/// Load a dotenv file without touching the process environment.
pub fn load_env_file(path: &Path) -> Result<LoadedSource, ConfigError> {
    let (bytes, digest) = read_with_digest(path)?;

    let mut values = Vec::new();
    for item in dotenvy::from_read_iter(bytes.as_slice()) {
        let (key, value) = item
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        match Field::from_env_name(&key) {
            Some(field) => values.push((field, value)),
            None => debug!(key = %key, "ignoring unrelated env-file variable"),
        }
    }

    let source = ConfigSource {
        origin: ConfigOrigin::EnvFile,
        path: Some(path.to_string_lossy().to_string()),
        digest: Some(digest),
        fields: values.len(),
    };
    Ok(LoadedSource { values, source })
}

/// Pick recognised variables out of an environment snapshot.
pub fn environment_values<I>(vars: I) -> LoadedSource
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut values: Vec<(Field, String)> = vars
        .into_iter()
        .filter_map(|(k, v)| Field::from_env_name(&k).map(|f| (f, v)))
        .collect();
    values.sort_by_key(|(f, _)| *f);

    let source = ConfigSource::new(ConfigOrigin::Environment, values.len());
    LoadedSource { values, source }
}
