//! Configuration store and sources
//!
//! Precedence, lowest first:
//! 1. Built-in defaults
//! 2. Values filled by discovery (only into unset fields)
//! 3. File tier: `macship.toml`, process environment, `.env`
//! 4. CLI flags

mod build;
mod defaults;
mod effective;
mod field;
mod sources;
mod store;

pub use build::{BuildConfiguration, BuildType, Notarization, Signing, SteamIntegration, XcodeTarget};
pub use defaults::BuiltinDefaults;
pub use effective::{EffectiveConfig, EffectiveField};
pub use field::Field;
pub use sources::{
    environment_values, load_env_file, load_toml_file, ConfigOrigin, ConfigSource, LoadedSource,
};
pub use store::{is_placeholder, parse_toggle, ConfigError, ConfigStore, ConfigValue, Tier};
