//! macship - parameter resolution and preflight for Unreal Engine macOS builds
//!
//! Resolves every parameter a build/sign/notarize run needs before any of it
//! executes: layered configuration (defaults, config/env files, CLI) with
//! provenance, filesystem discovery of the project, engine, Xcode workspace,
//! scheme, export options and Steamworks library, safe disambiguation of
//! multiple candidates, and toolchain compatibility against the engine's
//! declared Xcode policy. The finished configuration drives a planned
//! build/sign/notarize run whose output bundle is verified at the end.

pub mod bundle;
pub mod config;
pub mod disambiguate;
pub mod discovery;
pub mod entitlements;
pub mod error;
pub mod logging;
pub mod paths;
pub mod pipeline;
pub mod prompt;
pub mod resolve;
pub mod toolchain;
pub mod tools;
pub mod validate;

pub use config::{BuildConfiguration, ConfigError, ConfigStore, EffectiveConfig, Field, Tier};
pub use error::{Error, ExitCode};
pub use prompt::{NonInteractive, Prompter, ScriptedPrompter, TerminalPrompter};
pub use resolve::{Resolution, ResolveOptions, Resolver};
pub use tools::{CommandSpec, SystemRunner, ToolError, ToolOutput, ToolRunner};
