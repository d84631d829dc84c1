//! Resolution: layered configuration, then discovery, then the toolchain
//! check
//!
//! The store is filled tier by tier (defaults, file tier, CLI). Discovery
//! then fills only what is still unset, and the Xcode compatibility check
//! runs last. The result is a [`Resolution`] that can be printed as is or
//! finalized into a [`BuildConfiguration`].

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use macship_compat::{CompatibilityReport, IndeterminatePolicy};

use crate::config::{
    environment_values, load_env_file, load_toml_file, BuildConfiguration, BuiltinDefaults,
    ConfigError, ConfigOrigin, ConfigSource, ConfigStore, EffectiveConfig, Field, LoadedSource,
    Tier,
};
use crate::discovery::engine::{discover_engine, DEFAULT_ENGINES_DIR};
use crate::discovery::export_options::discover_export_options;
use crate::discovery::project::{derive_names, discover_uproject, module_name};
use crate::discovery::scheme::discover_scheme;
use crate::discovery::steam::discover_steam_library;
use crate::discovery::workspace::{discover_workspace, Generator};
use crate::discovery::Session;
use crate::error::Error;
use crate::paths;
use crate::prompt::Prompter;
use crate::toolchain;
use crate::tools::ToolRunner;
use crate::validate::validate;

/// Config file looked up in the root when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "macship.toml";

/// Env file looked up in the root when `--env-file` is not given
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Inputs to a resolution run
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Base for relative paths and the default root
    pub cwd: PathBuf,

    /// Explicit config file; must exist when given
    pub config_file: Option<PathBuf>,

    /// Explicit env file; must exist when given
    pub env_file: Option<PathBuf>,

    /// Process environment snapshot
    pub environment: Vec<(String, String)>,

    /// Values given on the command line
    pub cli: Vec<(Field, String)>,

    /// Where engine installations are searched
    pub engines_dir: PathBuf,
}

impl ResolveOptions {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            config_file: None,
            env_file: None,
            environment: Vec::new(),
            cli: Vec::new(),
            engines_dir: PathBuf::from(DEFAULT_ENGINES_DIR),
        }
    }

    /// Directory holding the default config and env files
    fn file_base(&self) -> PathBuf {
        self.cli
            .iter()
            .rev()
            .find(|(f, v)| *f == Field::RootDir && !v.is_empty())
            .and_then(|(_, v)| paths::resolve_relative(&self.cwd, Path::new(v)))
            .unwrap_or_else(|| self.cwd.clone())
    }
}

/// Outcome of resolution, before validation
#[derive(Debug, Clone)]
pub struct Resolution {
    pub store: ConfigStore,
    pub sources: Vec<ConfigSource>,
    pub module_name: Option<String>,

    /// `None` when the engine ships no usable policy
    pub compatibility: Option<CompatibilityReport>,
}

impl Resolution {
    pub fn effective(&self) -> EffectiveConfig {
        EffectiveConfig::new(&self.store, &self.sources, self.module_name.as_deref())
    }

    /// Validate into the immutable configuration handed to the pipeline.
    pub fn finalize(&self) -> Result<BuildConfiguration, ConfigError> {
        validate(&self.store, self.module_name.as_deref())
    }

    /// Toggle value; unset or invalid reads as `false`
    pub fn flag(&self, field: Field) -> bool {
        self.store.toggle_or_false(field)
    }
}

/// Drives one resolution run
pub struct Resolver<'a> {
    prompter: &'a mut dyn Prompter,
    runner: &'a dyn ToolRunner,
}

fn apply(store: &mut ConfigStore, sources: &mut Vec<ConfigSource>, loaded: LoadedSource, tier: Tier) {
    for (field, value) in loaded.values {
        store.set(field, value, tier);
    }
    sources.push(loaded.source);
}

/// Make a configured path absolute against `base`.
fn absolutize(store: &mut ConfigStore, field: Field, base: &Path) {
    let Some(raw) = store.optional(field) else {
        return;
    };
    if let Some(path) = paths::resolve_relative(base, Path::new(raw)) {
        let normalized = paths::resolve_existing(&path).unwrap_or(path);
        store.rewrite(field, normalized.to_string_lossy());
    }
}

impl<'a> Resolver<'a> {
    pub fn new(prompter: &'a mut dyn Prompter, runner: &'a dyn ToolRunner) -> Self {
        Self { prompter, runner }
    }

    pub fn resolve(&mut self, options: &ResolveOptions) -> Result<Resolution, Error> {
        let (mut store, sources) = Self::layer(options)?;
        let root = Self::root_dir(&mut store, options)?;
        let module_name = self.discover(&mut store, &root, options)?;

        let compatibility = match store.optional(Field::UeRoot).map(PathBuf::from) {
            Some(ue_root) if ue_root.is_dir() => {
                let indeterminate = if store.toggle(Field::StrictToolchain)? {
                    IndeterminatePolicy::Deny
                } else {
                    IndeterminatePolicy::Allow
                };
                toolchain::evaluate(&ue_root, self.runner, indeterminate)?
            }
            _ => None,
        };

        Ok(Resolution {
            store,
            sources,
            module_name,
            compatibility,
        })
    }

    /// Defaults, then the file tier, then the CLI.
    fn layer(options: &ResolveOptions) -> Result<(ConfigStore, Vec<ConfigSource>), Error> {
        let mut store = ConfigStore::new();
        let mut sources = Vec::new();

        let defaults = BuiltinDefaults::new(&options.cwd);
        defaults.apply(&mut store);
        sources.push(ConfigSource::new(ConfigOrigin::Builtin, defaults.entries().len()));

        let base = options.file_base();

        let config_file = match options.config_file {
            Some(ref path) => Some(path.clone()),
            None => Some(base.join(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
        };
        if let Some(path) = config_file {
            info!(path = %path.display(), "loading config file");
            apply(&mut store, &mut sources, load_toml_file(&path)?, Tier::File);
        }

        apply(
            &mut store,
            &mut sources,
            environment_values(options.environment.iter().cloned()),
            Tier::File,
        );

        let env_file = match options.env_file {
            Some(ref path) => Some(path.clone()),
            None => Some(base.join(DEFAULT_ENV_FILE)).filter(|p| p.is_file()),
        };
        if let Some(path) = env_file {
            info!(path = %path.display(), "loading env file (parsed, not executed)");
            apply(&mut store, &mut sources, load_env_file(&path)?, Tier::File);
        }

        let mut cli_fields = 0;
        for (field, value) in &options.cli {
            if store.set(*field, value.clone(), Tier::Cli) {
                cli_fields += 1;
            }
        }
        sources.push(ConfigSource::new(ConfigOrigin::Cli, cli_fields));

        Ok((store, sources))
    }

    fn root_dir(store: &mut ConfigStore, options: &ResolveOptions) -> Result<PathBuf, Error> {
        let raw = store.require(Field::RootDir)?.to_string();
        let root = paths::resolve_relative(&options.cwd, Path::new(&raw))
            .and_then(|p| paths::resolve_existing(&p))
            .filter(|p| p.is_dir())
            .ok_or_else(|| ConfigError::invalid(Field::RootDir, raw.as_str(), "directory does not exist"))?;
        store.rewrite(Field::RootDir, root.to_string_lossy());
        debug!(root = %root.display(), "project root");
        Ok(root)
    }

    /// Fill every unset field discovery can find. Returns the module name.
    fn discover(
        &mut self,
        store: &mut ConfigStore,
        root: &Path,
        options: &ResolveOptions,
    ) -> Result<Option<String>, Error> {
        let mut session = Session::new(&mut *self.prompter, self.runner);

        for field in Field::ALL.iter().copied().filter(|f| f.is_path() && *f != Field::RootDir) {
            absolutize(store, field, root);
        }

        if !store.is_set(Field::Uproject) {
            let found = discover_uproject(root)?;
            store.fill(Field::Uproject, found.to_string_lossy());
        }
        let uproject = PathBuf::from(store.get(Field::Uproject));

        let names = derive_names(&uproject);
        store.fill(Field::ShortName, names.short.clone());
        store.fill(Field::LongName, names.long.clone());
        let module = module_name(&uproject);

        if !store.is_set(Field::UeRoot) {
            if let Some(engine) = discover_engine(&mut session, &options.engines_dir)? {
                store.fill(Field::UeRoot, engine.to_string_lossy());
            }
        }

        if store.toggle(Field::UseXcodeExport)? {
            if !store.is_set(Field::Workspace) {
                let ue_root = store.optional(Field::UeRoot).map(PathBuf::from);
                let generator = ue_root.as_deref().map(|ue_root| Generator {
                    ue_root,
                    uproject: &uproject,
                });
                let workspace = discover_workspace(&mut session, root, &names.long, generator)?;
                store.fill(Field::Workspace, workspace.to_string_lossy());
            }

            if !store.is_set(Field::Scheme) {
                let workspace = PathBuf::from(store.get(Field::Workspace));
                let preferred = [
                    store.get(Field::LongName),
                    module.as_deref().unwrap_or(""),
                    names.long.as_str(),
                    store.get(Field::ShortName),
                ];
                let scheme = discover_scheme(&mut session, &workspace, &preferred)?;
                store.fill(Field::Scheme, scheme);
            }

            if !store.is_set(Field::ExportPlist) {
                let team_id = store.optional(Field::TeamId).map(str::to_string);
                let plist = discover_export_options(&mut session, root, team_id.as_deref())?;
                store.fill(Field::ExportPlist, plist.to_string_lossy());
            }
        }

        if store.toggle(Field::EnableSteam)? {
            if !store.is_set(Field::SteamDylibSrc) {
                if let Some(ue_root) = store.optional(Field::UeRoot).map(PathBuf::from) {
                    if let Some(lib) = discover_steam_library(&ue_root) {
                        store.fill(Field::SteamDylibSrc, lib.to_string_lossy());
                    }
                }
            }
        }

        Ok(module)
    }
}
