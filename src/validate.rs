//! Completeness and value checks that turn the store into a
//! [`BuildConfiguration`]
//!
//! Runs only after discovery has had its chance to fill gaps. Which fields
//! are required depends on the active mode: Xcode export needs the workspace,
//! scheme, configuration and export options; notarization needs a profile;
//! Steam needs the library.

use std::path::{Path, PathBuf};

use crate::config::{
    BuildConfiguration, BuildType, ConfigError, ConfigStore, Field, Notarization, Signing,
    SteamIntegration, XcodeTarget,
};
use crate::paths;

/// Fields required by the active mode, in catalogue order
pub fn required_fields(store: &ConfigStore) -> Result<Vec<Field>, ConfigError> {
    let mut required = vec![
        Field::RootDir,
        Field::Uproject,
        Field::ShortName,
        Field::LongName,
        Field::UeRoot,
        Field::TeamId,
        Field::SignIdentity,
    ];
    if store.toggle(Field::UseXcodeExport)? {
        required.extend([
            Field::Workspace,
            Field::Scheme,
            Field::XcodeConfig,
            Field::ExportPlist,
        ]);
    }
    if store.toggle(Field::Notarize)? {
        required.push(Field::NotaryProfile);
    }
    if store.toggle(Field::EnableSteam)? {
        required.push(Field::SteamDylibSrc);
    }
    required.sort();
    Ok(required)
}

/// Fields the active mode requires that are still unset
pub fn missing_fields(store: &ConfigStore) -> Result<Vec<Field>, ConfigError> {
    Ok(required_fields(store)?
        .into_iter()
        .filter(|&f| !store.is_set(f))
        .collect())
}

fn existing_path(store: &ConfigStore, field: Field) -> Result<PathBuf, ConfigError> {
    let raw = store.require(field)?;
    paths::resolve_existing(Path::new(raw))
        .ok_or_else(|| ConfigError::invalid(field, raw, "path does not exist"))
}

fn existing_dir(store: &ConfigStore, field: Field) -> Result<PathBuf, ConfigError> {
    let path = existing_path(store, field)?;
    if path.is_dir() {
        Ok(path)
    } else {
        Err(ConfigError::invalid(field, store.get(field), "not a directory"))
    }
}

fn existing_file(store: &ConfigStore, field: Field) -> Result<PathBuf, ConfigError> {
    let path = existing_path(store, field)?;
    if path.is_file() {
        Ok(path)
    } else {
        Err(ConfigError::invalid(field, store.get(field), "not a file"))
    }
}

/// Validate `store` and build the final configuration.
///
/// Every missing field is reported at once; value problems are reported
/// one at a time.
pub fn validate(
    store: &ConfigStore,
    module_name: Option<&str>,
) -> Result<BuildConfiguration, ConfigError> {
    let mut missing = missing_fields(store)?;
    match missing.len() {
        0 => {}
        1 => {
            let field = missing.remove(0);
            return Err(ConfigError::Missing {
                field,
                hint: field.hint(),
            });
        }
        _ => return Err(ConfigError::Incomplete(missing)),
    }

    let short_name = store.require(Field::ShortName)?.to_string();
    if short_name.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid(
            Field::ShortName,
            short_name,
            "must not contain whitespace",
        ));
    }

    let raw_build_type = store.get(Field::BuildType);
    let build_type = if raw_build_type.is_empty() {
        BuildType::Shipping
    } else {
        raw_build_type
            .parse::<BuildType>()
            .map_err(|reason| ConfigError::invalid(Field::BuildType, raw_build_type, reason))?
    };

    let xcode = if store.toggle(Field::UseXcodeExport)? {
        Some(XcodeTarget {
            workspace: existing_dir(store, Field::Workspace)?,
            scheme: store.require(Field::Scheme)?.to_string(),
            configuration: store.require(Field::XcodeConfig)?.to_string(),
            export_plist: existing_file(store, Field::ExportPlist)?,
        })
    } else {
        None
    };

    let notarize = store.toggle(Field::Notarize)?;
    let notarization = Notarization {
        enabled: notarize,
        profile: store.optional(Field::NotaryProfile).map(str::to_string),
    };

    let steam = if store.toggle(Field::EnableSteam)? {
        let app_id = store
            .optional(Field::SteamAppId)
            .map(|raw| {
                raw.trim()
                    .parse::<u32>()
                    .map_err(|_| ConfigError::invalid(Field::SteamAppId, raw, "expected a number"))
            })
            .transpose()?;
        let write_app_id = store.toggle(Field::WriteSteamAppId)?;
        if write_app_id && app_id.is_none() {
            return Err(ConfigError::Missing {
                field: Field::SteamAppId,
                hint: Field::SteamAppId.hint(),
            });
        }
        Some(SteamIntegration {
            app_id,
            dylib_src: existing_file(store, Field::SteamDylibSrc)?,
            write_app_id,
        })
    } else {
        None
    };

    let ue_root = existing_dir(store, Field::UeRoot)?;

    Ok(BuildConfiguration {
        root_dir: existing_dir(store, Field::RootDir)?,
        uproject: existing_file(store, Field::Uproject)?,
        short_name,
        long_name: store.require(Field::LongName)?.to_string(),
        module_name: module_name.filter(|m| !m.is_empty()).map(str::to_string),
        ue_root,
        build_type,
        xcode,
        signing: Signing {
            team_id: store.require(Field::TeamId)?.to_string(),
            identity: store.require(Field::SignIdentity)?.to_string(),
        },
        notarization,
        steam,
        clean_build: store.toggle(Field::CleanBuild)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuiltinDefaults, Tier};
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        temp: TempDir,
        store: ConfigStore,
    }

    /// A store with every always-required field set and export/notarize off
    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("My Game.uproject"), "{}").unwrap();
        fs::create_dir(root.join("UE_5.4")).unwrap();

        let mut store = ConfigStore::new();
        BuiltinDefaults::new(root).apply(&mut store);
        store.set(Field::Uproject, root.join("My Game.uproject").to_string_lossy(), Tier::File);
        store.set(Field::ShortName, "MyGame", Tier::Autodetected);
        store.set(Field::LongName, "My Game", Tier::Autodetected);
        store.set(Field::UeRoot, root.join("UE_5.4").to_string_lossy(), Tier::File);
        store.set(Field::TeamId, "ABCDE12345", Tier::File);
        store.set(Field::SignIdentity, "Developer ID Application: Me (ABCDE12345)", Tier::File);
        store.set(Field::UseXcodeExport, "0", Tier::Cli);
        store.set(Field::Notarize, "no", Tier::Cli);
        Fixture { temp, store }
    }

    #[test]
    fn test_minimal_configuration() {
        let f = fixture();
        let config = validate(&f.store, Some("MyGame")).unwrap();

        assert_eq!(config.long_name, "My Game");
        assert_eq!(config.build_type, BuildType::Shipping);
        assert_eq!(config.module_name.as_deref(), Some("MyGame"));
        assert!(config.xcode.is_none());
        assert!(config.steam.is_none());
        assert!(!config.notarization.enabled);
        assert_eq!(config.root_dir, dunce::canonicalize(f.temp.path()).unwrap());
    }

    #[test]
    fn test_missing_signing_names_field() {
        let mut f = fixture();
        f.store = {
            let mut s = ConfigStore::new();
            for v in f.store.iter().filter(|v| v.field != Field::SignIdentity) {
                s.set(v.field, v.value.clone(), v.tier);
            }
            s
        };
        let err = validate(&f.store, None).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { field: Field::SignIdentity, .. }));
    }

    #[test]
    fn test_export_mode_requires_xcode_fields() {
        let mut f = fixture();
        f.store.set(Field::UseXcodeExport, "1", Tier::Cli);

        let missing = missing_fields(&f.store).unwrap();
        assert_eq!(missing, vec![Field::Workspace, Field::Scheme, Field::ExportPlist]);

        let err = validate(&f.store, None).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("--workspace"));
        assert!(message.contains("XCODE_SCHEME"));
        assert!(message.contains("EXPORT_PLIST"));
    }

    #[test]
    fn test_notarize_requires_profile() {
        let mut f = fixture();
        f.store.set(Field::Notarize, "yes", Tier::Cli);
        assert!(matches!(
            validate(&f.store, None),
            Err(ConfigError::Missing { field: Field::NotaryProfile, .. })
        ));
    }

    #[test]
    fn test_steam_requires_library_only_when_enabled() {
        let mut f = fixture();
        f.store.set(Field::SteamAppId, "480", Tier::File);
        assert!(validate(&f.store, None).is_ok());

        f.store.set(Field::EnableSteam, "1", Tier::Cli);
        assert!(matches!(
            validate(&f.store, None),
            Err(ConfigError::Missing { field: Field::SteamDylibSrc, .. })
        ));

        let dylib = f.temp.path().join("libsteam_api.dylib");
        fs::write(&dylib, b"").unwrap();
        f.store.set(Field::SteamDylibSrc, dylib.to_string_lossy(), Tier::File);
        let steam = validate(&f.store, None).unwrap().steam.unwrap();
        assert_eq!(steam.app_id, Some(480));
        assert!(!steam.write_app_id);
    }

    #[test]
    fn test_invalid_values() {
        let mut f = fixture();
        f.store.set(Field::BuildType, "Debug", Tier::Cli);
        assert!(matches!(
            validate(&f.store, None),
            Err(ConfigError::Invalid { field: Field::BuildType, .. })
        ));

        let mut f = fixture();
        f.store.set(Field::UeRoot, "/nonexistent/UE_5.4", Tier::Cli);
        let err = validate(&f.store, None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: Field::UeRoot, .. }));
        assert!(err.to_string().contains("--ue-root"));

        let mut f = fixture();
        f.store.set(Field::ShortName, "My Game", Tier::Cli);
        assert!(matches!(
            validate(&f.store, None),
            Err(ConfigError::Invalid { field: Field::ShortName, .. })
        ));
    }

    #[test]
    fn test_bad_toggle_is_invalid() {
        let mut f = fixture();
        f.store.set(Field::Notarize, "perhaps", Tier::Cli);
        assert!(matches!(
            validate(&f.store, None),
            Err(ConfigError::Invalid { field: Field::Notarize, .. })
        ));
    }
}
