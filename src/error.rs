//! Top-level error and stable exit codes

use serde::{Deserialize, Serialize};

use crate::bundle::BundleError;
use crate::config::ConfigError;
use crate::discovery::DiscoveryError;
use crate::toolchain::CompatibilityViolation;
use crate::tools::ToolError;

/// Stable exit codes for scripted callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ExitCode {
    /// Success, help, dry run or print-only
    Success = 0,
    /// Configuration, discovery, compatibility, validation, tool or usage failure
    Config = 1,
    /// Expected output artifact is missing
    MissingArtifact = 2,
    /// Two signed components carry different team identifiers
    SigningMismatch = 3,
    /// Required bundle metadata cannot be read
    UnreadableBundleMetadata = 4,
    /// Expected executable is missing from the bundle
    MissingExecutable = 5,
    /// Expected runtime linkage reference is missing
    MissingLinkage = 6,
}

impl ExitCode {
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(ExitCode::Success),
            1 => Some(ExitCode::Config),
            2 => Some(ExitCode::MissingArtifact),
            3 => Some(ExitCode::SigningMismatch),
            4 => Some(ExitCode::UnreadableBundleMetadata),
            5 => Some(ExitCode::MissingExecutable),
            6 => Some(ExitCode::MissingLinkage),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        *self == ExitCode::Success
    }
}

/// Any failure that ends a run
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Compatibility(#[from] CompatibilityViolation),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Usage(String),
}

impl Error {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Error::Bundle(e) => e.exit_code(),
            Error::Config(_)
            | Error::Discovery(_)
            | Error::Compatibility(_)
            | Error::Tool(_)
            | Error::Io { .. }
            | Error::Usage(_) => ExitCode::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Field;
    use std::path::PathBuf;

    #[test]
    fn test_exit_code_roundtrip() {
        for code in 0..=6 {
            assert_eq!(ExitCode::from_i32(code).map(|c| c.as_i32()), Some(code));
        }
        assert_eq!(ExitCode::from_i32(7), None);
        assert!(ExitCode::Success.is_success());
    }

    #[test]
    fn test_failure_classes_map_to_distinct_codes() {
        let config: Error = ConfigError::Missing {
            field: Field::TeamId,
            hint: Field::TeamId.hint(),
        }
        .into();
        assert_eq!(config.exit_code(), ExitCode::Config);

        let missing: Error = BundleError::MissingArtifact {
            path: PathBuf::from("/work/Build/Mac/Game.app"),
        }
        .into();
        assert_eq!(missing.exit_code(), ExitCode::MissingArtifact);

        let mismatch: Error = BundleError::SigningMismatch {
            app: Some("AAAA".into()),
            library: Some("BBBB".into()),
        }
        .into();
        assert_eq!(mismatch.exit_code(), ExitCode::SigningMismatch);
    }
}
