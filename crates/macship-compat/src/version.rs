//! Dotted version normalization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Components at or above this value break the ordering of [`VersionTriplet::to_ordered_int`].
pub const COMPONENT_LIMIT: u32 = 1000;

/// A version reduced to exactly MAJOR.MINOR.PATCH.
///
/// Field order matters: the derived `Ord` compares major, then minor, then patch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionTriplet {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Version parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("empty version string")]
    Empty,

    #[error("invalid component '{component}' in version '{version}'")]
    InvalidComponent { version: String, component: String },

    #[error("component '{component}' in version '{version}' is not below {}", COMPONENT_LIMIT)]
    ComponentTooLarge { version: String, component: String },
}

impl VersionTriplet {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Encode as `major * 1_000_000 + minor * 1_000 + patch`.
    ///
    /// Integer order matches version order while every component stays below
    /// [`COMPONENT_LIMIT`].
    pub fn to_ordered_int(&self) -> u64 {
        u64::from(self.major) * 1_000_000 + u64::from(self.minor) * 1_000 + u64::from(self.patch)
    }
}

impl fmt::Display for VersionTriplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for VersionTriplet {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

/// Split a dotted version into three integer components.
///
/// Missing trailing components default to 0 ("15" -> 15.0.0, "15.2" -> 15.2.0).
/// Components past the third are ignored. Components at or above
/// [`COMPONENT_LIMIT`] are rejected.
pub fn normalize(version: &str) -> Result<VersionTriplet, VersionError> {
    let trimmed = version.trim();
    if trimmed.is_empty() {
        return Err(VersionError::Empty);
    }

    let mut parts = [0u32; 3];
    for (slot, component) in parts.iter_mut().zip(trimmed.split('.')) {
        *slot = component
            .parse::<u32>()
            .map_err(|_| VersionError::InvalidComponent {
                version: trimmed.to_string(),
                component: component.to_string(),
            })?;
        if *slot >= COMPONENT_LIMIT {
            return Err(VersionError::ComponentTooLarge {
                version: trimmed.to_string(),
                component: component.to_string(),
            });
        }
    }

    Ok(VersionTriplet::new(parts[0], parts[1], parts[2]))
}

/// Normalize and encode in one step.
pub fn to_ordered_int(version: &str) -> Result<u64, VersionError> {
    normalize(version).map(|v| v.to_ordered_int())
}
