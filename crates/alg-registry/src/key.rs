//! Composite factory keys and version requests

use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies one registered creator: a type name plus a version ≥ 1
///
/// Ordering is by name, then version, so all versions of one name are
/// contiguous in an ordered map and the last one is the latest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactoryKey {
    name: String,
    version: u32,
}

impl FactoryKey {
    /// Create a key
    ///
    /// # Errors
    /// - `RegistryError::InvalidName` if `name` is blank
    /// - `RegistryError::InvalidVersion` if `version` is 0
    pub fn new(name: impl Into<String>, version: u32) -> Result<Self, RegistryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidName(name));
        }
        if version == 0 {
            return Err(RegistryError::InvalidVersion(0));
        }
        Ok(Self { name, version })
    }

    /// Type name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version number
    #[inline]
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Lowest possible key for `name`, used as a range bound
    pub(crate) fn lower_bound(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: 0,
        }
    }

    /// Highest possible key for `name`, used as a range bound
    pub(crate) fn upper_bound(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: u32::MAX,
        }
    }
}

impl fmt::Display for FactoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.name, self.version)
    }
}

/// Which version of a name to create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VersionRequest {
    /// Highest registered version
    #[default]
    Latest,

    /// Exactly this version
    Exact(u32),
}

impl VersionRequest {
    /// Raw form used on the command line and in JSON: `-1` means latest
    #[must_use]
    pub fn as_raw(self) -> i64 {
        match self {
            Self::Latest => -1,
            Self::Exact(v) => i64::from(v),
        }
    }
}

impl From<u32> for VersionRequest {
    fn from(version: u32) -> Self {
        Self::Exact(version)
    }
}

impl From<Option<u32>> for VersionRequest {
    fn from(version: Option<u32>) -> Self {
        version.map_or(Self::Latest, Self::Exact)
    }
}

impl TryFrom<i32> for VersionRequest {
    type Error = RegistryError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            -1 => Ok(Self::Latest),
            v if v >= 1 => Ok(Self::Exact(v.unsigned_abs())),
            v => Err(RegistryError::InvalidVersion(i64::from(v))),
        }
    }
}

impl FromStr for VersionRequest {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }
        let raw: i32 = s
            .parse()
            .map_err(|_| RegistryError::InvalidVersion(-2))?;
        Self::try_from(raw)
    }
}

impl fmt::Display for VersionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Exact(v) => write!(f, "v{v}"),
        }
    }
}
