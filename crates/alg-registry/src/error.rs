//! Registry error types

use crate::key::FactoryKey;

/// Errors raised by factory registration and lookup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No creator registered under this name at any version
    #[error("{kind} '{name}' is not registered")]
    NotFound {
        /// Factory kind ("algorithm", "workspace", ...)
        kind: &'static str,
        /// Requested name
        name: String,
    },

    /// The name is registered, but not at the requested version
    #[error("{kind} '{name}' has no version {requested} (available: {available:?})")]
    VersionNotFound {
        /// Factory kind
        kind: &'static str,
        /// Requested name
        name: String,
        /// Requested version
        requested: u32,
        /// Versions that are registered for this name
        available: Vec<u32>,
    },

    /// The exact key is already taken
    #[error("{kind} '{key}' is already registered")]
    AlreadyRegistered {
        /// Factory kind
        kind: &'static str,
        /// Conflicting key
        key: FactoryKey,
    },

    /// Version outside the accepted range
    #[error("invalid version {0}: expected -1 (latest) or a value >= 1")]
    InvalidVersion(i64),

    /// Blank registration name
    #[error("invalid registration name: '{0}'")]
    InvalidName(String),
}

impl RegistryError {
    /// True for both "unknown name" and "unknown version of a known name"
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::VersionNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = RegistryError::NotFound {
            kind: "algorithm",
            name: "Unknown".to_string(),
        };
        assert_eq!(err.to_string(), "algorithm 'Unknown' is not registered");
        assert!(err.is_not_found());
    }

    #[test]
    fn version_not_found_lists_available() {
        let err = RegistryError::VersionNotFound {
            kind: "algorithm",
            name: "Integrate".to_string(),
            requested: 3,
            available: vec![1, 2],
        };
        assert!(err.to_string().contains("[1, 2]"));
        assert!(err.is_not_found());
    }

    #[test]
    fn invalid_version_is_not_a_lookup_miss() {
        assert!(!RegistryError::InvalidVersion(0).is_not_found());
    }
}
