//! Framework configuration
//!
//! Loaded from TOML. Every section and field is optional:
//!
//! ```toml
//! [logging]
//! filter = "info,alg_core=debug"
//! json = false
//!
//! [parallel]
//! enabled = true
//! threads = 4
//!
//! [algorithms]
//! default_version_policy = "latest"
//!
//! [data_service]
//! replace_existing = true
//! ```

use crate::error::FrameworkError;
use alg_registry::VersionRequest;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameworkConfig {
    /// Log output
    pub logging: LoggingConfig,
    /// Worker pool
    pub parallel: ParallelConfig,
    /// Algorithm lookup
    pub algorithms: AlgorithmsConfig,
    /// Analysis data service
    pub data_service: DataServiceConfig,
}

impl FrameworkConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// `FrameworkError::Config` for malformed TOML or unknown fields
    pub fn from_toml_str(text: &str) -> Result<Self, FrameworkError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// `FrameworkError::Io` if unreadable, otherwise as [`from_toml_str`](Self::from_toml_str)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FrameworkError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| FrameworkError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    /// `FrameworkError::InvalidConfig`
    pub fn validate(&self) -> Result<(), FrameworkError> {
        if self.parallel.threads == Some(0) {
            return Err(FrameworkError::InvalidConfig(
                "parallel.threads must be at least 1".to_string(),
            ));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(FrameworkError::InvalidConfig(
                "logging.filter must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// With parallel loops switched on or off
    #[inline]
    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel.enabled = enabled;
        self
    }

    /// With a fixed worker count
    #[inline]
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.parallel.threads = Some(threads);
        self
    }

    /// With a version policy
    #[inline]
    #[must_use]
    pub fn with_version_policy(mut self, policy: VersionPolicy) -> Self {
        self.algorithms.default_version_policy = policy;
        self
    }

    /// With the data-service replace rule
    #[inline]
    #[must_use]
    pub fn with_replace_existing(mut self, replace: bool) -> Self {
        self.data_service.replace_existing = replace;
        self
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    pub filter: String,
    /// Emit JSON lines instead of text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// `[parallel]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParallelConfig {
    /// Run spectrum loops on the worker pool
    pub enabled: bool,
    /// Worker count; unset means one per core
    pub threads: Option<usize>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threads: None,
        }
    }
}

/// `[algorithms]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlgorithmsConfig {
    /// Version picked when a caller names no version
    pub default_version_policy: VersionPolicy,
}

/// Which version an unversioned request resolves to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionPolicy {
    /// Highest registered version
    #[default]
    Latest,
    /// Lowest registered version
    Oldest,
}

impl VersionPolicy {
    /// Turn an optional explicit version into a lookup request
    ///
    /// `versions` is the sorted list of registered versions of the name.
    #[must_use]
    pub fn request(self, explicit: Option<u32>, versions: &[u32]) -> VersionRequest {
        match (explicit, self) {
            (Some(v), _) => VersionRequest::Exact(v),
            (None, Self::Latest) => VersionRequest::Latest,
            (None, Self::Oldest) => versions
                .first()
                .map_or(VersionRequest::Latest, |v| VersionRequest::Exact(*v)),
        }
    }
}

/// `[data_service]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataServiceConfig {
    /// Outputs overwrite an existing workspace of the same name
    pub replace_existing: bool,
}

impl Default for DataServiceConfig {
    fn default() -> Self {
        Self {
            replace_existing: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_text_gives_defaults() {
        assert_eq!(FrameworkConfig::from_toml_str("").unwrap(), FrameworkConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = FrameworkConfig::from_toml_str(
            r#"
            [parallel]
            threads = 2

            [algorithms]
            default_version_policy = "oldest"
            "#,
        )
        .unwrap();
        assert!(config.parallel.enabled);
        assert_eq!(config.parallel.threads, Some(2));
        assert_eq!(config.algorithms.default_version_policy, VersionPolicy::Oldest);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(matches!(
            FrameworkConfig::from_toml_str("[parallel]\nworkers = 3\n"),
            Err(FrameworkError::Config(_))
        ));
    }

    #[test]
    fn zero_threads_rejected() {
        assert!(matches!(
            FrameworkConfig::from_toml_str("[parallel]\nthreads = 0\n"),
            Err(FrameworkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[data_service]\nreplace_existing = false").unwrap();
        let config = FrameworkConfig::from_file(file.path()).unwrap();
        assert!(!config.data_service.replace_existing);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            FrameworkConfig::from_file("/nonexistent/alg.toml"),
            Err(FrameworkError::Io { .. })
        ));
    }

    #[test]
    fn version_policy_requests() {
        assert_eq!(
            VersionPolicy::Latest.request(None, &[1, 2]),
            VersionRequest::Latest
        );
        assert_eq!(
            VersionPolicy::Oldest.request(None, &[1, 2]),
            VersionRequest::Exact(1)
        );
        assert_eq!(
            VersionPolicy::Oldest.request(Some(2), &[1, 2]),
            VersionRequest::Exact(2)
        );
    }
}
