//! Error types for ALG Core
//!
//! [`AlgorithmError`] covers everything that can stop a single algorithm
//! run. [`FrameworkError`] covers startup: configuration, logging,
//! registration and the worker pool. [`PipelineError`] wraps a failed
//! pipeline step.

use alg_property::PropertyError;
use alg_registry::RegistryError;
use alg_workspace::WorkspaceError;
use std::fmt;

/// Property name and message for one validation failure
pub type ValidationIssue = (String, String);

/// Aggregated validation failures, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFailures(pub Vec<ValidationIssue>);

impl ValidationFailures {
    /// Failures for one property
    pub fn for_property<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, m)| m.as_str())
    }

    /// Number of failures
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are none
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, message)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{name}: {message}")?;
        }
        Ok(())
    }
}

/// Errors raised while running an algorithm
#[derive(Debug, thiserror::Error)]
pub enum AlgorithmError {
    /// `initialize` has not been called
    #[error("algorithm '{0}' is not initialized")]
    NotInitialized(String),

    /// One or more properties failed validation
    #[error("invalid properties for '{algorithm}': {failures}")]
    Validation {
        /// Algorithm name
        algorithm: String,
        /// Per-property messages
        failures: ValidationFailures,
    },

    /// Property access failed
    #[error(transparent)]
    Property(#[from] PropertyError),

    /// Algorithm or workspace type lookup failed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Workspace operation failed
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// Malformed input that validators could not catch
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Numeric or logic failure during execution
    #[error("runtime error: {0}")]
    Runtime(String),

    /// Cooperative cancellation was requested
    #[error("algorithm '{0}' was cancelled")]
    Cancelled(String),

    /// A child algorithm failed
    #[error("child algorithm '{name}' failed: {source}")]
    Child {
        /// Child algorithm name
        name: String,
        /// Child error
        source: Box<AlgorithmError>,
    },
}

impl AlgorithmError {
    /// Runtime error with a message
    #[inline]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }

    /// Invalid argument with a message
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Whether this run stopped because of cancellation
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled(_) => true,
            Self::Child { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Validation failures, if this is a validation error
    #[must_use]
    pub fn validation_failures(&self) -> Option<&ValidationFailures> {
        match self {
            Self::Validation { failures, .. } => Some(failures),
            _ => None,
        }
    }
}

/// Errors raised while building or configuring the framework
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    /// Config file could not be read
    #[error("cannot read config '{path}': {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Config text is not valid TOML for the config schema
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Config values are inconsistent
    #[error("invalid configuration value: {0}")]
    InvalidConfig(String),

    /// Global subscriber could not be installed
    #[error("logging setup failed: {0}")]
    Logging(String),

    /// Worker pool could not be created
    #[error("thread pool setup failed: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Two registration modules share a name
    #[error("registration module '{0}' is already registered")]
    DuplicateModule(String),

    /// Registration failed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Workspace type registration failed
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

/// Errors raised while loading or running a pipeline file
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Pipeline file could not be read
    #[error("cannot read pipeline '{path}': {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Pipeline text is not valid TOML for the pipeline schema
    #[error("invalid pipeline: {0}")]
    Parse(#[from] toml::de::Error),

    /// A step failed; later steps did not run
    #[error("step {index} ({algorithm}) failed: {source}")]
    Step {
        /// One-based step number
        index: usize,
        /// Algorithm of the step
        algorithm: String,
        /// Step error
        source: AlgorithmError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_properties() {
        let err = AlgorithmError::Validation {
            algorithm: "Scale".into(),
            failures: ValidationFailures(vec![
                ("Factor".into(), "too big".into()),
                ("OutputWorkspace".into(), "missing".into()),
            ]),
        };
        assert_eq!(
            err.to_string(),
            "invalid properties for 'Scale': Factor: too big; OutputWorkspace: missing"
        );
        let failures = err.validation_failures().unwrap();
        assert_eq!(failures.for_property("factor").collect::<Vec<_>>(), vec!["too big"]);
    }

    #[test]
    fn cancellation_seen_through_children() {
        let err = AlgorithmError::Child {
            name: "Scale".into(),
            source: Box::new(AlgorithmError::Cancelled("Scale".into())),
        };
        assert!(err.is_cancelled());
        assert!(!AlgorithmError::runtime("x").is_cancelled());
    }

    #[test]
    fn property_errors_convert() {
        let err: AlgorithmError = PropertyError::NotFound("X".into()).into();
        assert_eq!(err.to_string(), "unknown property 'X'");
    }
}
