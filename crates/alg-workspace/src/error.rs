//! Workspace error types

use alg_registry::RegistryError;

/// Errors raised by workspaces, the workspace factory and the data service
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkspaceError {
    /// Malformed size or parameter
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Histogram index past the end
    #[error("histogram index {index} out of range (count: {count})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of histograms
        count: usize,
    },

    /// Buffer of the wrong length
    #[error("{buffer} length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Which buffer ("x", "y", "e")
        buffer: &'static str,
        /// Required length
        expected: usize,
        /// Supplied length
        actual: usize,
    },

    /// Workspace type not registered with the factory
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// No workspace stored under this name
    #[error("workspace '{name}' does not exist")]
    NotFound {
        /// Workspace name
        name: String,
    },

    /// A workspace is already stored under this name
    #[error("workspace '{name}' already exists")]
    AlreadyExists {
        /// Workspace name
        name: String,
    },

    /// Name rejected by the data service
    #[error("invalid workspace name '{name}': {reason}")]
    InvalidName {
        /// Offending name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Run log already present
    #[error("log '{0}' already exists")]
    LogExists(String),

    /// Run log missing
    #[error("log '{0}' not found")]
    LogNotFound(String),
}

impl WorkspaceError {
    /// Shorthand for [`WorkspaceError::InvalidArgument`]
    #[inline]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
