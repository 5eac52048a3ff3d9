//! The algorithm trait and run states

use crate::error::{AlgorithmError, ValidationIssue};
use crate::runner::ExecutionContext;
use alg_property::{PropertyError, PropertyManager};
use serde::Serialize;
use std::fmt;

/// A named, versioned unit of work
///
/// `init` declares properties; `exec` reads inputs and writes outputs
/// through the [`ExecutionContext`]. Instances are created fresh by the
/// algorithm factory for every run.
pub trait Algorithm: Send + fmt::Debug {
    /// Registered name
    fn name(&self) -> &'static str;

    /// Registered version, at least 1
    fn version(&self) -> u32 {
        1
    }

    /// Category path, `\\`-separated
    fn category(&self) -> &'static str {
        "General"
    }

    /// One-line description
    fn summary(&self) -> &'static str {
        ""
    }

    /// Declare properties
    ///
    /// # Errors
    /// Declaration errors such as duplicate names
    fn init(&mut self, properties: &mut PropertyManager) -> Result<(), PropertyError>;

    /// Cross-property checks run after per-property validation
    fn validate_inputs(&self, _properties: &PropertyManager) -> Vec<ValidationIssue> {
        Vec::new()
    }

    /// Do the work
    ///
    /// # Errors
    /// Any [`AlgorithmError`]; the run is marked failed and outputs reset
    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), AlgorithmError>;
}

/// Lifecycle state of one algorithm instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExecutionState {
    /// Created, properties not declared yet
    Uninitialized,
    /// Properties declared, ready to run
    Initialized,
    /// Last run succeeded
    Executed,
    /// Last run failed
    Failed,
}

impl ExecutionState {
    /// States reachable from `self`
    #[must_use]
    pub fn allowed_transitions(self) -> &'static [ExecutionState] {
        use ExecutionState::{Executed, Failed, Initialized};
        match self {
            Self::Uninitialized => &[Initialized],
            Self::Initialized | Self::Executed | Self::Failed => &[Executed, Failed],
        }
    }

    /// Whether `self -> to` is a legal transition
    #[must_use]
    pub fn can_transition_to(self, to: ExecutionState) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// Whether properties have been declared
    #[inline]
    #[must_use]
    pub fn is_initialized(self) -> bool {
        !matches!(self, Self::Uninitialized)
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions() {
        use ExecutionState::*;
        assert!(Uninitialized.can_transition_to(Initialized));
        assert!(!Uninitialized.can_transition_to(Executed));
        assert!(Initialized.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Executed));
        assert!(!Executed.can_transition_to(Uninitialized));
        assert!(!Uninitialized.is_initialized());
    }
}
