//! Error types for property access

use crate::value::PropertyKind;

/// Property declaration and access errors
///
/// Validation failures are not errors here; validators report a message
/// and the caller decides what to do with it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    /// No property with this name has been declared
    #[error("unknown property '{0}'")]
    NotFound(String),

    /// A property with this name already exists
    #[error("property '{0}' is already declared")]
    DuplicateName(String),

    /// Property names must not be blank
    #[error("invalid property name '{0}'")]
    InvalidName(String),

    /// Value kind does not match the declared kind
    #[error("property '{name}' holds {expected} values, got {actual}")]
    TypeMismatch {
        /// Property name
        name: String,
        /// Declared kind
        expected: PropertyKind,
        /// Kind supplied or requested
        actual: PropertyKind,
    },

    /// String or JSON input could not be converted
    #[error("cannot set property '{name}' from '{input}': {reason}")]
    Parse {
        /// Property name
        name: String,
        /// Offending input
        input: String,
        /// Parser message
        reason: String,
    },

    /// Workspace property has no workspace attached
    #[error("property '{0}' has no workspace attached")]
    NoWorkspace(String),
}

impl PropertyError {
    /// Whether this is a lookup failure
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_property() {
        let err = PropertyError::TypeMismatch {
            name: "Factor".into(),
            expected: PropertyKind::Float,
            actual: PropertyKind::Str,
        };
        assert_eq!(
            err.to_string(),
            "property 'Factor' holds float values, got string"
        );
        assert!(PropertyError::NotFound("x".into()).is_not_found());
    }
}
