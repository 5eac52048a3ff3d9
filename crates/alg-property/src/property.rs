//! A single named, typed, directioned property

use crate::error::PropertyError;
use crate::validator::{Validator, ValidatorResult};
use crate::value::{PropertyKind, PropertyValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Data flow direction of a property
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Read by the algorithm
    #[default]
    Input,
    /// Written by the algorithm
    Output,
    /// Read and written
    InOut,
}

impl Direction {
    /// Input or InOut
    #[inline]
    #[must_use]
    pub fn is_input(self) -> bool {
        matches!(self, Self::Input | Self::InOut)
    }

    /// Output or InOut
    #[inline]
    #[must_use]
    pub fn is_output(self) -> bool {
        matches!(self, Self::Output | Self::InOut)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Input => "Input",
            Self::Output => "Output",
            Self::InOut => "InOut",
        })
    }
}

/// Named value slot with a fixed kind and direction
///
/// The kind is taken from the default value and never changes.
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    direction: Direction,
    default: PropertyValue,
    value: PropertyValue,
    validator: Option<Arc<dyn Validator>>,
    documentation: String,
}

impl Property {
    /// Property holding its default
    #[must_use]
    pub fn new(name: impl Into<String>, default: impl Into<PropertyValue>, direction: Direction) -> Self {
        let default = default.into();
        Self {
            name: name.into(),
            direction,
            value: default.clone(),
            default,
            validator: None,
            documentation: String::new(),
        }
    }

    /// Attach a validator
    #[must_use]
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Attach a shared validator
    #[must_use]
    pub fn with_shared_validator(mut self, validator: Option<Arc<dyn Validator>>) -> Self {
        self.validator = validator;
        self
    }

    /// Attach documentation
    #[must_use]
    pub fn with_documentation(mut self, doc: impl Into<String>) -> Self {
        self.documentation = doc.into();
        self
    }

    /// Name as declared
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direction
    #[inline]
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Kind fixed at declaration
    #[inline]
    #[must_use]
    pub fn kind(&self) -> PropertyKind {
        self.default.kind()
    }

    /// Current value
    #[inline]
    #[must_use]
    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    /// Current value, mutable in place (kind cannot change through this)
    #[inline]
    pub(crate) fn value_mut(&mut self) -> &mut PropertyValue {
        &mut self.value
    }

    /// Default value
    #[inline]
    #[must_use]
    pub fn default_value(&self) -> &PropertyValue {
        &self.default
    }

    /// Documentation string
    #[inline]
    #[must_use]
    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// Attached validator
    #[inline]
    #[must_use]
    pub fn validator(&self) -> Option<&Arc<dyn Validator>> {
        self.validator.as_ref()
    }

    /// Replace the value; the kind must match
    ///
    /// # Errors
    /// `PropertyError::TypeMismatch`
    pub fn set(&mut self, value: impl Into<PropertyValue>) -> Result<(), PropertyError> {
        let value = value.into();
        if value.kind() != self.kind() {
            return Err(PropertyError::TypeMismatch {
                name: self.name.clone(),
                expected: self.kind(),
                actual: value.kind(),
            });
        }
        self.value = value;
        Ok(())
    }

    /// Replace the value from its string form
    ///
    /// # Errors
    /// `PropertyError::Parse`
    pub fn set_from_string(&mut self, input: &str) -> Result<(), PropertyError> {
        self.value = PropertyValue::parse(self.kind(), input).map_err(|reason| {
            PropertyError::Parse {
                name: self.name.clone(),
                input: input.to_string(),
                reason,
            }
        })?;
        Ok(())
    }

    /// Replace the value from JSON
    ///
    /// # Errors
    /// `PropertyError::Parse`
    pub fn set_from_json(&mut self, json: &serde_json::Value) -> Result<(), PropertyError> {
        self.value = PropertyValue::from_json(self.kind(), json).map_err(|reason| {
            PropertyError::Parse {
                name: self.name.clone(),
                input: json.to_string(),
                reason,
            }
        })?;
        Ok(())
    }

    /// Canonical string form of the value
    #[must_use]
    pub fn value_as_string(&self) -> String {
        self.value.to_string()
    }

    /// Whether the value equals the default
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.value == self.default
    }

    /// Restore the default
    pub fn reset(&mut self) {
        self.value = self.default.clone();
    }

    /// Run the validator on the current value
    #[must_use]
    pub fn is_valid(&self) -> ValidatorResult {
        self.validator
            .as_ref()
            .map_or(ValidatorResult::Valid, |v| v.check(&self.value))
    }

    /// Accepted string forms, empty when unrestricted
    #[must_use]
    pub fn allowed_values(&self) -> Vec<String> {
        self.validator
            .as_ref()
            .map(|v| v.allowed_values())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::BoundedValidator;

    #[test]
    fn kind_is_fixed_by_default() {
        let mut p = Property::new("Factor", 1.0, Direction::Input);
        assert_eq!(p.kind(), PropertyKind::Float);
        assert!(matches!(
            p.set("text"),
            Err(PropertyError::TypeMismatch { .. })
        ));
        p.set(2.0).unwrap();
        assert_eq!(p.value(), &PropertyValue::Float(2.0));
    }

    #[test]
    fn set_from_string_parses_by_kind() {
        let mut p = Property::new("Indices", vec![0_i64], Direction::Input);
        p.set_from_string("1,2,3").unwrap();
        assert_eq!(p.value_as_string(), "1,2,3");
        let err = p.set_from_string("1,x").unwrap_err();
        assert!(matches!(err, PropertyError::Parse { .. }));
    }

    #[test]
    fn validation_is_lazy() {
        let mut p = Property::new("N", 1_i64, Direction::Input)
            .with_validator(BoundedValidator::at_least(0.0));
        p.set(-1_i64).unwrap();
        assert!(!p.is_valid().is_valid());
        p.reset();
        assert!(p.is_default());
        assert!(p.is_valid().is_valid());
    }

    #[test]
    fn direction_flags() {
        assert!(Direction::InOut.is_input() && Direction::InOut.is_output());
        assert!(!Direction::Output.is_input());
        assert_eq!(Direction::InOut.to_string(), "InOut");
    }
}
