//! Validators checked against candidate property values
//!
//! A validator never fails; it answers [`ValidatorResult::Valid`] or an
//! [`Invalid`](ValidatorResult::Invalid) message meant for the user.

use crate::value::{PropertyKind, PropertyValue, WorkspaceSlot};
use std::fmt;

/// Outcome of a validator check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatorResult {
    /// Value accepted
    Valid,
    /// Value rejected, with the reason
    Invalid(String),
}

impl ValidatorResult {
    /// Rejection with a message
    #[inline]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Whether the value was accepted
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Rejection message, if any
    #[inline]
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid(message) => Some(message),
        }
    }
}

/// Predicate over a single property value
///
/// Implementations must be pure: the same value always gets the same answer.
pub trait Validator: Send + Sync + fmt::Debug {
    /// Check a candidate value
    fn check(&self, value: &PropertyValue) -> ValidatorResult;

    /// Finite set of accepted string forms, empty when unrestricted
    fn allowed_values(&self) -> Vec<String> {
        Vec::new()
    }

    /// Short description shown by `describe`
    fn describe(&self) -> String;
}

/// Numeric range check for scalars and, element-wise, numeric arrays
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundedValidator {
    lower: Option<f64>,
    upper: Option<f64>,
    lower_exclusive: bool,
    upper_exclusive: bool,
}

impl BoundedValidator {
    /// Unbounded validator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive range `[lower, upper]`
    #[inline]
    #[must_use]
    pub fn between(lower: f64, upper: f64) -> Self {
        Self::new().with_lower(lower).with_upper(upper)
    }

    /// Inclusive lower bound only
    #[inline]
    #[must_use]
    pub fn at_least(lower: f64) -> Self {
        Self::new().with_lower(lower)
    }

    /// Inclusive upper bound only
    #[inline]
    #[must_use]
    pub fn at_most(upper: f64) -> Self {
        Self::new().with_upper(upper)
    }

    /// Set the lower bound
    #[inline]
    #[must_use]
    pub fn with_lower(mut self, lower: f64) -> Self {
        self.lower = Some(lower);
        self
    }

    /// Set the upper bound
    #[inline]
    #[must_use]
    pub fn with_upper(mut self, upper: f64) -> Self {
        self.upper = Some(upper);
        self
    }

    /// Make both bounds exclusive
    #[inline]
    #[must_use]
    pub fn exclusive(mut self) -> Self {
        self.lower_exclusive = true;
        self.upper_exclusive = true;
        self
    }

    /// Lower bound
    #[inline]
    #[must_use]
    pub fn lower(&self) -> Option<f64> {
        self.lower
    }

    /// Upper bound
    #[inline]
    #[must_use]
    pub fn upper(&self) -> Option<f64> {
        self.upper
    }

    fn check_number(&self, value: f64, shown: &dyn fmt::Display) -> ValidatorResult {
        if value.is_nan() && (self.lower.is_some() || self.upper.is_some()) {
            return ValidatorResult::invalid("Selected value NaN is not a number");
        }
        if let Some(lower) = self.lower {
            let below = if self.lower_exclusive {
                value <= lower
            } else {
                value < lower
            };
            if below {
                let op = if self.lower_exclusive { "<=" } else { "<" };
                return ValidatorResult::invalid(format!(
                    "Selected value {shown} is {op} the lower bound ({lower})"
                ));
            }
        }
        if let Some(upper) = self.upper {
            let above = if self.upper_exclusive {
                value >= upper
            } else {
                value > upper
            };
            if above {
                let op = if self.upper_exclusive { ">=" } else { ">" };
                return ValidatorResult::invalid(format!(
                    "Selected value {shown} is {op} the upper bound ({upper})"
                ));
            }
        }
        ValidatorResult::Valid
    }
}

impl Validator for BoundedValidator {
    #[allow(clippy::cast_precision_loss)]
    fn check(&self, value: &PropertyValue) -> ValidatorResult {
        match value {
            PropertyValue::Int(i) => self.check_number(*i as f64, i),
            PropertyValue::Float(f) => self.check_number(*f, f),
            PropertyValue::IntArray(items) => items
                .iter()
                .map(|i| self.check_number(*i as f64, i))
                .find(|r| !r.is_valid())
                .unwrap_or(ValidatorResult::Valid),
            PropertyValue::FloatArray(items) => items
                .iter()
                .map(|f| self.check_number(*f, f))
                .find(|r| !r.is_valid())
                .unwrap_or(ValidatorResult::Valid),
            other => ValidatorResult::invalid(format!(
                "A bounded check needs a numeric value, not {}",
                other.kind()
            )),
        }
    }

    fn describe(&self) -> String {
        let lower = self.lower.map_or_else(|| "-inf".to_string(), |l| l.to_string());
        let upper = self.upper.map_or_else(|| "inf".to_string(), |u| u.to_string());
        let open = if self.lower_exclusive { '(' } else { '[' };
        let close = if self.upper_exclusive { ')' } else { ']' };
        format!("bounded {open}{lower}, {upper}{close}")
    }
}

/// Rejects empty strings, empty arrays and unset workspace slots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MandatoryValidator;

impl MandatoryValidator {
    /// Message for a missing value
    pub const MESSAGE: &'static str = "A value must be entered for this parameter";

    /// New validator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Validator for MandatoryValidator {
    fn check(&self, value: &PropertyValue) -> ValidatorResult {
        let empty = match value {
            PropertyValue::Str(s) => s.is_empty(),
            PropertyValue::IntArray(v) => v.is_empty(),
            PropertyValue::FloatArray(v) => v.is_empty(),
            PropertyValue::StrArray(v) => v.is_empty(),
            PropertyValue::Workspace(slot) => slot.is_empty(),
            PropertyValue::Bool(_) | PropertyValue::Int(_) => false,
            PropertyValue::Float(f) => f.is_nan(),
        };
        if empty {
            ValidatorResult::invalid(Self::MESSAGE)
        } else {
            ValidatorResult::Valid
        }
    }

    fn describe(&self) -> String {
        "mandatory".to_string()
    }
}

/// String (or string array element) must be one of a fixed list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListValidator {
    allowed: Vec<String>,
}

impl ListValidator {
    /// Validator accepting exactly `allowed`
    #[must_use]
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Add one more accepted value
    pub fn add_allowed(&mut self, value: impl Into<String>) {
        let value = value.into();
        if !self.allowed.contains(&value) {
            self.allowed.push(value);
        }
    }

    fn check_one(&self, value: &str) -> ValidatorResult {
        if self.allowed.iter().any(|a| a == value) {
            ValidatorResult::Valid
        } else {
            ValidatorResult::invalid(format!(
                "The value \"{value}\" is not in the list of allowed values"
            ))
        }
    }
}

impl Validator for ListValidator {
    fn check(&self, value: &PropertyValue) -> ValidatorResult {
        match value {
            PropertyValue::StrArray(items) => items
                .iter()
                .map(|item| self.check_one(item))
                .find(|r| !r.is_valid())
                .unwrap_or(ValidatorResult::Valid),
            PropertyValue::Str(s) => self.check_one(s),
            other => self.check_one(&other.to_string()),
        }
    }

    fn allowed_values(&self) -> Vec<String> {
        self.allowed.clone()
    }

    fn describe(&self) -> String {
        format!("one of [{}]", self.allowed.join(", "))
    }
}

/// Bounds on the number of array elements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArrayLengthValidator {
    min: Option<usize>,
    max: Option<usize>,
}

impl ArrayLengthValidator {
    /// Length between `min` and `max`, both optional and inclusive
    #[inline]
    #[must_use]
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }

    /// Length exactly `len`
    #[inline]
    #[must_use]
    pub fn exact(len: usize) -> Self {
        Self::new(Some(len), Some(len))
    }
}

impl Validator for ArrayLengthValidator {
    fn check(&self, value: &PropertyValue) -> ValidatorResult {
        let len = match value {
            PropertyValue::IntArray(v) => v.len(),
            PropertyValue::FloatArray(v) => v.len(),
            PropertyValue::StrArray(v) => v.len(),
            other => {
                return ValidatorResult::invalid(format!(
                    "A length check needs an array value, not {}",
                    other.kind()
                ))
            }
        };
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max && len != min => {
                ValidatorResult::invalid(format!("Incorrect size: {len} elements, expected {min}"))
            }
            (Some(min), _) if len < min => {
                ValidatorResult::invalid(format!("Length is too short: {len} < {min}"))
            }
            (_, Some(max)) if len > max => {
                ValidatorResult::invalid(format!("Length is too long: {len} > {max}"))
            }
            _ => ValidatorResult::Valid,
        }
    }

    fn describe(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => format!("length {min}"),
            (Some(min), Some(max)) => format!("length {min}..={max}"),
            (Some(min), None) => format!("length >= {min}"),
            (None, Some(max)) => format!("length <= {max}"),
            (None, None) => "any length".to_string(),
        }
    }
}

/// Workspace must (or must not) hold histogram data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramValidator {
    must_be_histogram: bool,
}

impl Default for HistogramValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl HistogramValidator {
    /// Require histogram data
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            must_be_histogram: true,
        }
    }

    /// Require point data instead
    #[inline]
    #[must_use]
    pub fn point_data() -> Self {
        Self {
            must_be_histogram: false,
        }
    }

    fn check_slot(self, slot: &WorkspaceSlot) -> ValidatorResult {
        let Some(handle) = slot.handle() else {
            return ValidatorResult::invalid("Enter an existing workspace");
        };
        let is_histogram = handle.shape().is_histogram_data();
        match (self.must_be_histogram, is_histogram) {
            (true, false) => ValidatorResult::invalid("The workspace must contain histogram data"),
            (false, true) => {
                ValidatorResult::invalid("The workspace must not contain histogram data")
            }
            _ => ValidatorResult::Valid,
        }
    }
}

impl Validator for HistogramValidator {
    fn check(&self, value: &PropertyValue) -> ValidatorResult {
        match value {
            PropertyValue::Workspace(slot) => self.check_slot(slot),
            other => ValidatorResult::invalid(format!(
                "A histogram check needs a {} value, not {}",
                PropertyKind::Workspace,
                other.kind()
            )),
        }
    }

    fn describe(&self) -> String {
        if self.must_be_histogram {
            "histogram data".to_string()
        } else {
            "point data".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alg_workspace::{Workspace2D, WorkspaceHandle, WorkspaceShape};
    use pretty_assertions::assert_eq;

    fn workspace(x_length: usize, y_length: usize) -> PropertyValue {
        let shape = WorkspaceShape::new(1, x_length, y_length).unwrap();
        let ws = Workspace2D::with_shape(shape).unwrap();
        PropertyValue::from(WorkspaceHandle::new(Box::new(ws)))
    }

    #[test]
    fn bounded_messages() {
        let v = BoundedValidator::between(0.0, 10.0);
        assert_eq!(
            v.check(&PropertyValue::Int(15)),
            ValidatorResult::invalid("Selected value 15 is > the upper bound (10)")
        );
        assert_eq!(
            v.check(&PropertyValue::Float(-0.5)),
            ValidatorResult::invalid("Selected value -0.5 is < the lower bound (0)")
        );
        assert!(v.check(&PropertyValue::Int(10)).is_valid());
        assert!(v.check(&PropertyValue::Float(0.0)).is_valid());
    }

    #[test]
    fn bounded_exclusive_rejects_edges() {
        let v = BoundedValidator::between(0.0, 1.0).exclusive();
        assert!(!v.check(&PropertyValue::Float(0.0)).is_valid());
        assert!(!v.check(&PropertyValue::Float(1.0)).is_valid());
        assert!(v.check(&PropertyValue::Float(0.5)).is_valid());
        assert_eq!(v.describe(), "bounded (0, 1)");
    }

    #[test]
    fn bounded_rejects_nan() {
        let nan = ValidatorResult::invalid("Selected value NaN is not a number");
        assert_eq!(BoundedValidator::at_least(0.0).check(&PropertyValue::Float(f64::NAN)), nan);
        assert_eq!(BoundedValidator::at_most(1.0).check(&PropertyValue::Float(f64::NAN)), nan);
        assert_eq!(
            BoundedValidator::between(0.0, 1.0)
                .check(&PropertyValue::FloatArray(vec![0.5, f64::NAN])),
            nan
        );
        assert!(BoundedValidator::new().check(&PropertyValue::Float(f64::NAN)).is_valid());
    }

    #[test]
    fn bounded_arrays_are_element_wise() {
        let v = BoundedValidator::at_least(1.0);
        assert!(v.check(&PropertyValue::IntArray(vec![1, 2, 3])).is_valid());
        assert_eq!(
            v.check(&PropertyValue::IntArray(vec![1, 0])).message(),
            Some("Selected value 0 is < the lower bound (1)")
        );
    }

    #[test]
    fn mandatory_rejects_empty_values() {
        let v = MandatoryValidator::new();
        assert_eq!(
            v.check(&PropertyValue::Str(String::new())),
            ValidatorResult::invalid(MandatoryValidator::MESSAGE)
        );
        assert!(!v.check(&PropertyValue::FloatArray(vec![])).is_valid());
        assert!(!v.check(&PropertyValue::Workspace(WorkspaceSlot::default())).is_valid());
        assert!(v.check(&PropertyValue::Workspace(WorkspaceSlot::named("ws"))).is_valid());
        assert!(v.check(&PropertyValue::Int(0)).is_valid());
    }

    #[test]
    fn list_validator_reports_allowed_values() {
        let v = ListValidator::new(["Multiply", "Add"]);
        assert!(v.check(&PropertyValue::from("Add")).is_valid());
        assert_eq!(
            v.check(&PropertyValue::from("Divide")).message(),
            Some("The value \"Divide\" is not in the list of allowed values")
        );
        assert_eq!(v.allowed_values(), vec!["Multiply", "Add"]);
    }

    #[test]
    fn array_length_bounds() {
        let v = ArrayLengthValidator::new(Some(1), Some(3));
        assert!(v.check(&PropertyValue::FloatArray(vec![1.0])).is_valid());
        assert!(!v.check(&PropertyValue::FloatArray(vec![])).is_valid());
        assert!(!v
            .check(&PropertyValue::FloatArray(vec![1.0, 2.0, 3.0, 4.0]))
            .is_valid());
        assert!(ArrayLengthValidator::exact(2)
            .check(&PropertyValue::IntArray(vec![1]))
            .message()
            .unwrap()
            .starts_with("Incorrect size"));
    }

    #[test]
    fn histogram_validator_checks_shape() {
        let v = HistogramValidator::new();
        assert!(v.check(&workspace(4, 3)).is_valid());
        assert_eq!(
            v.check(&workspace(3, 3)).message(),
            Some("The workspace must contain histogram data")
        );
        assert!(HistogramValidator::point_data()
            .check(&workspace(3, 3))
            .is_valid());
        assert_eq!(
            v.check(&PropertyValue::Workspace(WorkspaceSlot::named("missing")))
                .message(),
            Some("Enter an existing workspace")
        );
    }
}
