//! Validator built from other validators

use crate::validator::{Validator, ValidatorResult};
use crate::value::PropertyValue;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// How child results combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompositeRelation {
    /// Every child must accept; the first rejection is reported
    #[default]
    All,
    /// At least one child must accept
    Any,
}

/// Aggregate of child validators
#[derive(Debug, Clone, Default)]
pub struct CompositeValidator {
    children: Vec<Arc<dyn Validator>>,
    relation: CompositeRelation,
}

impl CompositeValidator {
    /// Empty composite with the given relation
    #[must_use]
    pub fn new(relation: CompositeRelation) -> Self {
        Self {
            children: Vec::new(),
            relation,
        }
    }

    /// Add a child (builder form)
    #[must_use]
    pub fn with(mut self, child: impl Validator + 'static) -> Self {
        self.add(Arc::new(child));
        self
    }

    /// Add a shared child
    pub fn add(&mut self, child: Arc<dyn Validator>) {
        self.children.push(child);
    }

    /// Relation between children
    #[inline]
    #[must_use]
    pub fn relation(&self) -> CompositeRelation {
        self.relation
    }

    /// Number of children
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether there are no children
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Validator for CompositeValidator {
    fn check(&self, value: &PropertyValue) -> ValidatorResult {
        match self.relation {
            CompositeRelation::All => self
                .children
                .iter()
                .map(|child| child.check(value))
                .find(|r| !r.is_valid())
                .unwrap_or(ValidatorResult::Valid),
            CompositeRelation::Any => {
                if self.children.is_empty() {
                    return ValidatorResult::Valid;
                }
                let mut messages = Vec::with_capacity(self.children.len());
                for child in &self.children {
                    match child.check(value) {
                        ValidatorResult::Valid => return ValidatorResult::Valid,
                        ValidatorResult::Invalid(message) => messages.push(message),
                    }
                }
                ValidatorResult::Invalid(format!(
                    "Invalid value for property: {}",
                    messages.join(" or ")
                ))
            }
        }
    }

    /// Combined allowed values
    ///
    /// With fewer than two restricting children this is the union of their
    /// lists. With two or more it is only the values listed by more than one
    /// child. Either way the result is sorted.
    fn allowed_values(&self) -> Vec<String> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut restricting = 0usize;
        for child in &self.children {
            let values: BTreeSet<String> = child.allowed_values().into_iter().collect();
            if values.is_empty() {
                continue;
            }
            restricting += 1;
            for value in values {
                *counts.entry(value).or_insert(0) += 1;
            }
        }
        if restricting < 2 {
            return counts.into_keys().collect();
        }
        counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(value, _)| value)
            .collect()
    }

    fn describe(&self) -> String {
        let sep = match self.relation {
            CompositeRelation::All => " and ",
            CompositeRelation::Any => " or ",
        };
        self.children
            .iter()
            .map(|c| c.describe())
            .collect::<Vec<_>>()
            .join(sep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{BoundedValidator, ListValidator, MandatoryValidator};
    use pretty_assertions::assert_eq;

    #[test]
    fn all_reports_first_failure() {
        let v = CompositeValidator::default()
            .with(BoundedValidator::between(0.0, 10.0))
            .with(MandatoryValidator::new());
        assert_eq!(
            v.check(&PropertyValue::Int(15)),
            ValidatorResult::invalid("Selected value 15 is > the upper bound (10)")
        );
        assert!(v.check(&PropertyValue::Int(5)).is_valid());
    }

    #[test]
    fn any_accepts_if_one_child_accepts() {
        let v = CompositeValidator::new(CompositeRelation::Any)
            .with(BoundedValidator::at_most(0.0))
            .with(BoundedValidator::at_least(10.0));
        assert!(v.check(&PropertyValue::Float(-1.0)).is_valid());
        assert!(v.check(&PropertyValue::Float(11.0)).is_valid());
        let rejected = v.check(&PropertyValue::Float(5.0));
        assert!(rejected.message().unwrap().contains(" or "));
    }

    #[test]
    fn empty_composite_accepts_everything() {
        assert!(CompositeValidator::default()
            .check(&PropertyValue::Int(1))
            .is_valid());
        assert!(CompositeValidator::new(CompositeRelation::Any)
            .check(&PropertyValue::Int(1))
            .is_valid());
    }

    #[test]
    fn allowed_values_single_list_is_passed_through() {
        let v = CompositeValidator::default()
            .with(ListValidator::new(["a", "b"]))
            .with(MandatoryValidator::new());
        assert_eq!(v.allowed_values(), vec!["a", "b"]);
    }

    #[test]
    fn allowed_values_keep_only_repeated_values() {
        let v = CompositeValidator::default()
            .with(ListValidator::new(["a", "b", "c"]))
            .with(ListValidator::new(["b", "c", "d"]))
            .with(ListValidator::new(["c", "e"]));
        assert_eq!(v.allowed_values(), vec!["b", "c"]);
    }

    #[test]
    fn allowed_values_are_sorted() {
        let single = CompositeValidator::default().with(ListValidator::new(["z", "a", "m"]));
        assert_eq!(single.allowed_values(), vec!["a", "m", "z"]);

        let shared = CompositeValidator::default()
            .with(ListValidator::new(["y", "x", "w"]))
            .with(ListValidator::new(["x", "y"]));
        assert_eq!(shared.allowed_values(), vec!["x", "y"]);

        let repeated = CompositeValidator::default()
            .with(ListValidator::new(["b", "b"]))
            .with(ListValidator::new(["a"]));
        assert!(repeated.allowed_values().is_empty());
    }

    #[test]
    fn allowed_values_empty_without_lists() {
        let v = CompositeValidator::default().with(BoundedValidator::between(0.0, 1.0));
        assert!(v.allowed_values().is_empty());
    }
}
