//! Ordered collection of properties
//!
//! Names are matched case-insensitively and keep their declaration order.
//! Values are only validated on request, never when set.

use crate::error::PropertyError;
use crate::property::{Direction, Property};
use crate::validator::Validator;
use crate::value::{FromPropertyValue, PropertyValue, WorkspaceSlot};
use alg_workspace::WorkspaceHandle;
use indexmap::IndexMap;
use std::sync::Arc;

/// Declared properties of one algorithm instance
#[derive(Debug, Clone, Default)]
pub struct PropertyManager {
    properties: IndexMap<String, Property>,
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl PropertyManager {
    /// Empty manager
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a property
    ///
    /// # Errors
    /// - `PropertyError::InvalidName` for a blank name
    /// - `PropertyError::DuplicateName` if already declared
    pub fn declare_property(
        &mut self,
        name: &str,
        default: impl Into<PropertyValue>,
        validator: Option<Arc<dyn Validator>>,
        direction: Direction,
    ) -> Result<(), PropertyError> {
        self.declare(Property::new(name, default, direction).with_shared_validator(validator))
    }

    /// Declare a fully built property
    ///
    /// # Errors
    /// Same as [`declare_property`](Self::declare_property)
    pub fn declare(&mut self, property: Property) -> Result<(), PropertyError> {
        if property.name().trim().is_empty() {
            return Err(PropertyError::InvalidName(property.name().to_string()));
        }
        let key = key(property.name());
        if self.properties.contains_key(&key) {
            return Err(PropertyError::DuplicateName(property.name().to_string()));
        }
        tracing::trace!(property = property.name(), kind = %property.kind(), "declared");
        self.properties.insert(key, property);
        Ok(())
    }

    /// Whether `name` is declared
    #[inline]
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.properties.contains_key(&key(name))
    }

    /// Property by name
    ///
    /// # Errors
    /// `PropertyError::NotFound`
    pub fn get_property(&self, name: &str) -> Result<&Property, PropertyError> {
        self.properties
            .get(&key(name))
            .ok_or_else(|| PropertyError::NotFound(name.to_string()))
    }

    /// Mutable property by name
    ///
    /// # Errors
    /// `PropertyError::NotFound`
    pub fn get_property_mut(&mut self, name: &str) -> Result<&mut Property, PropertyError> {
        self.properties
            .get_mut(&key(name))
            .ok_or_else(|| PropertyError::NotFound(name.to_string()))
    }

    /// Typed value
    ///
    /// # Errors
    /// - `PropertyError::NotFound`
    /// - `PropertyError::TypeMismatch` if `T` is not the declared kind
    pub fn get<T: FromPropertyValue>(&self, name: &str) -> Result<T, PropertyError> {
        let property = self.get_property(name)?;
        T::from_value(property.value()).ok_or_else(|| PropertyError::TypeMismatch {
            name: property.name().to_string(),
            expected: property.kind(),
            actual: T::KIND,
        })
    }

    /// Workspace attached to a workspace property
    ///
    /// # Errors
    /// - `PropertyError::NotFound` / `TypeMismatch`
    /// - `PropertyError::NoWorkspace` if nothing is attached
    pub fn workspace(&self, name: &str) -> Result<WorkspaceHandle, PropertyError> {
        let slot: WorkspaceSlot = self.get(name)?;
        slot.handle()
            .cloned()
            .ok_or_else(|| PropertyError::NoWorkspace(name.to_string()))
    }

    /// Canonical string form of a value
    ///
    /// # Errors
    /// `PropertyError::NotFound`
    pub fn get_property_value(&self, name: &str) -> Result<String, PropertyError> {
        Ok(self.get_property(name)?.value_as_string())
    }

    /// Set a value; the kind must match the declaration
    ///
    /// # Errors
    /// `PropertyError::NotFound` / `TypeMismatch`
    pub fn set_property(
        &mut self,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<(), PropertyError> {
        self.get_property_mut(name)?.set(value)
    }

    /// Set a value from its string form
    ///
    /// # Errors
    /// `PropertyError::NotFound` / `Parse`
    pub fn set_property_value(&mut self, name: &str, value: &str) -> Result<(), PropertyError> {
        self.get_property_mut(name)?.set_from_string(value)
    }

    /// Attach a workspace, keeping any name already set on the slot
    ///
    /// # Errors
    /// `PropertyError::NotFound` / `TypeMismatch`
    pub fn set_workspace(
        &mut self,
        name: &str,
        handle: WorkspaceHandle,
    ) -> Result<(), PropertyError> {
        let property = self.get_property_mut(name)?;
        let kind = property.kind();
        let property_name = property.name().to_string();
        match property.value_mut().as_workspace_mut() {
            Some(slot) => {
                slot.set_handle(handle);
                Ok(())
            }
            None => Err(PropertyError::TypeMismatch {
                name: property_name,
                expected: kind,
                actual: crate::value::PropertyKind::Workspace,
            }),
        }
    }

    /// Set several properties from a JSON object
    ///
    /// Each member is set from its JSON-native form, or its string form when
    /// given as a JSON string. Stops at the first failure.
    ///
    /// # Errors
    /// - `PropertyError::Parse` if `json` is not an object or a value does
    ///   not convert
    /// - `PropertyError::NotFound` for an undeclared member
    pub fn set_properties_from_json(
        &mut self,
        json: &serde_json::Value,
    ) -> Result<(), PropertyError> {
        let object = json.as_object().ok_or_else(|| PropertyError::Parse {
            name: String::new(),
            input: json.to_string(),
            reason: "expected a JSON object".to_string(),
        })?;
        for (name, value) in object {
            self.get_property_mut(name)?.set_from_json(value)?;
        }
        tracing::debug!(count = object.len(), "set properties from JSON");
        Ok(())
    }

    /// JSON object of every property not at its default
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let object: serde_json::Map<String, serde_json::Value> = self
            .properties
            .values()
            .filter(|p| !p.is_default())
            .map(|p| (p.name().to_string(), p.value().to_json()))
            .collect();
        serde_json::Value::Object(object)
    }

    /// Check every property, returning `(name, message)` per failure in
    /// declaration order
    #[must_use]
    pub fn validate_properties(&self) -> Vec<(String, String)> {
        self.properties
            .values()
            .filter_map(|p| {
                p.is_valid()
                    .message()
                    .map(|m| (p.name().to_string(), m.to_string()))
            })
            .collect()
    }

    /// Whether the value of `name` equals its default
    ///
    /// # Errors
    /// `PropertyError::NotFound`
    pub fn is_default(&self, name: &str) -> Result<bool, PropertyError> {
        Ok(self.get_property(name)?.is_default())
    }

    /// Restore defaults, for every property or one direction only
    pub fn reset_to_defaults(&mut self, direction: Option<Direction>) {
        self.properties
            .values_mut()
            .filter(|p| direction.map_or(true, |d| p.direction() == d))
            .for_each(Property::reset);
    }

    /// Remove a property, keeping the order of the rest
    ///
    /// # Errors
    /// `PropertyError::NotFound`
    pub fn remove_property(&mut self, name: &str) -> Result<Property, PropertyError> {
        self.properties
            .shift_remove(&key(name))
            .ok_or_else(|| PropertyError::NotFound(name.to_string()))
    }

    /// Properties in declaration order
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    /// Mutable properties in declaration order
    pub fn properties_mut(&mut self) -> impl Iterator<Item = &mut Property> {
        self.properties.values_mut()
    }

    /// Number of declared properties
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether nothing is declared
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::CompositeValidator;
    use crate::validator::{BoundedValidator, ListValidator, MandatoryValidator};
    use alg_workspace::WorkspaceSingleValue;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn manager() -> PropertyManager {
        let mut pm = PropertyManager::new();
        pm.declare_property(
            "Factor",
            1.0,
            Some(Arc::new(BoundedValidator::at_least(0.0))),
            Direction::Input,
        )
        .unwrap();
        pm.declare(
            Property::new("Operation", "Multiply", Direction::Input)
                .with_validator(ListValidator::new(["Multiply", "Add"])),
        )
        .unwrap();
        pm.declare_property(
            "OutputWorkspace",
            WorkspaceSlot::default(),
            Some(Arc::new(MandatoryValidator::new())),
            Direction::Output,
        )
        .unwrap();
        pm
    }

    #[test]
    fn duplicate_declaration_fails() {
        let mut pm = manager();
        assert_eq!(
            pm.declare_property("factor", 2.0, None, Direction::Input),
            Err(PropertyError::DuplicateName("factor".into()))
        );
        assert!(matches!(
            pm.declare_property(" ", 2.0, None, Direction::Input),
            Err(PropertyError::InvalidName(_))
        ));
    }

    #[test]
    fn unknown_property_is_not_found() {
        let pm = manager();
        assert_eq!(
            pm.get_property("Nope").unwrap_err(),
            PropertyError::NotFound("Nope".into())
        );
        assert!(pm.get_property_value("Nope").unwrap_err().is_not_found());
    }

    #[test]
    fn names_are_case_insensitive() {
        let mut pm = manager();
        pm.set_property("FACTOR", 3.0).unwrap();
        assert_eq!(pm.get::<f64>("factor").unwrap(), 3.0);
        assert_eq!(pm.get_property("factor").unwrap().name(), "Factor");
    }

    #[test]
    fn typed_get_checks_rust_type() {
        let pm = manager();
        assert_eq!(
            pm.get::<String>("Factor").unwrap_err(),
            PropertyError::TypeMismatch {
                name: "Factor".into(),
                expected: crate::value::PropertyKind::Float,
                actual: crate::value::PropertyKind::Str,
            }
        );
    }

    #[test]
    fn set_does_not_validate() {
        let mut pm = manager();
        pm.set_property("Factor", -2.0).unwrap();
        pm.set_property_value("OutputWorkspace", "out").unwrap();
        assert_eq!(
            pm.validate_properties(),
            vec![(
                "Factor".to_string(),
                "Selected value -2 is < the lower bound (0)".to_string()
            )]
        );
    }

    #[test]
    fn validation_order_and_idempotence() {
        let mut pm = manager();
        pm.set_property("Factor", -1.0).unwrap();
        pm.set_property_value("Operation", "Divide").unwrap();
        let first = pm.validate_properties();
        let names: Vec<&str> = first.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Factor", "Operation", "OutputWorkspace"]);
        assert_eq!(pm.validate_properties(), first);
    }

    #[test]
    fn composite_property_example() {
        let mut pm = PropertyManager::new();
        let validator = CompositeValidator::default()
            .with(BoundedValidator::between(0.0, 10.0))
            .with(MandatoryValidator::new());
        pm.declare(Property::new("N", 1_i64, Direction::Input).with_validator(validator))
            .unwrap();
        pm.set_property("N", 15_i64).unwrap();
        assert_eq!(
            pm.validate_properties(),
            vec![(
                "N".to_string(),
                "Selected value 15 is > the upper bound (10)".to_string()
            )]
        );
        pm.set_property("N", 5_i64).unwrap();
        assert!(pm.validate_properties().is_empty());
    }

    #[test]
    fn workspace_slots() {
        let mut pm = manager();
        assert_eq!(
            pm.workspace("OutputWorkspace").unwrap_err(),
            PropertyError::NoWorkspace("OutputWorkspace".into())
        );
        pm.set_property_value("OutputWorkspace", "out").unwrap();
        let handle = WorkspaceHandle::new(Box::new(WorkspaceSingleValue::new(1.0, 0.0)));
        pm.set_workspace("OutputWorkspace", handle.clone()).unwrap();
        assert!(pm.workspace("OutputWorkspace").unwrap().ptr_eq(&handle));
        assert_eq!(pm.get_property_value("OutputWorkspace").unwrap(), "out");
        assert!(pm.set_workspace("Factor", handle).is_err());
    }

    #[test]
    fn json_import_and_export() {
        let mut pm = manager();
        pm.set_properties_from_json(&serde_json::json!({
            "Factor": 2.5,
            "Operation": "Add"
        }))
        .unwrap();
        assert_eq!(
            pm.to_json(),
            serde_json::json!({"Factor": 2.5, "Operation": "Add"})
        );
        assert!(pm
            .set_properties_from_json(&serde_json::json!({"Missing": 1}))
            .unwrap_err()
            .is_not_found());
        assert!(matches!(
            pm.set_properties_from_json(&serde_json::json!([1, 2])),
            Err(PropertyError::Parse { .. })
        ));
    }

    #[test]
    fn huge_index_range_is_a_parse_error() {
        let mut pm = manager();
        pm.declare_property("Indices", Vec::<i64>::new(), None, Direction::Input)
            .unwrap();
        assert!(matches!(
            pm.set_property_value("Indices", "0:9223372036854775807"),
            Err(PropertyError::Parse { .. })
        ));
        assert!(pm.is_default("Indices").unwrap());
        pm.set_property_value("Indices", "2:4").unwrap();
        assert_eq!(pm.get::<Vec<i64>>("Indices").unwrap(), vec![2, 3, 4]);
    }

    #[test]
    fn reset_and_remove() {
        let mut pm = manager();
        pm.set_property("Factor", 9.0).unwrap();
        pm.set_property_value("OutputWorkspace", "out").unwrap();
        pm.reset_to_defaults(Some(Direction::Output));
        assert!(pm.is_default("OutputWorkspace").unwrap());
        assert!(!pm.is_default("Factor").unwrap());
        pm.reset_to_defaults(None);
        assert!(pm.is_default("Factor").unwrap());

        pm.remove_property("Operation").unwrap();
        let names: Vec<&str> = pm.properties().map(Property::name).collect();
        assert_eq!(names, vec!["Factor", "OutputWorkspace"]);
    }

    proptest! {
        #[test]
        fn accepted_strings_round_trip(value in 0_i64..=1000) {
            let mut pm = PropertyManager::new();
            pm.declare(
                Property::new("N", 0_i64, Direction::Input)
                    .with_validator(BoundedValidator::between(0.0, 1000.0)),
            )
            .unwrap();
            let text = value.to_string();
            pm.set_property_value("N", &text).unwrap();
            prop_assert!(pm.validate_properties().is_empty());
            prop_assert_eq!(pm.get_property_value("N").unwrap(), text);
        }

        #[test]
        fn validation_is_idempotent(factor in -100.0f64..100.0, op in "[A-Za-z]{0,10}") {
            let mut pm = manager();
            pm.set_property("Factor", factor).unwrap();
            pm.set_property_value("Operation", &op).unwrap();
            let first = pm.validate_properties();
            prop_assert_eq!(pm.validate_properties(), first);
        }
    }
}
