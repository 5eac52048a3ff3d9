//! ALG Property
//!
//! Typed, directioned property slots with lazily checked validators.
//!
//! # Core Concepts
//!
//! - [`PropertyValue`]: closed set of value kinds with canonical string forms
//! - [`Validator`]: pure predicate returning a [`ValidatorResult`]
//! - [`CompositeValidator`]: all-of / any-of aggregation of validators
//! - [`PropertyManager`]: ordered, case-insensitive set of [`Property`]s
//!
//! # Example
//!
//! ```rust
//! use alg_property::{BoundedValidator, Direction, Property, PropertyManager};
//!
//! let mut pm = PropertyManager::new();
//! pm.declare(
//!     Property::new("Factor", 1.0, Direction::Input)
//!         .with_validator(BoundedValidator::at_least(0.0)),
//! )
//! .unwrap();
//!
//! pm.set_property_value("Factor", "-1").unwrap();
//! assert_eq!(pm.validate_properties().len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod composite;
mod error;
mod manager;
mod property;
mod validator;
mod value;

pub use composite::{CompositeRelation, CompositeValidator};
pub use error::PropertyError;
pub use manager::PropertyManager;
pub use property::{Direction, Property};
pub use validator::{
    ArrayLengthValidator, BoundedValidator, HistogramValidator, ListValidator,
    MandatoryValidator, Validator, ValidatorResult,
};
pub use value::{
    FromPropertyValue, PropertyKind, PropertyValue, WorkspaceSlot, MAX_INT_LIST_LEN,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
