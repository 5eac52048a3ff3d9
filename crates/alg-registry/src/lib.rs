//! ALG Registry
//!
//! Name+version keyed registry of object creators.
//!
//! # Core Concepts
//!
//! - [`DynamicFactory`]: ordered map from [`FactoryKey`] to a creator closure
//! - [`FactoryKey`]: composite `(name, version)` key, version ≥ 1
//! - [`VersionRequest`]: exact version or "latest"
//! - [`ModuleInfo`]: identity of the module that registered an entry
//!
//! # Example
//!
//! ```rust
//! use alg_registry::{DynamicFactory, VersionRequest};
//!
//! let mut factory: DynamicFactory<String> = DynamicFactory::new("greeting");
//! factory.subscribe("Hello", || Box::new("hello v1".to_string())).unwrap();
//! factory
//!     .subscribe_versioned("Hello", 2, || Box::new("hello v2".to_string()))
//!     .unwrap();
//!
//! let latest = factory.create("Hello", VersionRequest::Latest).unwrap();
//! assert_eq!(*latest, "hello v2");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod factory;
mod key;

pub use error::RegistryError;
pub use factory::{Creator, DynamicFactory, ModuleInfo};
pub use key::{FactoryKey, VersionRequest};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
