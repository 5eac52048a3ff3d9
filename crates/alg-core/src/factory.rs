//! Algorithm factory
//!
//! A [`DynamicFactory`] of algorithms plus the descriptive data read from a
//! prototype at registration time.

use crate::algorithm::Algorithm;
use alg_registry::{Creator, DynamicFactory, FactoryKey, ModuleInfo, RegistryError, VersionRequest};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Listing entry for one registered algorithm version
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct AlgorithmDescriptor {
    /// Registered name
    pub name: String,
    /// Registered version
    pub version: u32,
    /// Category path
    pub category: String,
    /// One-line description
    pub summary: String,
    /// Registering module
    pub module: String,
}

/// Name+version keyed registry of algorithms
#[derive(Debug, Clone)]
pub struct AlgorithmFactory {
    creators: DynamicFactory<dyn Algorithm>,
    descriptors: BTreeMap<FactoryKey, AlgorithmDescriptor>,
}

impl Default for AlgorithmFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl AlgorithmFactory {
    /// Empty factory
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            creators: DynamicFactory::new("algorithm"),
            descriptors: BTreeMap::new(),
        }
    }

    /// Register an algorithm type under its own name and version
    ///
    /// # Errors
    /// - `RegistryError::AlreadyRegistered` if that name and version exist
    /// - `RegistryError::InvalidName` / `InvalidVersion` for a bad prototype
    pub fn subscribe<A>(&mut self, module: &Arc<ModuleInfo>) -> Result<FactoryKey, RegistryError>
    where
        A: Algorithm + Default + 'static,
    {
        self.subscribe_with(Arc::new(|| Box::new(A::default()) as Box<dyn Algorithm>), module)
    }

    /// Register a creator; name and version come from one prototype instance
    ///
    /// # Errors
    /// Same as [`subscribe`](Self::subscribe)
    pub fn subscribe_with(
        &mut self,
        creator: Creator<dyn Algorithm>,
        module: &Arc<ModuleInfo>,
    ) -> Result<FactoryKey, RegistryError> {
        let prototype = creator();
        let key = FactoryKey::new(prototype.name(), prototype.version())?;
        self.creators.subscribe_key(key.clone(), creator, module)?;
        self.descriptors.insert(
            key.clone(),
            AlgorithmDescriptor {
                name: prototype.name().to_string(),
                version: prototype.version(),
                category: prototype.category().to_string(),
                summary: prototype.summary().to_string(),
                module: module.name().to_string(),
            },
        );
        Ok(key)
    }

    /// Remove one registration
    ///
    /// # Errors
    /// `RegistryError::NotFound` / `VersionNotFound`
    pub fn unsubscribe(&mut self, name: &str, version: u32) -> Result<(), RegistryError> {
        let key = self.creators.resolve(name, VersionRequest::Exact(version))?;
        self.creators.unsubscribe(name, version)?;
        self.descriptors.remove(&key);
        Ok(())
    }

    /// Fresh, uninitialized instance
    ///
    /// # Errors
    /// - `RegistryError::NotFound` for an unknown name
    /// - `RegistryError::VersionNotFound` for a known name without that version
    pub fn create(
        &self,
        name: &str,
        version: impl Into<VersionRequest>,
    ) -> Result<Box<dyn Algorithm>, RegistryError> {
        self.creators.create(name, version)
    }

    /// Resolve a request to the registered key
    ///
    /// # Errors
    /// Same as [`create`](Self::create)
    pub fn resolve(&self, name: &str, version: VersionRequest) -> Result<FactoryKey, RegistryError> {
        self.creators.resolve(name, version)
    }

    /// Descriptor of one registered version
    ///
    /// # Errors
    /// Same as [`create`](Self::create)
    pub fn descriptor(
        &self,
        name: &str,
        version: impl Into<VersionRequest>,
    ) -> Result<&AlgorithmDescriptor, RegistryError> {
        let key = self.resolve(name, version.into())?;
        self.descriptors.get(&key).ok_or(RegistryError::NotFound {
            kind: self.creators.kind(),
            name: name.to_string(),
        })
    }

    /// Every registered version, ordered by (name, version)
    #[must_use]
    pub fn descriptors(&self) -> Vec<AlgorithmDescriptor> {
        self.descriptors.values().cloned().collect()
    }

    /// Distinct categories, ordered
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.descriptors
            .values()
            .map(|d| d.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whether any version of `name` is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.creators.contains(name)
    }

    /// Registered versions of `name`, ascending
    #[must_use]
    pub fn versions(&self, name: &str) -> Vec<u32> {
        self.creators.versions(name)
    }

    /// Highest registered version of `name`
    #[must_use]
    pub fn highest_version(&self, name: &str) -> Option<u32> {
        self.creators.highest_version(name)
    }

    /// Distinct names, ordered
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.creators.names()
    }

    /// Number of registered versions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.creators.len()
    }

    /// Whether nothing is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }
}
