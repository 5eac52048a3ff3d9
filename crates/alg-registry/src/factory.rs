//! Generic name+version keyed factory
//!
//! [`DynamicFactory`] stores one creator per [`FactoryKey`] in an ordered map.
//! All versions of a name sit next to each other, so "latest" is the last
//! entry in the name's key range.

use crate::error::RegistryError;
use crate::key::{FactoryKey, VersionRequest};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Closure producing a fresh boxed instance
pub type Creator<T> = Arc<dyn Fn() -> Box<T> + Send + Sync>;

/// Identity of the module that registered a set of creators
///
/// Every entry keeps an `Arc` to its module, so module information is
/// released only after the last entry referencing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    name: String,
}

impl ModuleInfo {
    /// Create shared module info
    #[must_use]
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { name: name.into() })
    }

    /// Module used when registering without an explicit module
    #[must_use]
    pub fn builtin() -> Arc<Self> {
        Self::new("builtin")
    }

    /// Module name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One registered creator
struct Entry<T: ?Sized> {
    creator: Creator<T>,
    module: Arc<ModuleInfo>,
}

impl<T: ?Sized> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            creator: Arc::clone(&self.creator),
            module: Arc::clone(&self.module),
        }
    }
}

/// Name+version keyed registry of creators
///
/// `T` is usually a trait object (`dyn Algorithm`, `dyn Workspace`).
pub struct DynamicFactory<T: ?Sized> {
    kind: &'static str,
    entries: BTreeMap<FactoryKey, Entry<T>>,
}

impl<T: ?Sized> Clone for DynamicFactory<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            entries: self.entries.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for DynamicFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicFactory")
            .field("kind", &self.kind)
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: ?Sized> DynamicFactory<T> {
    /// Create an empty factory; `kind` names the product in errors and logs
    #[inline]
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
        }
    }

    /// Product kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Register `creator` under `(name, 1)`
    ///
    /// # Errors
    /// See [`subscribe_key`](Self::subscribe_key)
    pub fn subscribe<F>(&mut self, name: &str, creator: F) -> Result<FactoryKey, RegistryError>
    where
        F: Fn() -> Box<T> + Send + Sync + 'static,
    {
        self.subscribe_versioned(name, 1, creator)
    }

    /// Register `creator` under `(name, version)`
    ///
    /// # Errors
    /// See [`subscribe_key`](Self::subscribe_key)
    pub fn subscribe_versioned<F>(
        &mut self,
        name: &str,
        version: u32,
        creator: F,
    ) -> Result<FactoryKey, RegistryError>
    where
        F: Fn() -> Box<T> + Send + Sync + 'static,
    {
        let key = FactoryKey::new(name, version)?;
        self.subscribe_key(key.clone(), Arc::new(creator), &ModuleInfo::builtin())?;
        Ok(key)
    }

    /// Register a creator under an explicit key on behalf of `module`
    ///
    /// # Errors
    /// - `RegistryError::AlreadyRegistered` if the exact key is taken
    pub fn subscribe_key(
        &mut self,
        key: FactoryKey,
        creator: Creator<T>,
        module: &Arc<ModuleInfo>,
    ) -> Result<(), RegistryError> {
        if self.entries.contains_key(&key) {
            return Err(RegistryError::AlreadyRegistered {
                kind: self.kind,
                key,
            });
        }
        tracing::debug!(kind = self.kind, key = %key, module = module.name(), "subscribed");
        self.entries.insert(
            key,
            Entry {
                creator,
                module: Arc::clone(module),
            },
        );
        Ok(())
    }

    /// Remove one registration
    ///
    /// # Errors
    /// - `RegistryError::NotFound` / `VersionNotFound` if absent
    pub fn unsubscribe(&mut self, name: &str, version: u32) -> Result<(), RegistryError> {
        let key = self.resolve(name, VersionRequest::Exact(version))?;
        self.entries.remove(&key);
        tracing::debug!(kind = self.kind, key = %key, "unsubscribed");
        Ok(())
    }

    /// Create an instance for `name` at the requested version
    ///
    /// # Errors
    /// - `RegistryError::NotFound` if `name` was never registered
    /// - `RegistryError::VersionNotFound` if `name` is known but the exact
    ///   version is not
    pub fn create(
        &self,
        name: &str,
        version: impl Into<VersionRequest>,
    ) -> Result<Box<T>, RegistryError> {
        let key = self.resolve(name, version.into())?;
        Ok((self.entries[&key].creator)())
    }

    /// Resolve a request to the exact registered key
    ///
    /// # Errors
    /// Same as [`create`](Self::create)
    pub fn resolve(
        &self,
        name: &str,
        version: VersionRequest,
    ) -> Result<FactoryKey, RegistryError> {
        let mut range = self
            .entries
            .range(FactoryKey::lower_bound(name)..=FactoryKey::upper_bound(name));

        match version {
            VersionRequest::Latest => range.next_back().map(|(key, _)| key.clone()).ok_or_else(
                || RegistryError::NotFound {
                    kind: self.kind,
                    name: name.to_string(),
                },
            ),
            VersionRequest::Exact(requested) => {
                let available: Vec<u32> = range.map(|(key, _)| key.version()).collect();
                if available.is_empty() {
                    return Err(RegistryError::NotFound {
                        kind: self.kind,
                        name: name.to_string(),
                    });
                }
                if !available.contains(&requested) {
                    return Err(RegistryError::VersionNotFound {
                        kind: self.kind,
                        name: name.to_string(),
                        requested,
                        available,
                    });
                }
                FactoryKey::new(name, requested)
            }
        }
    }

    /// Creator registered under an exact key
    #[must_use]
    pub fn creator(&self, key: &FactoryKey) -> Option<Creator<T>> {
        self.entries.get(key).map(|e| Arc::clone(&e.creator))
    }

    /// Module that registered `key`
    #[must_use]
    pub fn module_of(&self, key: &FactoryKey) -> Option<Arc<ModuleInfo>> {
        self.entries.get(key).map(|e| Arc::clone(&e.module))
    }

    /// Whether any version of `name` is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.highest_version(name).is_some()
    }

    /// Whether the exact key is registered
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &FactoryKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Registered versions of `name`, ascending
    #[must_use]
    pub fn versions(&self, name: &str) -> Vec<u32> {
        self.entries
            .range(FactoryKey::lower_bound(name)..=FactoryKey::upper_bound(name))
            .map(|(key, _)| key.version())
            .collect()
    }

    /// Highest registered version of `name`
    #[must_use]
    pub fn highest_version(&self, name: &str) -> Option<u32> {
        self.entries
            .range(FactoryKey::lower_bound(name)..=FactoryKey::upper_bound(name))
            .next_back()
            .map(|(key, _)| key.version())
    }

    /// All registered keys, ordered by (name, version)
    #[must_use]
    pub fn descriptors(&self) -> Vec<FactoryKey> {
        self.entries.keys().cloned().collect()
    }

    /// Distinct registered names, ordered
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(FactoryKey::name).collect();
        names.dedup();
        names
    }

    /// Number of registered keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
