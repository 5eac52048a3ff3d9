//! Registration modules and the frozen registry
//!
//! Plugins register algorithms and workspace types by implementing
//! [`RegistrationModule`]. A [`RegistryBuilder`] collects modules at startup
//! and [`RegistryBuilder::build`] freezes the result into a [`Registry`]
//! that is never mutated afterwards.

use crate::algorithm::Algorithm;
use crate::error::FrameworkError;
use crate::factory::AlgorithmFactory;
use alg_registry::{Creator, FactoryKey, ModuleInfo};
use alg_workspace::{Workspace, Workspace2D, WorkspaceFactory, WorkspaceSingleValue};
use std::fmt;
use std::sync::Arc;

/// A named group of registrations
pub trait RegistrationModule: Send + Sync {
    /// Module name, unique per registry
    fn name(&self) -> &str;

    /// Add this module's algorithms and workspace types
    ///
    /// # Errors
    /// Registration conflicts
    fn register(&self, builder: &mut RegistryBuilder) -> Result<(), FrameworkError>;
}

/// Module defined by a closure
pub struct FnModule<F> {
    name: String,
    register: F,
}

impl<F> FnModule<F>
where
    F: Fn(&mut RegistryBuilder) -> Result<(), FrameworkError> + Send + Sync,
{
    /// Module named `name` running `register`
    pub fn new(name: impl Into<String>, register: F) -> Self {
        Self {
            name: name.into(),
            register,
        }
    }
}

impl<F> fmt::Debug for FnModule<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnModule").field("name", &self.name).finish()
    }
}

impl<F> RegistrationModule for FnModule<F>
where
    F: Fn(&mut RegistryBuilder) -> Result<(), FrameworkError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn register(&self, builder: &mut RegistryBuilder) -> Result<(), FrameworkError> {
        (self.register)(builder)
    }
}

/// The built-in workspace types
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinWorkspaces;

impl RegistrationModule for BuiltinWorkspaces {
    fn name(&self) -> &str {
        "builtin-workspaces"
    }

    fn register(&self, builder: &mut RegistryBuilder) -> Result<(), FrameworkError> {
        builder.register_workspace_type::<Workspace2D>()?;
        builder.register_workspace_type::<WorkspaceSingleValue>()?;
        Ok(())
    }
}

/// Mutable registration phase
#[derive(Debug)]
pub struct RegistryBuilder {
    algorithms: AlgorithmFactory,
    workspaces: WorkspaceFactory,
    modules: Vec<Arc<ModuleInfo>>,
    current: Arc<ModuleInfo>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    /// Empty builder; direct registrations are attributed to "application"
    #[must_use]
    pub fn new() -> Self {
        Self {
            algorithms: AlgorithmFactory::new(),
            workspaces: WorkspaceFactory::new(),
            modules: Vec::new(),
            current: ModuleInfo::new("application"),
        }
    }

    /// Run a module's registrations under its own name
    ///
    /// # Errors
    /// - `FrameworkError::DuplicateModule` if the name was already used
    /// - whatever the module's registrations return
    pub fn register_module(
        &mut self,
        module: &dyn RegistrationModule,
    ) -> Result<&mut Self, FrameworkError> {
        if self.modules.iter().any(|m| m.name() == module.name()) {
            return Err(FrameworkError::DuplicateModule(module.name().to_string()));
        }
        let info = ModuleInfo::new(module.name());
        let previous = std::mem::replace(&mut self.current, Arc::clone(&info));
        let result = module.register(self);
        self.current = previous;
        result?;
        self.modules.push(info);
        tracing::debug!(module = module.name(), "registered module");
        Ok(self)
    }

    /// Register an algorithm type
    ///
    /// # Errors
    /// `FrameworkError::Registry` on a name+version clash
    pub fn register_algorithm<A>(&mut self) -> Result<FactoryKey, FrameworkError>
    where
        A: Algorithm + Default + 'static,
    {
        Ok(self.algorithms.subscribe::<A>(&self.current)?)
    }

    /// Register an algorithm creator
    ///
    /// # Errors
    /// `FrameworkError::Registry` on a name+version clash
    pub fn register_algorithm_with(
        &mut self,
        creator: Creator<dyn Algorithm>,
    ) -> Result<FactoryKey, FrameworkError> {
        Ok(self.algorithms.subscribe_with(creator, &self.current)?)
    }

    /// Register a workspace type
    ///
    /// # Errors
    /// `FrameworkError::Workspace` on a name clash
    pub fn register_workspace_type<W>(&mut self) -> Result<(), FrameworkError>
    where
        W: Workspace + Default + 'static,
    {
        self.workspaces.subscribe::<W>(&self.current)?;
        Ok(())
    }

    /// Algorithms registered so far
    #[inline]
    #[must_use]
    pub fn algorithms(&self) -> &AlgorithmFactory {
        &self.algorithms
    }

    /// Freeze
    #[must_use]
    pub fn build(self) -> Registry {
        tracing::info!(
            algorithms = self.algorithms.len(),
            workspace_types = self.workspaces.type_names().len(),
            modules = self.modules.len(),
            "registry frozen"
        );
        Registry {
            algorithms: self.algorithms,
            workspaces: self.workspaces,
            modules: self.modules,
        }
    }
}

/// Immutable algorithm and workspace-type registry
#[derive(Debug)]
pub struct Registry {
    algorithms: AlgorithmFactory,
    workspaces: WorkspaceFactory,
    modules: Vec<Arc<ModuleInfo>>,
}

impl Registry {
    /// Start a registration phase
    #[inline]
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Algorithm factory
    #[inline]
    #[must_use]
    pub fn algorithms(&self) -> &AlgorithmFactory {
        &self.algorithms
    }

    /// Workspace factory
    #[inline]
    #[must_use]
    pub fn workspaces(&self) -> &WorkspaceFactory {
        &self.workspaces
    }

    /// Names of the registered modules, in registration order
    #[must_use]
    pub fn modules(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlgorithmError;
    use crate::runner::ExecutionContext;
    use alg_property::{PropertyError, PropertyManager};
    use alg_registry::RegistryError;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default)]
    struct Noop;

    impl Algorithm for Noop {
        fn name(&self) -> &'static str {
            "Noop"
        }
        fn init(&mut self, _: &mut PropertyManager) -> Result<(), PropertyError> {
            Ok(())
        }
        fn exec(&mut self, _: &mut ExecutionContext<'_>) -> Result<(), AlgorithmError> {
            Ok(())
        }
    }

    fn noop_module() -> FnModule<impl Fn(&mut RegistryBuilder) -> Result<(), FrameworkError> + Send + Sync> {
        FnModule::new("noop", |builder: &mut RegistryBuilder| {
            builder.register_algorithm::<Noop>()?;
            Ok(())
        })
    }

    #[test]
    fn modules_register_under_their_own_name() {
        let mut builder = Registry::builder();
        builder.register_module(&BuiltinWorkspaces).unwrap();
        builder.register_module(&noop_module()).unwrap();
        let registry = builder.build();

        assert_eq!(registry.modules(), vec!["builtin-workspaces", "noop"]);
        assert_eq!(registry.algorithms().descriptors()[0].module, "noop");
        assert!(registry.workspaces().contains("Workspace2D"));
        assert!(registry.workspaces().contains("WorkspaceSingleValue"));
    }

    #[test]
    fn duplicate_module_rejected() {
        let mut builder = Registry::builder();
        builder.register_module(&BuiltinWorkspaces).unwrap();
        assert!(matches!(
            builder.register_module(&BuiltinWorkspaces),
            Err(FrameworkError::DuplicateModule(name)) if name == "builtin-workspaces"
        ));
    }

    #[test]
    fn clashing_algorithm_fails_the_module() {
        let mut builder = Registry::builder();
        builder.register_algorithm::<Noop>().unwrap();
        assert!(matches!(
            builder.register_module(&noop_module()),
            Err(FrameworkError::Registry(RegistryError::AlreadyRegistered { .. }))
        ));
        assert_eq!(builder.algorithms().descriptors()[0].module, "application");
    }
}
