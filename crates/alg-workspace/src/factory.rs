//! Workspace factory
//!
//! Creates workspaces by registered type name, or from a parent workspace
//! whose type, shape and metadata are copied onto fresh data buffers.

use crate::error::WorkspaceError;
use crate::shape::WorkspaceShape;
use crate::workspace::{Workspace, Workspace2D, WorkspaceSingleValue};
use alg_registry::{Creator, DynamicFactory, FactoryKey, ModuleInfo, VersionRequest};
use std::sync::Arc;

/// Registry of workspace types
#[derive(Debug, Clone)]
pub struct WorkspaceFactory {
    types: DynamicFactory<dyn Workspace>,
}

impl Default for WorkspaceFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkspaceFactory {
    /// Factory with no registered types
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: DynamicFactory::new("workspace"),
        }
    }

    /// Factory with the built-in types registered
    ///
    /// # Errors
    /// Registration errors from [`WorkspaceFactory::subscribe`]
    pub fn with_defaults() -> Result<Self, WorkspaceError> {
        let mut factory = Self::new();
        let module = ModuleInfo::builtin();
        factory.subscribe::<Workspace2D>(&module)?;
        factory.subscribe::<WorkspaceSingleValue>(&module)?;
        Ok(factory)
    }

    /// Register a workspace type under the name its instances report
    ///
    /// # Errors
    /// `RegistryError::AlreadyRegistered` if the name is taken
    pub fn subscribe<W>(&mut self, module: &Arc<ModuleInfo>) -> Result<(), WorkspaceError>
    where
        W: Workspace + Default + 'static,
    {
        let name = W::default().id();
        let creator: Creator<dyn Workspace> =
            Arc::new(|| Box::new(W::default()) as Box<dyn Workspace>);
        self.types
            .subscribe_key(FactoryKey::new(name, 1)?, creator, module)?;
        Ok(())
    }

    /// Whether `type_name` is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains(type_name)
    }

    /// Registered type names
    #[must_use]
    pub fn type_names(&self) -> Vec<&str> {
        self.types.names()
    }

    /// New zero-filled workspace of a registered type
    ///
    /// # Errors
    /// - `WorkspaceError::Registry` (not found) if `type_name` is unknown
    /// - `WorkspaceError::InvalidArgument` for an invalid shape
    pub fn create(
        &self,
        type_name: &str,
        histogram_count: usize,
        x_length: usize,
        y_length: usize,
    ) -> Result<Box<dyn Workspace>, WorkspaceError> {
        let shape = WorkspaceShape::new(histogram_count, x_length, y_length)?;
        self.create_with_shape(type_name, shape)
    }

    /// New zero-filled workspace of a registered type
    ///
    /// # Errors
    /// Same as [`create`](Self::create)
    pub fn create_with_shape(
        &self,
        type_name: &str,
        shape: WorkspaceShape,
    ) -> Result<Box<dyn Workspace>, WorkspaceError> {
        let mut workspace = self.types.create(type_name, VersionRequest::Latest)?;
        workspace.initialize(shape)?;
        tracing::trace!(workspace_type = type_name, %shape, "created workspace");
        Ok(workspace)
    }

    /// New workspace with the parent's type, shape and metadata
    ///
    /// Data buffers are fresh and zero-filled; spectrum numbers and detector
    /// ids are copied.
    ///
    /// # Errors
    /// `WorkspaceError::Registry` if the parent's type is not registered here
    pub fn create_from_parent(
        &self,
        parent: &dyn Workspace,
    ) -> Result<Box<dyn Workspace>, WorkspaceError> {
        let mut child = self.create_with_shape(parent.id(), parent.shape())?;
        Self::initialize_from_parent(parent, child.as_mut(), false);
        Ok(child)
    }

    /// New workspace with the parent's type and metadata but a new shape
    ///
    /// Spectrum definitions are copied only when the histogram count matches.
    ///
    /// # Errors
    /// - `WorkspaceError::Registry` if the parent's type is not registered
    /// - `WorkspaceError::InvalidArgument` for an invalid shape
    pub fn create_from_parent_with_shape(
        &self,
        parent: &dyn Workspace,
        histogram_count: usize,
        x_length: usize,
        y_length: usize,
    ) -> Result<Box<dyn Workspace>, WorkspaceError> {
        let shape = WorkspaceShape::new(histogram_count, x_length, y_length)?;
        let mut child = self.create_with_shape(parent.id(), shape)?;
        let different_size = histogram_count != parent.histogram_count();
        Self::initialize_from_parent(parent, child.as_mut(), different_size);
        Ok(child)
    }

    /// Copy metadata, and spectrum definitions unless `different_size`
    ///
    /// Metadata is deep-copied so later edits on either side stay local.
    pub fn initialize_from_parent(
        parent: &dyn Workspace,
        child: &mut dyn Workspace,
        different_size: bool,
    ) {
        *child.metadata_mut() = parent.metadata().clone();
        if different_size {
            return;
        }
        for (target, source) in child.histograms_mut().iter_mut().zip(parent.histograms()) {
            target.copy_spectrum_definition(source);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{InstrumentRef, LogValue};
    use alg_registry::RegistryError;
    use std::collections::BTreeMap;

    fn parent_workspace(factory: &WorkspaceFactory) -> Box<dyn Workspace> {
        let mut parent = factory.create(Workspace2D::TYPE_ID, 2, 4, 3).unwrap();
        parent.metadata_mut().title = "parent".into();
        parent
            .metadata_mut()
            .run
            .add_log("run_number", LogValue::Number(42.0), false)
            .unwrap();
        parent.metadata_mut().instrument = Some(InstrumentRef::new("MARI", BTreeMap::new()));
        let h = parent.histogram_mut(1).unwrap();
        h.y_mut().copy_from_slice(&[1.0, 2.0, 3.0]);
        h.set_spectrum_number(17);
        parent
    }

    #[test]
    fn create_unknown_type_is_not_found() {
        let factory = WorkspaceFactory::with_defaults().unwrap();
        let err = factory.create("EventWorkspace", 1, 2, 1).unwrap_err();
        assert!(matches!(
            err,
            WorkspaceError::Registry(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn create_rejects_zero_histograms() {
        let factory = WorkspaceFactory::with_defaults().unwrap();
        assert!(matches!(
            factory.create(Workspace2D::TYPE_ID, 0, 2, 1),
            Err(WorkspaceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn with_defaults_registers_builtin_types() {
        let factory = WorkspaceFactory::with_defaults().unwrap();
        assert_eq!(
            factory.type_names(),
            vec![Workspace2D::TYPE_ID, WorkspaceSingleValue::TYPE_ID]
        );
    }

    #[test]
    fn subscribe_twice_fails() {
        let mut factory = WorkspaceFactory::with_defaults().unwrap();
        assert!(factory
            .subscribe::<Workspace2D>(&ModuleInfo::builtin())
            .is_err());
    }

    #[test]
    fn create_from_parent_copies_shape_and_metadata_not_data() {
        let factory = WorkspaceFactory::with_defaults().unwrap();
        let parent = parent_workspace(&factory);
        let child = factory.create_from_parent(parent.as_ref()).unwrap();

        assert_eq!(child.id(), Workspace2D::TYPE_ID);
        assert_eq!(child.shape(), parent.shape());
        assert_eq!(child.metadata(), parent.metadata());
        assert_eq!(child.histogram(1).unwrap().spectrum_number(), 17);
        assert_eq!(child.histogram(1).unwrap().y(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn child_metadata_changes_do_not_reach_parent() {
        let factory = WorkspaceFactory::with_defaults().unwrap();
        let mut parent = parent_workspace(&factory);
        let mut child = factory.create_from_parent(parent.as_ref()).unwrap();

        child.metadata_mut().title = "child".into();
        child
            .metadata_mut()
            .run
            .add_log("extra", LogValue::String("x".into()), false)
            .unwrap();
        assert_eq!(parent.metadata().title, "parent");
        assert!(!parent.metadata().run.has_log("extra"));

        parent.metadata_mut().sample.name = "vanadium".into();
        assert!(child.metadata().sample.name.is_empty());
    }

    #[test]
    fn create_from_parent_keeps_single_value_type() {
        let factory = WorkspaceFactory::with_defaults().unwrap();
        let parent = WorkspaceSingleValue::new(3.0, 1.0);
        let child = factory.create_from_parent(&parent).unwrap();
        assert_eq!(child.id(), WorkspaceSingleValue::TYPE_ID);
        assert!(child.histogram(0).unwrap().y()[0].abs() < f64::EPSILON);
    }

    #[test]
    fn create_from_parent_with_new_shape() {
        let factory = WorkspaceFactory::with_defaults().unwrap();
        let parent = parent_workspace(&factory);

        let same_count = factory
            .create_from_parent_with_shape(parent.as_ref(), 2, 2, 1)
            .unwrap();
        assert_eq!(same_count.histogram(1).unwrap().spectrum_number(), 17);
        assert_eq!(same_count.metadata().title, "parent");

        let other_count = factory
            .create_from_parent_with_shape(parent.as_ref(), 1, 2, 1)
            .unwrap();
        assert_eq!(other_count.histogram(0).unwrap().spectrum_number(), 1);
        assert!(other_count.metadata().run.has_log("run_number"));
    }

    #[test]
    fn create_from_unregistered_parent_type_fails() {
        let factory = WorkspaceFactory::new();
        let parent = WorkspaceSingleValue::new(1.0, 0.0);
        assert!(factory.create_from_parent(&parent).is_err());
    }
}
