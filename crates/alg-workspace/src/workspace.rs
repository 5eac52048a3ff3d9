//! Workspace trait, concrete workspace types and shared handles

use crate::error::WorkspaceError;
use crate::histogram::Histogram;
use crate::metadata::WorkspaceMetadata;
use crate::shape::WorkspaceShape;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A matrix of spectra plus metadata
///
/// Instances are produced by the workspace factory, which calls
/// [`initialize`](Workspace::initialize) once with a validated shape.
pub trait Workspace: Send + Sync + fmt::Debug {
    /// Registered type name
    fn id(&self) -> &'static str;

    /// Allocate zero-filled buffers for `shape`
    ///
    /// # Errors
    /// `WorkspaceError::InvalidArgument` if the type cannot take this shape
    fn initialize(&mut self, shape: WorkspaceShape) -> Result<(), WorkspaceError>;

    /// Current dimensions
    fn shape(&self) -> WorkspaceShape;

    /// All spectra
    fn histograms(&self) -> &[Histogram];

    /// All spectra, mutable
    fn histograms_mut(&mut self) -> &mut [Histogram];

    /// Metadata
    fn metadata(&self) -> &WorkspaceMetadata;

    /// Metadata, mutable
    fn metadata_mut(&mut self) -> &mut WorkspaceMetadata;

    /// Deep copy, data included
    fn clone_workspace(&self) -> Box<dyn Workspace>;

    /// Concrete-type access
    fn as_any(&self) -> &dyn Any;

    /// Number of spectra
    fn histogram_count(&self) -> usize {
        self.histograms().len()
    }

    /// One spectrum
    ///
    /// # Errors
    /// `WorkspaceError::IndexOutOfRange`
    fn histogram(&self, index: usize) -> Result<&Histogram, WorkspaceError> {
        let count = self.histogram_count();
        self.histograms()
            .get(index)
            .ok_or(WorkspaceError::IndexOutOfRange { index, count })
    }

    /// One spectrum, mutable
    ///
    /// # Errors
    /// `WorkspaceError::IndexOutOfRange`
    fn histogram_mut(&mut self, index: usize) -> Result<&mut Histogram, WorkspaceError> {
        let count = self.histogram_count();
        self.histograms_mut()
            .get_mut(index)
            .ok_or(WorkspaceError::IndexOutOfRange { index, count })
    }

    /// Approximate heap size of the data buffers in bytes
    fn memory_size(&self) -> usize {
        self.histograms().iter().map(Histogram::memory_size).sum()
    }
}

/// Histogram-capable two-dimensional workspace
#[derive(Debug, Clone, Default)]
pub struct Workspace2D {
    shape: Option<WorkspaceShape>,
    histograms: Vec<Histogram>,
    metadata: WorkspaceMetadata,
}

impl Workspace2D {
    /// Registered type name
    pub const TYPE_ID: &'static str = "Workspace2D";

    /// Initialized workspace of the given shape
    ///
    /// # Errors
    /// `WorkspaceError::InvalidArgument` for an invalid shape
    pub fn with_shape(shape: WorkspaceShape) -> Result<Self, WorkspaceError> {
        let mut ws = Self::default();
        ws.initialize(shape)?;
        Ok(ws)
    }
}

impl Workspace for Workspace2D {
    fn id(&self) -> &'static str {
        Self::TYPE_ID
    }

    fn initialize(&mut self, shape: WorkspaceShape) -> Result<(), WorkspaceError> {
        shape.validate()?;
        self.histograms = (0..shape.histogram_count)
            .map(|i| {
                let mut h = Histogram::zeroed(shape.x_length, shape.y_length);
                let number = i32::try_from(i + 1).unwrap_or(i32::MAX);
                h.set_spectrum_number(number);
                h.add_detector_id(number.unsigned_abs());
                h
            })
            .collect();
        self.shape = Some(shape);
        Ok(())
    }

    fn shape(&self) -> WorkspaceShape {
        self.shape.unwrap_or(WorkspaceShape::EMPTY)
    }

    fn histograms(&self) -> &[Histogram] {
        &self.histograms
    }

    fn histograms_mut(&mut self) -> &mut [Histogram] {
        &mut self.histograms
    }

    fn metadata(&self) -> &WorkspaceMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut WorkspaceMetadata {
        &mut self.metadata
    }

    fn clone_workspace(&self) -> Box<dyn Workspace> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Workspace holding exactly one value and its error
#[derive(Debug, Clone)]
pub struct WorkspaceSingleValue {
    histograms: Vec<Histogram>,
    metadata: WorkspaceMetadata,
}

impl WorkspaceSingleValue {
    /// Registered type name
    pub const TYPE_ID: &'static str = "WorkspaceSingleValue";

    /// Single value with error
    #[must_use]
    pub fn new(value: f64, error: f64) -> Self {
        let mut ws = Self::default();
        let h = &mut ws.histograms[0];
        h.y_mut()[0] = value;
        h.e_mut()[0] = error;
        ws
    }

    /// The value
    #[must_use]
    pub fn value(&self) -> f64 {
        self.histograms[0].y()[0]
    }

    /// The error
    #[must_use]
    pub fn error(&self) -> f64 {
        self.histograms[0].e()[0]
    }
}

impl Default for WorkspaceSingleValue {
    fn default() -> Self {
        Self {
            histograms: vec![Histogram::zeroed(1, 1)],
            metadata: WorkspaceMetadata::default(),
        }
    }
}

impl Workspace for WorkspaceSingleValue {
    fn id(&self) -> &'static str {
        Self::TYPE_ID
    }

    fn initialize(&mut self, shape: WorkspaceShape) -> Result<(), WorkspaceError> {
        if shape != WorkspaceShape::SINGLE {
            return Err(WorkspaceError::invalid(format!(
                "{} only supports shape {}, got {shape}",
                Self::TYPE_ID,
                WorkspaceShape::SINGLE
            )));
        }
        self.histograms = vec![Histogram::zeroed(1, 1)];
        Ok(())
    }

    fn shape(&self) -> WorkspaceShape {
        WorkspaceShape::SINGLE
    }

    fn histograms(&self) -> &[Histogram] {
        &self.histograms
    }

    fn histograms_mut(&mut self) -> &mut [Histogram] {
        &mut self.histograms
    }

    fn metadata(&self) -> &WorkspaceMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut WorkspaceMetadata {
        &mut self.metadata
    }

    fn clone_workspace(&self) -> Box<dyn Workspace> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Shared handle to a workspace
///
/// Many holders may keep the same workspace alive; mutation goes through an
/// exclusive write lock. Equality is identity.
#[derive(Clone)]
pub struct WorkspaceHandle(Arc<RwLock<Box<dyn Workspace>>>);

impl WorkspaceHandle {
    /// Wrap a workspace
    #[must_use]
    pub fn new(workspace: Box<dyn Workspace>) -> Self {
        Self(Arc::new(RwLock::new(workspace)))
    }

    /// Shared read access
    pub fn read(&self) -> RwLockReadGuard<'_, Box<dyn Workspace>> {
        self.0.read()
    }

    /// Exclusive write access
    pub fn write(&self) -> RwLockWriteGuard<'_, Box<dyn Workspace>> {
        self.0.write()
    }

    /// Registered type name of the held workspace
    #[must_use]
    pub fn workspace_type(&self) -> &'static str {
        self.read().id()
    }

    /// Dimensions of the held workspace
    #[must_use]
    pub fn shape(&self) -> WorkspaceShape {
        self.read().shape()
    }

    /// Whether both handles point at the same workspace
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// New handle to an independent deep copy
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        Self::new(self.read().clone_workspace())
    }

    /// Number of live handles to this workspace
    #[must_use]
    pub fn holder_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl From<Box<dyn Workspace>> for WorkspaceHandle {
    fn from(workspace: Box<dyn Workspace>) -> Self {
        Self::new(workspace)
    }
}

impl PartialEq for WorkspaceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for WorkspaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_read() {
            Some(ws) => write!(f, "WorkspaceHandle({}, {})", ws.id(), ws.shape()),
            None => write!(f, "WorkspaceHandle(<locked>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace2d_initialize_assigns_spectrum_numbers() {
        let ws = Workspace2D::with_shape(WorkspaceShape::histogram(3, 4).unwrap()).unwrap();
        assert_eq!(ws.histogram_count(), 3);
        assert_eq!(ws.histogram(2).unwrap().spectrum_number(), 3);
        assert_eq!(ws.histogram(0).unwrap().detector_ids(), &[1]);
        assert_eq!(ws.shape().y_length, 4);
    }

    #[test]
    fn histogram_index_out_of_range() {
        let ws = Workspace2D::with_shape(WorkspaceShape::histogram(1, 1).unwrap()).unwrap();
        assert_eq!(
            ws.histogram(5).unwrap_err(),
            WorkspaceError::IndexOutOfRange { index: 5, count: 1 }
        );
    }

    #[test]
    fn uninitialized_workspace2d_has_empty_shape() {
        assert_eq!(Workspace2D::default().shape(), WorkspaceShape::EMPTY);
    }

    #[test]
    fn single_value_rejects_other_shapes() {
        let mut ws = WorkspaceSingleValue::default();
        assert!(ws.initialize(WorkspaceShape::histogram(2, 2).unwrap()).is_err());
        assert!(ws.initialize(WorkspaceShape::SINGLE).is_ok());
    }

    #[test]
    fn single_value_accessors() {
        let ws = WorkspaceSingleValue::new(2.5, 0.5);
        assert!((ws.value() - 2.5).abs() < f64::EPSILON);
        assert!((ws.error() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn handle_equality_is_identity() {
        let a = WorkspaceHandle::new(Box::new(WorkspaceSingleValue::new(1.0, 0.0)));
        let b = a.clone();
        let c = a.deep_clone();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.holder_count(), 2);
    }

    #[test]
    fn deep_clone_is_independent() {
        let a = WorkspaceHandle::new(Box::new(WorkspaceSingleValue::new(1.0, 0.0)));
        let c = a.deep_clone();
        c.write().histogram_mut(0).unwrap().y_mut()[0] = 9.0;
        assert!((a.read().histogram(0).unwrap().y()[0] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn downcast_through_as_any() {
        let handle = WorkspaceHandle::new(Box::new(WorkspaceSingleValue::new(3.0, 0.0)));
        let guard = handle.read();
        let single = guard
            .as_any()
            .downcast_ref::<WorkspaceSingleValue>()
            .unwrap();
        assert!((single.value() - 3.0).abs() < f64::EPSILON);
    }
}
