//! ALG Workspace
//!
//! Data containers created by a factory and shared by handle.
//!
//! # Core Concepts
//!
//! - [`Workspace`]: matrix of [`Histogram`]s plus [`WorkspaceMetadata`]
//! - [`Workspace2D`] / [`WorkspaceSingleValue`]: built-in workspace types
//! - [`WorkspaceFactory`]: create by type name, or from a parent workspace
//! - [`WorkspaceHandle`]: shared, lock-protected ownership
//! - [`AnalysisDataService`]: named store of live handles
//!
//! # Example
//!
//! ```rust
//! use alg_workspace::{LogValue, Workspace2D, WorkspaceFactory};
//!
//! let factory = WorkspaceFactory::with_defaults().unwrap();
//! let mut parent = factory.create(Workspace2D::TYPE_ID, 2, 11, 10).unwrap();
//! parent.metadata_mut().run.add_log("run_number", LogValue::Number(7.0), false).unwrap();
//!
//! let mut child = factory.create_from_parent(parent.as_ref()).unwrap();
//! child.metadata_mut().title = "child".into();
//! assert!(parent.metadata().title.is_empty());
//! assert!(child.metadata().run.has_log("run_number"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod data_service;
mod error;
mod factory;
mod histogram;
mod metadata;
mod shape;
mod workspace;

pub use data_service::{AnalysisDataService, WorkspaceSummary};
pub use error::WorkspaceError;
pub use factory::WorkspaceFactory;
pub use histogram::{DetectorIds, Histogram};
pub use metadata::{InstrumentRef, LogValue, Run, Sample, WorkspaceMetadata};
pub use shape::WorkspaceShape;
pub use workspace::{Workspace, Workspace2D, WorkspaceHandle, WorkspaceSingleValue};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
