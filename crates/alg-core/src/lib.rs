//! ALG Core - algorithm lifecycle and framework runtime
//!
//! Ties the registry, property and workspace crates together:
//! - Algorithms declare typed properties and run against a shared data service
//! - Algorithm versions are registered per module and looked up by name
//! - Spectrum loops run on a rayon pool with cooperative cancellation
//! - One [`Framework`] object owns every shared service
//!
//! # Core Concepts
//!
//! - [`Algorithm`]: `init` declares properties, `exec` does the work
//! - [`AlgorithmRunner`]: one instance moving through [`ExecutionState`]s
//! - [`ExecutionContext`]: properties, services and child algorithms during `exec`
//! - [`RegistrationModule`]: a plugin's registrations, frozen into a [`Registry`]
//! - [`Pipeline`]: TOML list of steps run against one framework
//!
//! # Example
//!
//! ```rust
//! use alg_core::prelude::*;
//!
//! let framework = Framework::builder()
//!     .config(FrameworkConfig::default().with_parallel(false))
//!     .build()
//!     .unwrap();
//!
//! framework
//!     .run(
//!         "CreateWorkspace",
//!         None,
//!         [
//!             ("DataX", "0,1,2"),
//!             ("DataY", "3,4"),
//!             ("OutputWorkspace", "raw"),
//!         ],
//!     )
//!     .unwrap();
//! let integrated = framework
//!     .run("Integration", None, [("InputWorkspace", "raw"), ("OutputWorkspace", "sum")])
//!     .unwrap();
//!
//! let sum = integrated.workspace("OutputWorkspace").unwrap();
//! assert_eq!(sum.read().histogram(0).unwrap().y(), &[7.0]);
//! assert!(framework.data_service().contains("sum"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod algorithm;
pub mod algorithms;
pub mod config;
pub mod error;
pub mod factory;
pub mod framework;
pub mod logging;
pub mod observer;
pub mod parallel;
pub mod pipeline;
pub mod registry;
pub mod runner;

pub use algorithm::{Algorithm, ExecutionState};
pub use config::{
    AlgorithmsConfig, DataServiceConfig, FrameworkConfig, LoggingConfig, ParallelConfig,
    VersionPolicy,
};
pub use error::{
    AlgorithmError, FrameworkError, PipelineError, ValidationFailures, ValidationIssue,
};
pub use factory::{AlgorithmDescriptor, AlgorithmFactory};
pub use framework::{Framework, FrameworkBuilder};
pub use observer::{AlgorithmObserver, ObserverEvent, RecordingObserver};
pub use parallel::{CancellationToken, ParallelExecutor};
pub use pipeline::{Pipeline, Step, StepReport};
pub use registry::{BuiltinWorkspaces, FnModule, Registry, RegistryBuilder, RegistrationModule};
pub use runner::{AlgorithmRunner, ExecutionContext, Services, MISSING_OUTPUT_NAME};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for writing and running algorithms
    pub use crate::{
        Algorithm, AlgorithmError, AlgorithmRunner, ExecutionContext, Framework,
        FrameworkConfig, RegistrationModule, RegistryBuilder,
    };
    pub use alg_property::{
        BoundedValidator, Direction, MandatoryValidator, Property, PropertyError,
        PropertyManager, WorkspaceSlot,
    };
    pub use alg_registry::VersionRequest;
    pub use alg_workspace::{Workspace, WorkspaceHandle};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
