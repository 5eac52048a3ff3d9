//! The framework object
//!
//! [`Framework`] owns the configuration, the frozen registry, the analysis
//! data service and the worker pool. There are no global singletons: every
//! algorithm run reaches these through the [`Services`] it was created with.

use crate::algorithms::BuiltinAlgorithms;
use crate::config::FrameworkConfig;
use crate::error::{AlgorithmError, FrameworkError};
use crate::observer::AlgorithmObserver;
use crate::parallel::ParallelExecutor;
use crate::registry::{BuiltinWorkspaces, Registry, RegistrationModule};
use crate::runner::{AlgorithmRunner, Services};
use alg_workspace::AnalysisDataService;
use std::fmt;
use std::sync::Arc;

/// Collects configuration, modules and observers
pub struct FrameworkBuilder {
    config: FrameworkConfig,
    modules: Vec<Box<dyn RegistrationModule>>,
    observers: Vec<Arc<dyn AlgorithmObserver>>,
    builtin_algorithms: bool,
}

impl fmt::Debug for FrameworkBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameworkBuilder")
            .field("config", &self.config)
            .field(
                "modules",
                &self.modules.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("observers", &self.observers.len())
            .field("builtin_algorithms", &self.builtin_algorithms)
            .finish()
    }
}

impl Default for FrameworkBuilder {
    fn default() -> Self {
        Self {
            config: FrameworkConfig::default(),
            modules: Vec::new(),
            observers: Vec::new(),
            builtin_algorithms: true,
        }
    }
}

impl FrameworkBuilder {
    /// Use this configuration
    #[must_use]
    pub fn config(mut self, config: FrameworkConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a registration module, run after the built-in ones
    #[must_use]
    pub fn module(mut self, module: impl RegistrationModule + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    /// Add an observer of every top-level run
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn AlgorithmObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Skip the built-in algorithms; built-in workspace types stay
    #[must_use]
    pub fn without_builtin_algorithms(mut self) -> Self {
        self.builtin_algorithms = false;
        self
    }

    /// Start the pool and freeze the registry
    ///
    /// # Errors
    /// - `FrameworkError::InvalidConfig` for inconsistent configuration
    /// - `FrameworkError::ThreadPool` if the pool cannot start
    /// - registration errors from any module
    pub fn build(self) -> Result<Framework, FrameworkError> {
        self.config.validate()?;
        let parallel = ParallelExecutor::from_config(&self.config.parallel)?;

        let mut registry = Registry::builder();
        registry.register_module(&BuiltinWorkspaces)?;
        if self.builtin_algorithms {
            registry.register_module(&BuiltinAlgorithms)?;
        }
        for module in &self.modules {
            registry.register_module(module.as_ref())?;
        }
        let registry = Arc::new(registry.build());

        let config = Arc::new(self.config);
        let mut services = Services::new(
            registry,
            Arc::new(AnalysisDataService::new()),
            parallel,
            Arc::clone(&config),
        );
        for observer in self.observers {
            services = services.with_observer(observer);
        }
        tracing::info!(
            threads = services.parallel.threads(),
            algorithms = services.registry.algorithms().len(),
            "framework started"
        );
        Ok(Framework { config, services })
    }
}

/// Application object: registry, data service and worker pool
#[derive(Debug)]
pub struct Framework {
    config: Arc<FrameworkConfig>,
    services: Services,
}

impl Framework {
    /// Start configuring
    #[inline]
    #[must_use]
    pub fn builder() -> FrameworkBuilder {
        FrameworkBuilder::default()
    }

    /// Framework with default configuration and the built-ins
    ///
    /// # Errors
    /// `FrameworkError::ThreadPool` if the pool cannot start
    pub fn new() -> Result<Self, FrameworkError> {
        Self::builder().build()
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    /// Frozen registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.services.registry
    }

    /// Analysis data service
    #[inline]
    #[must_use]
    pub fn data_service(&self) -> &Arc<AnalysisDataService> {
        &self.services.data_service
    }

    /// Loop executor
    #[inline]
    #[must_use]
    pub fn parallel(&self) -> &ParallelExecutor {
        &self.services.parallel
    }

    /// Services handed to runners
    #[inline]
    #[must_use]
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Initialized runner for `name`
    ///
    /// Without an explicit version the configured version policy decides.
    ///
    /// # Errors
    /// - `AlgorithmError::Registry` for an unknown name or version
    /// - `AlgorithmError::Property` if the algorithm's declarations fail
    pub fn create_algorithm(
        &self,
        name: &str,
        version: Option<u32>,
    ) -> Result<AlgorithmRunner, AlgorithmError> {
        let algorithms = self.registry().algorithms();
        let request = self
            .config
            .algorithms
            .default_version_policy
            .request(version, &algorithms.versions(name));
        let algorithm = algorithms.create(name, request)?;
        let mut runner = AlgorithmRunner::new(algorithm, self.services.clone());
        runner.initialize()?;
        Ok(runner)
    }

    /// Create, set string-form properties and execute
    ///
    /// # Errors
    /// Any creation, property or execution error
    pub fn run<'a>(
        &self,
        name: &str,
        version: Option<u32>,
        properties: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<AlgorithmRunner, AlgorithmError> {
        let mut runner = self.create_algorithm(name, version)?;
        for (key, value) in properties {
            runner.set_property_value(key, value)?;
        }
        runner.execute()?;
        Ok(runner)
    }

    /// Tear down: data service cleared, then registry, then worker pool
    ///
    /// Runners still alive keep their own references; this releases the
    /// framework's.
    pub fn shutdown(self) {
        let Framework { config, services } = self;
        let Services {
            registry,
            data_service,
            parallel,
            observers,
            config: _,
        } = services;

        let workspaces = data_service.len();
        data_service.clear();
        drop(data_service);
        drop(registry);
        drop(observers);
        let threads = parallel.threads();
        drop(parallel);
        drop(config);
        tracing::info!(workspaces, threads, "framework shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VersionPolicy;
    use alg_registry::RegistryError;

    fn sequential() -> FrameworkConfig {
        FrameworkConfig::default().with_parallel(false)
    }

    #[test]
    fn builtins_registered() {
        let framework = Framework::builder().config(sequential()).build().unwrap();
        let registry = framework.registry();
        assert_eq!(registry.modules(), vec!["builtin-workspaces", "builtin-algorithms"]);
        assert_eq!(registry.algorithms().versions("Integration"), vec![1, 2]);
        assert!(!framework.parallel().is_parallel());
    }

    #[test]
    fn without_builtin_algorithms_keeps_workspace_types() {
        let framework = Framework::builder()
            .config(sequential())
            .without_builtin_algorithms()
            .build()
            .unwrap();
        assert!(framework.registry().algorithms().is_empty());
        assert!(framework.registry().workspaces().contains("Workspace2D"));
    }

    #[test]
    fn version_policy_applies_without_explicit_version() {
        let latest = Framework::builder().config(sequential()).build().unwrap();
        assert_eq!(latest.create_algorithm("Integration", None).unwrap().version(), 2);
        assert_eq!(latest.create_algorithm("Integration", Some(1)).unwrap().version(), 1);

        let oldest = Framework::builder()
            .config(sequential().with_version_policy(VersionPolicy::Oldest))
            .build()
            .unwrap();
        assert_eq!(oldest.create_algorithm("Integration", None).unwrap().version(), 1);
    }

    #[test]
    fn unknown_algorithm_and_version_are_distinct() {
        let framework = Framework::builder().config(sequential()).build().unwrap();
        assert!(matches!(
            framework.create_algorithm("Unknown", None),
            Err(AlgorithmError::Registry(RegistryError::NotFound { .. }))
        ));
        assert!(matches!(
            framework.create_algorithm("Integration", Some(9)),
            Err(AlgorithmError::Registry(RegistryError::VersionNotFound { .. }))
        ));
    }

    #[test]
    fn invalid_config_rejected() {
        let result = Framework::builder()
            .config(FrameworkConfig::default().with_threads(0))
            .build();
        assert!(matches!(result, Err(FrameworkError::InvalidConfig(_))));
    }

    #[test]
    fn shutdown_clears_data_service() {
        let framework = Framework::builder().config(sequential()).build().unwrap();
        framework
            .run(
                "CreateSingleValuedWorkspace",
                None,
                [("DataValue", "2.5"), ("OutputWorkspace", "value")],
            )
            .unwrap();
        let ads = Arc::clone(framework.data_service());
        assert_eq!(ads.len(), 1);
        framework.shutdown();
        assert!(ads.is_empty());
    }
}
