//! Algorithm runs
//!
//! [`AlgorithmRunner`] owns one algorithm instance and its properties and
//! drives it through initialize, validate, execute and output storage.
//! [`ExecutionContext`] is the view `exec` gets of its properties and of the
//! framework services.

use crate::algorithm::{Algorithm, ExecutionState};
use crate::config::FrameworkConfig;
use crate::error::{AlgorithmError, ValidationFailures, ValidationIssue};
use crate::observer::AlgorithmObserver;
use crate::parallel::{CancellationToken, ParallelExecutor};
use crate::registry::Registry;
use alg_property::{Direction, FromPropertyValue, PropertyManager, PropertyValue, WorkspaceSlot};
use alg_registry::VersionRequest;
use alg_workspace::{AnalysisDataService, WorkspaceFactory, WorkspaceHandle};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use ulid::Ulid;

/// Validation message for an output workspace property without a name
pub const MISSING_OUTPUT_NAME: &str = "Enter a name for the Output workspace";

/// Framework pieces shared by every run
#[derive(Debug, Clone)]
pub struct Services {
    pub(crate) registry: Arc<Registry>,
    pub(crate) data_service: Arc<AnalysisDataService>,
    pub(crate) parallel: ParallelExecutor,
    pub(crate) observers: Vec<Arc<dyn AlgorithmObserver>>,
    pub(crate) config: Arc<FrameworkConfig>,
}

impl Services {
    /// Bundle the services, without observers
    #[must_use]
    pub fn new(
        registry: Arc<Registry>,
        data_service: Arc<AnalysisDataService>,
        parallel: ParallelExecutor,
        config: Arc<FrameworkConfig>,
    ) -> Self {
        Self {
            registry,
            data_service,
            parallel,
            observers: Vec::new(),
            config,
        }
    }

    /// Add an observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn AlgorithmObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Frozen registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Analysis data service
    #[inline]
    #[must_use]
    pub fn data_service(&self) -> &Arc<AnalysisDataService> {
        &self.data_service
    }

    /// Loop executor
    #[inline]
    #[must_use]
    pub fn parallel(&self) -> &ParallelExecutor {
        &self.parallel
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    /// Copy for a child run: children report through their parent only
    fn for_child(&self) -> Self {
        Self {
            observers: Vec::new(),
            ..self.clone()
        }
    }
}

/// One algorithm instance with its properties and run state
#[derive(Debug)]
pub struct AlgorithmRunner {
    algorithm: Box<dyn Algorithm>,
    properties: PropertyManager,
    state: ExecutionState,
    services: Services,
    token: CancellationToken,
    child: bool,
    id: Ulid,
}

impl AlgorithmRunner {
    /// Top-level runner; call [`initialize`](Self::initialize) before use
    #[must_use]
    pub fn new(algorithm: Box<dyn Algorithm>, services: Services) -> Self {
        Self {
            algorithm,
            properties: PropertyManager::new(),
            state: ExecutionState::Uninitialized,
            services,
            token: CancellationToken::new(),
            child: false,
            id: Ulid::new(),
        }
    }

    fn new_child(algorithm: Box<dyn Algorithm>, services: Services, token: CancellationToken) -> Self {
        Self {
            child: true,
            token,
            ..Self::new(algorithm, services)
        }
    }

    /// Instance id, also recorded on the tracing span
    #[inline]
    #[must_use]
    pub fn id(&self) -> Ulid {
        self.id
    }

    /// Algorithm name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.algorithm.name()
    }

    /// Algorithm version
    #[inline]
    #[must_use]
    pub fn version(&self) -> u32 {
        self.algorithm.version()
    }

    /// Current lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Whether the last run succeeded
    #[inline]
    #[must_use]
    pub fn is_executed(&self) -> bool {
        self.state == ExecutionState::Executed
    }

    /// Whether this runner was created by another algorithm
    #[inline]
    #[must_use]
    pub fn is_child(&self) -> bool {
        self.child
    }

    /// Declared properties
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &PropertyManager {
        &self.properties
    }

    /// Handle for cancelling from another thread
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Request cancellation of the current run
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Declare the algorithm's properties; a second call does nothing
    ///
    /// # Errors
    /// `AlgorithmError::Property` for a faulty declaration
    pub fn initialize(&mut self) -> Result<(), AlgorithmError> {
        if self.state.is_initialized() {
            return Ok(());
        }
        self.algorithm.init(&mut self.properties)?;
        self.transition(ExecutionState::Initialized);
        tracing::debug!(
            algorithm = self.algorithm.name(),
            version = self.algorithm.version(),
            properties = self.properties.len(),
            "initialized"
        );
        Ok(())
    }

    fn ensure_initialized(&self) -> Result<(), AlgorithmError> {
        if self.state.is_initialized() {
            Ok(())
        } else {
            Err(AlgorithmError::NotInitialized(self.algorithm.name().to_string()))
        }
    }

    fn transition(&mut self, to: ExecutionState) {
        debug_assert!(
            self.state.can_transition_to(to),
            "illegal transition {} -> {to}",
            self.state
        );
        self.state = to;
    }

    /// Set a typed value
    ///
    /// # Errors
    /// `NotInitialized`, or a property error (`NotFound` / `TypeMismatch`)
    pub fn set_property(
        &mut self,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<(), AlgorithmError> {
        self.ensure_initialized()?;
        Ok(self.properties.set_property(name, value)?)
    }

    /// Set a value from its string form; for workspace properties this is
    /// the data-service name
    ///
    /// # Errors
    /// `NotInitialized`, or a property error (`NotFound` / `Parse`)
    pub fn set_property_value(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError> {
        self.ensure_initialized()?;
        Ok(self.properties.set_property_value(name, value)?)
    }

    /// Set several properties from a JSON object
    ///
    /// # Errors
    /// `NotInitialized`, or the first property error
    pub fn set_properties_from_json(
        &mut self,
        json: &serde_json::Value,
    ) -> Result<(), AlgorithmError> {
        self.ensure_initialized()?;
        Ok(self.properties.set_properties_from_json(json)?)
    }

    /// Attach a workspace directly, bypassing the data service
    ///
    /// # Errors
    /// `NotInitialized`, or a property error (`NotFound` / `TypeMismatch`)
    pub fn set_workspace(&mut self, name: &str, handle: WorkspaceHandle) -> Result<(), AlgorithmError> {
        self.ensure_initialized()?;
        Ok(self.properties.set_workspace(name, handle)?)
    }

    /// Typed value of a property
    ///
    /// # Errors
    /// Property errors (`NotFound` / `TypeMismatch`)
    pub fn get<T: FromPropertyValue>(&self, name: &str) -> Result<T, AlgorithmError> {
        Ok(self.properties.get(name)?)
    }

    /// String form of a property value
    ///
    /// # Errors
    /// `PropertyError::NotFound`
    pub fn get_property_value(&self, name: &str) -> Result<String, AlgorithmError> {
        Ok(self.properties.get_property_value(name)?)
    }

    /// Workspace attached to a workspace property
    ///
    /// # Errors
    /// Property errors, including `NoWorkspace`
    pub fn workspace(&self, name: &str) -> Result<WorkspaceHandle, AlgorithmError> {
        Ok(self.properties.workspace(name)?)
    }

    /// Validate and run the algorithm
    ///
    /// Validation failures leave the state unchanged. Execution failures
    /// reset output properties and mark the runner `Failed`. A child run
    /// reports its failure as [`AlgorithmError::Child`].
    ///
    /// # Errors
    /// `NotInitialized`, `Validation`, or whatever `exec` returned
    pub fn execute(&mut self) -> Result<(), AlgorithmError> {
        self.ensure_initialized()?;
        if !self.child {
            self.token.reset();
        }
        self.run().map_err(|error| {
            if self.child {
                AlgorithmError::Child {
                    name: self.algorithm.name().to_string(),
                    source: Box::new(error),
                }
            } else {
                error
            }
        })
    }

    /// [`execute`](Self::execute) reduced to success or failure
    pub fn try_execute(&mut self) -> bool {
        match self.execute() {
            Ok(()) => true,
            Err(error) => {
                tracing::debug!(algorithm = self.algorithm.name(), %error, "run reported as failed");
                false
            }
        }
    }

    fn run(&mut self) -> Result<(), AlgorithmError> {
        let name = self.algorithm.name();
        let version = self.algorithm.version();
        let id = self.id;
        let span = tracing::info_span!("algorithm", name, version, id = %id, child = self.child);
        let _entered = span.enter();

        if let Err(error) = self.validate() {
            tracing::error!(%error, "validation failed");
            self.notify(|o| o.error(id, name, &error));
            return Err(error);
        }

        self.notify(|o| o.started(id, name, version));
        let started = Instant::now();
        match self.exec_and_store() {
            Ok(()) => {
                let elapsed = started.elapsed();
                self.transition(ExecutionState::Executed);
                tracing::info!(?elapsed, "executed");
                self.notify(|o| o.finished(id, name, elapsed));
                Ok(())
            }
            Err(error) => {
                self.properties.reset_to_defaults(Some(Direction::Output));
                self.transition(ExecutionState::Failed);
                if error.is_cancelled() {
                    tracing::warn!(%error, "execution cancelled");
                } else {
                    tracing::error!(%error, "execution failed");
                }
                self.notify(|o| o.error(id, name, &error));
                Err(error)
            }
        }
    }

    fn notify(&self, event: impl Fn(&dyn AlgorithmObserver)) {
        for observer in &self.services.observers {
            event(observer.as_ref());
        }
    }

    fn validate(&mut self) -> Result<(), AlgorithmError> {
        let mut issues = self.resolve_inputs();
        if !self.child {
            issues.extend(self.check_output_names());
        }
        issues.extend(self.properties.validate_properties());
        issues.extend(self.algorithm.validate_inputs(&self.properties));
        let failures = first_per_property(&self.properties, issues);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(AlgorithmError::Validation {
                algorithm: self.algorithm.name().to_string(),
                failures,
            })
        }
    }

    /// Attach data-service workspaces to named input slots
    fn resolve_inputs(&mut self) -> Vec<ValidationIssue> {
        let named: Vec<(String, String, bool)> = self
            .properties
            .properties()
            .filter(|p| p.direction().is_input())
            .filter_map(|p| {
                let slot = p.value().as_workspace()?;
                (!slot.name().is_empty()).then(|| {
                    (p.name().to_string(), slot.name().to_string(), slot.handle().is_some())
                })
            })
            .collect();

        let mut issues = Vec::new();
        for (property, workspace, attached) in named {
            if self.child && attached {
                continue;
            }
            match self.services.data_service.retrieve(&workspace) {
                Ok(handle) => {
                    if let Err(error) = self.properties.set_workspace(&property, handle) {
                        issues.push((property, error.to_string()));
                    }
                }
                Err(_) if attached => {}
                Err(error) => issues.push((property, error.to_string())),
            }
        }
        issues
    }

    fn check_output_names(&self) -> Vec<ValidationIssue> {
        self.properties
            .properties()
            .filter(|p| p.direction() == Direction::Output)
            .filter_map(|p| {
                let slot = p.value().as_workspace()?;
                let message = if slot.name().is_empty() {
                    MISSING_OUTPUT_NAME.to_string()
                } else {
                    AnalysisDataService::validate_name(slot.name()).err()?.to_string()
                };
                Some((p.name().to_string(), message))
            })
            .collect()
    }

    fn exec_and_store(&mut self) -> Result<(), AlgorithmError> {
        self.detach_outputs()?;
        let mut ctx = ExecutionContext {
            properties: &mut self.properties,
            services: &self.services,
            token: &self.token,
            id: self.id,
            name: self.algorithm.name(),
        };
        ctx.check_cancelled()?;
        self.algorithm.exec(&mut ctx)?;
        if self.child {
            return Ok(());
        }
        self.store_outputs()
    }

    /// Drop handles left on output slots by an earlier run
    fn detach_outputs(&mut self) -> Result<(), AlgorithmError> {
        let outputs: Vec<(String, String)> = self
            .properties
            .properties()
            .filter(|p| p.direction() == Direction::Output)
            .filter_map(|p| {
                let slot = p.value().as_workspace()?;
                slot.handle()
                    .is_some()
                    .then(|| (p.name().to_string(), slot.name().to_string()))
            })
            .collect();
        for (property, workspace) in outputs {
            self.properties
                .set_property(&property, WorkspaceSlot::named(workspace))?;
        }
        Ok(())
    }

    fn store_outputs(&self) -> Result<(), AlgorithmError> {
        let replace = self.services.config.data_service.replace_existing;
        let ads = &self.services.data_service;
        for property in self.properties.properties().filter(|p| p.direction().is_output()) {
            let Some(slot) = property.value().as_workspace() else {
                continue;
            };
            if slot.name().is_empty() {
                continue;
            }
            let handle = slot.handle().cloned().ok_or_else(|| {
                AlgorithmError::runtime(format!(
                    "{} did not set output workspace property '{}'",
                    self.algorithm.name(),
                    property.name()
                ))
            })?;
            if replace || property.direction() == Direction::InOut {
                ads.add_or_replace(slot.name(), handle)?;
            } else {
                ads.add(slot.name(), handle)?;
            }
            tracing::debug!(property = property.name(), workspace = slot.name(), "stored output");
        }
        Ok(())
    }
}

/// Keep the first issue per property, ordered by declaration
fn first_per_property(properties: &PropertyManager, issues: Vec<ValidationIssue>) -> ValidationFailures {
    let order: Vec<String> = properties
        .properties()
        .map(|p| p.name().to_lowercase())
        .collect();
    let mut seen = HashSet::new();
    let mut kept: Vec<(usize, ValidationIssue)> = issues
        .into_iter()
        .filter(|(name, _)| seen.insert(name.to_lowercase()))
        .map(|issue| {
            let lower = issue.0.to_lowercase();
            let position = order.iter().position(|n| *n == lower).unwrap_or(order.len());
            (position, issue)
        })
        .collect();
    kept.sort_by_key(|(position, _)| *position);
    ValidationFailures(kept.into_iter().map(|(_, issue)| issue).collect())
}

/// What an executing algorithm sees
pub struct ExecutionContext<'a> {
    properties: &'a mut PropertyManager,
    services: &'a Services,
    token: &'a CancellationToken,
    id: Ulid,
    name: &'static str,
}

impl ExecutionContext<'_> {
    /// Id of the running instance
    #[inline]
    #[must_use]
    pub fn id(&self) -> Ulid {
        self.id
    }

    /// Name of the running algorithm
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared properties
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &PropertyManager {
        &*self.properties
    }

    /// Typed value of a property
    ///
    /// # Errors
    /// Property errors (`NotFound` / `TypeMismatch`)
    pub fn get<T: FromPropertyValue>(&self, name: &str) -> Result<T, AlgorithmError> {
        Ok(self.properties.get(name)?)
    }

    /// Workspace attached to a workspace property
    ///
    /// # Errors
    /// Property errors, including `NoWorkspace`
    pub fn workspace(&self, name: &str) -> Result<WorkspaceHandle, AlgorithmError> {
        Ok(self.properties.workspace(name)?)
    }

    /// Set an output value
    ///
    /// # Errors
    /// Property errors (`NotFound` / `TypeMismatch`)
    pub fn set_property(
        &mut self,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<(), AlgorithmError> {
        Ok(self.properties.set_property(name, value)?)
    }

    /// Attach a workspace to an output property, keeping its name
    ///
    /// # Errors
    /// Property errors (`NotFound` / `TypeMismatch`)
    pub fn set_workspace(&mut self, name: &str, handle: WorkspaceHandle) -> Result<(), AlgorithmError> {
        Ok(self.properties.set_workspace(name, handle)?)
    }

    /// Registered workspace types
    #[inline]
    #[must_use]
    pub fn workspace_factory(&self) -> &WorkspaceFactory {
        self.services.registry.workspaces()
    }

    /// Analysis data service
    #[inline]
    #[must_use]
    pub fn data_service(&self) -> &AnalysisDataService {
        &self.services.data_service
    }

    /// Loop executor
    #[inline]
    #[must_use]
    pub fn parallel(&self) -> &ParallelExecutor {
        &self.services.parallel
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &FrameworkConfig {
        &self.services.config
    }

    /// Cancellation flag shared with children
    #[inline]
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        self.token
    }

    /// Stop if cancellation was requested
    ///
    /// # Errors
    /// `AlgorithmError::Cancelled`
    pub fn check_cancelled(&self) -> Result<(), AlgorithmError> {
        if self.token.is_cancelled() {
            return Err(AlgorithmError::Cancelled(self.name.to_string()));
        }
        Ok(())
    }

    /// Report progress in `[0, 1]` to observers
    pub fn report_progress(&self, fraction: f64, message: &str) {
        let fraction = fraction.clamp(0.0, 1.0);
        tracing::trace!(fraction, message, "progress");
        for observer in &self.services.observers {
            observer.progress(self.id, self.name, fraction, message);
        }
    }

    /// New zero-filled workspace of a registered type
    ///
    /// # Errors
    /// `AlgorithmError::Workspace` for an unknown type or invalid shape
    pub fn create_workspace(
        &self,
        type_name: &str,
        histogram_count: usize,
        x_length: usize,
        y_length: usize,
    ) -> Result<WorkspaceHandle, AlgorithmError> {
        let workspace =
            self.workspace_factory()
                .create(type_name, histogram_count, x_length, y_length)?;
        Ok(WorkspaceHandle::new(workspace))
    }

    /// New workspace shaped and described like `parent`, data zeroed
    ///
    /// # Errors
    /// `AlgorithmError::Workspace` if the parent's type is not registered
    pub fn create_from_parent(&self, parent: &WorkspaceHandle) -> Result<WorkspaceHandle, AlgorithmError> {
        let parent = parent.read();
        let workspace = self.workspace_factory().create_from_parent(&**parent)?;
        Ok(WorkspaceHandle::new(workspace))
    }

    /// New workspace described like `parent` with a different shape
    ///
    /// # Errors
    /// `AlgorithmError::Workspace` for an unknown type or invalid shape
    pub fn create_from_parent_with_shape(
        &self,
        parent: &WorkspaceHandle,
        histogram_count: usize,
        x_length: usize,
        y_length: usize,
    ) -> Result<WorkspaceHandle, AlgorithmError> {
        let parent = parent.read();
        let workspace = self.workspace_factory().create_from_parent_with_shape(
            &**parent,
            histogram_count,
            x_length,
            y_length,
        )?;
        Ok(WorkspaceHandle::new(workspace))
    }

    /// Initialized child algorithm sharing this run's services and
    /// cancellation flag
    ///
    /// Children accept workspace handles directly and never write to the
    /// data service.
    ///
    /// # Errors
    /// `AlgorithmError::Registry` for an unknown name or version
    pub fn create_child_algorithm(
        &self,
        name: &str,
        version: impl Into<VersionRequest>,
    ) -> Result<AlgorithmRunner, AlgorithmError> {
        let algorithm = self.services.registry.algorithms().create(name, version)?;
        let mut child =
            AlgorithmRunner::new_child(algorithm, self.services.for_child(), self.token.clone());
        child.initialize()?;
        tracing::debug!(parent = self.name, child = name, "created child algorithm");
        Ok(child)
    }
}
