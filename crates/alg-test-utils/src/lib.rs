//! Testing utilities for the ALG workspace
//!
//! Shared fixtures: a sequential framework, histogram workspaces and a small
//! module of algorithms that fail or cancel on demand.

#![allow(missing_docs)]

use alg_core::algorithms::OUTPUT_WORKSPACE;
use alg_core::{
    Algorithm, AlgorithmError, ExecutionContext, FnModule, Framework, FrameworkConfig,
    FrameworkError, RegistryBuilder,
};
use alg_property::{Direction, Property, PropertyError, PropertyManager, WorkspaceSlot};
use alg_workspace::{Workspace, Workspace2D, WorkspaceHandle, WorkspaceShape};

pub const TEST_MODULE: &str = "test-algorithms";

pub fn sequential_config() -> FrameworkConfig {
    FrameworkConfig::default().with_parallel(false)
}

pub fn setup_framework() -> Framework {
    Framework::builder()
        .config(sequential_config())
        .module(test_module())
        .build()
        .unwrap()
}

/// Histogram workspace with one spectrum per row of `counts`; errors are
/// the square roots of the counts
pub fn histogram_workspace(x: &[f64], counts: &[&[f64]]) -> WorkspaceHandle {
    let shape = WorkspaceShape::new(counts.len(), x.len(), counts[0].len()).unwrap();
    let mut ws = Workspace2D::with_shape(shape).unwrap();
    for (histogram, y) in ws.histograms_mut().iter_mut().zip(counts) {
        histogram.set_x(x.to_vec()).unwrap();
        histogram.set_y(y.to_vec()).unwrap();
        histogram.set_e(y.iter().map(|v| v.sqrt()).collect()).unwrap();
    }
    WorkspaceHandle::new(Box::new(ws))
}

/// Store a histogram workspace under `name`
pub fn store_histogram(framework: &Framework, name: &str, x: &[f64], counts: &[&[f64]]) {
    framework
        .data_service()
        .add(name, histogram_workspace(x, counts))
        .unwrap();
}

pub fn y_values(handle: &WorkspaceHandle, index: usize) -> Vec<f64> {
    handle.read().histogram(index).unwrap().y().to_vec()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

/// Sets its output, then fails
#[derive(Debug, Default)]
pub struct FailAfterOutput;

impl Algorithm for FailAfterOutput {
    fn name(&self) -> &'static str {
        "FailAfterOutput"
    }

    fn init(&mut self, properties: &mut PropertyManager) -> Result<(), PropertyError> {
        properties.declare(Property::new(
            OUTPUT_WORKSPACE,
            WorkspaceSlot::default(),
            Direction::Output,
        ))?;
        properties.declare(Property::new("Message", "boom", Direction::Input))
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), AlgorithmError> {
        let output = ctx.create_workspace(Workspace2D::TYPE_ID, 1, 1, 1)?;
        ctx.set_workspace(OUTPUT_WORKSPACE, output)?;
        Err(AlgorithmError::runtime(ctx.get::<String>("Message")?))
    }
}

/// Requests its own cancellation partway through
#[derive(Debug, Default)]
pub struct CancelMidway;

impl Algorithm for CancelMidway {
    fn name(&self) -> &'static str {
        "CancelMidway"
    }

    fn init(&mut self, properties: &mut PropertyManager) -> Result<(), PropertyError> {
        properties.declare(Property::new("Steps", 10_i64, Direction::Input))?;
        properties.declare(Property::new("Completed", 0_i64, Direction::Output))
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), AlgorithmError> {
        let steps: i64 = ctx.get("Steps")?;
        for step in 0..steps {
            if step == steps / 2 {
                ctx.token().cancel();
            }
            ctx.check_cancelled()?;
            ctx.set_property("Completed", step + 1)?;
        }
        Ok(())
    }
}

/// Runs `CancelMidway` as a child
#[derive(Debug, Default)]
pub struct CancelChild;

impl Algorithm for CancelChild {
    fn name(&self) -> &'static str {
        "CancelChild"
    }

    fn init(&mut self, _properties: &mut PropertyManager) -> Result<(), PropertyError> {
        Ok(())
    }

    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), AlgorithmError> {
        let mut child = ctx.create_child_algorithm("CancelMidway", 1_u32)?;
        child.execute()
    }
}

pub fn test_module(
) -> FnModule<impl Fn(&mut RegistryBuilder) -> Result<(), FrameworkError> + Send + Sync> {
    FnModule::new(TEST_MODULE, |builder: &mut RegistryBuilder| {
        builder.register_algorithm::<FailAfterOutput>()?;
        builder.register_algorithm::<CancelMidway>()?;
        builder.register_algorithm::<CancelChild>()?;
        Ok(())
    })
}
